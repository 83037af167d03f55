// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-route security declarations.
//!
//! Routes are registered through a [`Controller`], which carries a
//! controller-level [`Declaration`] that acts as the default for every
//! handler in the group. Each handler can declare its own, and the handler
//! level wins wherever it says something.
//!
//! ```rust,ignore
//! let orders = Controller::new("orders")
//!     .get("/orders", orders::list, Declaration::none())
//!     .delete("/orders/{id}", orders::delete, Declaration::roles([Role::Admin, Role::Operator]));
//!
//! let (router, table) = SecuredRouter::new().mount(orders).into_parts();
//! ```
//!
//! The resulting [`RouteTable`] is keyed by method and the *matched* path
//! pattern, which the security middleware reads from axum's `MatchedPath`.

use std::collections::HashMap;

use axum::{
    handler::Handler,
    http::Method,
    routing::{on, MethodFilter},
    Router,
};

use super::Role;

/// Security metadata declared at one level (controller or handler).
///
/// `None` fields mean "not declared here".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Declaration {
    pub public: Option<bool>,
    pub roles: Option<Vec<Role>>,
}

impl Declaration {
    /// Nothing declared; inherit from the controller.
    pub fn none() -> Self {
        Self::default()
    }

    /// Skip authentication and authorization entirely.
    pub fn public() -> Self {
        Self {
            public: Some(true),
            roles: None,
        }
    }

    /// Restrict to the listed roles.
    pub fn roles(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            public: None,
            roles: Some(roles.into_iter().collect()),
        }
    }
}

/// Both declaration levels for one route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutePolicy {
    pub handler: Declaration,
    pub controller: Declaration,
}

impl RoutePolicy {
    pub fn is_public(&self) -> bool {
        self.handler
            .public
            .or(self.controller.public)
            .unwrap_or(false)
    }

    /// Required roles, handler level first. An empty list means no
    /// requirement.
    pub fn required_roles(&self) -> Option<&[Role]> {
        self.handler
            .roles
            .as_deref()
            .or(self.controller.roles.as_deref())
            .filter(|roles| !roles.is_empty())
    }
}

/// Lookup table from `(method, matched path)` to policy.
///
/// Each path also remembers the controller declaration it was mounted under,
/// used when the path matches but the method has no handler.
#[derive(Debug, Default)]
pub struct RouteTable {
    policies: HashMap<(Method, String), RoutePolicy>,
    paths: HashMap<String, RoutePolicy>,
    fallback: RoutePolicy,
}

impl RouteTable {
    pub fn insert(&mut self, method: Method, path: impl Into<String>, policy: RoutePolicy) {
        let path = path.into();
        self.paths
            .entry(path.clone())
            .or_insert_with(|| RoutePolicy {
                handler: Declaration::none(),
                controller: policy.controller.clone(),
            });
        self.policies.insert((method, path), policy);
    }

    /// Policy for a request. `HEAD` uses the `GET` entry, a known path with an
    /// unknown method gets its controller declaration, and anything else gets
    /// the default policy (authenticated, no role requirement).
    pub fn policy_for(&self, method: &Method, matched_path: Option<&str>) -> &RoutePolicy {
        let Some(path) = matched_path else {
            return &self.fallback;
        };
        let key = (method.clone(), path.to_string());
        if let Some(policy) = self.policies.get(&key) {
            return policy;
        }
        if method == Method::HEAD {
            if let Some(policy) = self.policies.get(&(Method::GET, key.1)) {
                return policy;
            }
        }
        self.paths.get(path).unwrap_or(&self.fallback)
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

/// A group of routes sharing a controller-level declaration.
pub struct Controller<S = ()> {
    name: &'static str,
    declaration: Declaration,
    router: Router<S>,
    entries: Vec<(Method, String, Declaration)>,
}

impl<S> Controller<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            declaration: Declaration::none(),
            router: Router::new(),
            entries: Vec::new(),
        }
    }

    /// Set the controller-level declaration.
    pub fn declare(mut self, declaration: Declaration) -> Self {
        self.declaration = declaration;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn get<H, T>(self, path: &str, handler: H, declared: Declaration) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.on(Method::GET, MethodFilter::GET, path, handler, declared)
    }

    pub fn post<H, T>(self, path: &str, handler: H, declared: Declaration) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.on(Method::POST, MethodFilter::POST, path, handler, declared)
    }

    pub fn put<H, T>(self, path: &str, handler: H, declared: Declaration) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.on(Method::PUT, MethodFilter::PUT, path, handler, declared)
    }

    pub fn patch<H, T>(self, path: &str, handler: H, declared: Declaration) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.on(Method::PATCH, MethodFilter::PATCH, path, handler, declared)
    }

    pub fn delete<H, T>(self, path: &str, handler: H, declared: Declaration) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.on(Method::DELETE, MethodFilter::DELETE, path, handler, declared)
    }

    fn on<H, T>(
        mut self,
        method: Method,
        filter: MethodFilter,
        path: &str,
        handler: H,
        declared: Declaration,
    ) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.router = self.router.route(path, on(filter, handler));
        self.entries.push((method, path.to_string(), declared));
        self
    }
}

/// Router plus the policy table describing it.
pub struct SecuredRouter<S = ()> {
    router: Router<S>,
    table: RouteTable,
}

impl<S> Default for SecuredRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S> SecuredRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            table: RouteTable::default(),
        }
    }

    pub fn mount(mut self, controller: Controller<S>) -> Self {
        tracing::debug!(
            controller = controller.name,
            routes = controller.entries.len(),
            "Mounting controller"
        );
        for (method, path, handler) in controller.entries {
            self.table.insert(
                method,
                path,
                RoutePolicy {
                    handler,
                    controller: controller.declaration.clone(),
                },
            );
        }
        self.router = self.router.merge(controller.router);
        self
    }

    pub fn into_parts(self) -> (Router<S>, RouteTable) {
        (self.router, self.table)
    }
}
