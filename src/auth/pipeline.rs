// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Security middleware for Axum.
//!
//! Every request passes through an ordered chain of [`GuardStage`]s. A stage
//! either lets the request continue (`Ok`) or rejects it (`Err`); the first
//! rejection ends the request. The standard chain is:
//!
//! 1. [`TokenResolver`] - who is calling (or reject)
//! 2. [`AccessDecision`] - may they do this (or reject)
//!
//! On success the resolved [`AuthPrincipal`] (if any) is inserted into the
//! request extensions, where the [`Principal`](super::Principal) extractor
//! picks it up.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let (router, table) = secured.into_parts();
//! let gate = SecurityGate::new(SecurityPipeline::standard(config), table);
//! let app = router.route_layer(axum::middleware::from_fn_with_state(gate, security_middleware));
//! ```
//!
//! Attach it with `route_layer` so unknown paths and methods are answered
//! with 404 and 405 before the chain runs.

use std::sync::Arc;

use axum::{
    extract::{MatchedPath, Request, State},
    http::{HeaderMap, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::decision::AccessDecision;
use super::registry::SecurityConfig;
use super::resolver::TokenResolver;
use super::routes::{RoutePolicy, RouteTable};
use super::{AuthError, AuthPrincipal};

/// What a stage can see about the request.
pub struct GuardContext<'a> {
    pub method: &'a Method,
    pub path: &'a str,
    pub headers: &'a HeaderMap,
    pub policy: &'a RoutePolicy,
    /// Principal resolved by an earlier stage
    pub principal: Option<AuthPrincipal>,
}

/// One step of the security chain.
pub trait GuardStage: Send + Sync {
    fn name(&self) -> &'static str;

    fn check(&self, ctx: &mut GuardContext<'_>) -> Result<(), AuthError>;
}

/// Ordered list of stages.
#[derive(Default)]
pub struct SecurityPipeline {
    stages: Vec<Box<dyn GuardStage>>,
}

impl SecurityPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver followed by role decision, sharing one configuration.
    pub fn standard(config: Arc<SecurityConfig>) -> Self {
        Self::new()
            .with_stage(TokenResolver::new(config.clone()))
            .with_stage(AccessDecision::new(config))
    }

    pub fn with_stage(mut self, stage: impl GuardStage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Run every stage, stopping at the first rejection.
    pub fn run(&self, ctx: &mut GuardContext<'_>) -> Result<(), AuthError> {
        for stage in &self.stages {
            if let Err(error) = stage.check(ctx) {
                tracing::warn!(
                    stage = stage.name(),
                    method = %ctx.method,
                    path = ctx.path,
                    reason = error.error_code(),
                    "Request rejected"
                );
                return Err(error);
            }
        }

        if let Some(principal) = &ctx.principal {
            tracing::debug!(
                role = %principal.role,
                token = %principal.token_label,
                path = ctx.path,
                "Request authorized"
            );
        }
        Ok(())
    }
}

/// Middleware state: the chain plus the route declarations it consults.
#[derive(Clone)]
pub struct SecurityGate {
    pipeline: Arc<SecurityPipeline>,
    routes: Arc<RouteTable>,
}

impl SecurityGate {
    pub fn new(pipeline: SecurityPipeline, routes: RouteTable) -> Self {
        if routes.is_empty() {
            tracing::warn!(
                "Security gate has no declared routes; every request gets the default policy"
            );
        }
        Self {
            pipeline: Arc::new(pipeline),
            routes: Arc::new(routes),
        }
    }

    /// Evaluate the chain for a request head.
    pub fn authorize(
        &self,
        method: &Method,
        path: &str,
        matched_path: Option<&str>,
        headers: &HeaderMap,
    ) -> Result<Option<AuthPrincipal>, AuthError> {
        let mut ctx = GuardContext {
            method,
            path,
            headers,
            policy: self.routes.policy_for(method, matched_path),
            principal: None,
        };
        self.pipeline.run(&mut ctx)?;
        Ok(ctx.principal)
    }
}

/// Security middleware function.
pub async fn security_middleware(
    State(gate): State<SecurityGate>,
    mut request: Request,
    next: Next,
) -> Response {
    let outcome = {
        let matched = request.extensions().get::<MatchedPath>().map(MatchedPath::as_str);
        gate.authorize(
            request.method(),
            request.uri().path(),
            matched,
            request.headers(),
        )
    };

    match outcome {
        Ok(principal) => {
            if let Some(principal) = principal {
                request.extensions_mut().insert(principal);
            }
            next.run(request).await
        }
        Err(error) => error.into_response(),
    }
}
