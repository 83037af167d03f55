// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Static-token authentication and role-based authorization for the ERP API.
//!
//! ## Request Flow
//!
//! 1. Route is looked up in the [`RouteTable`] (public? required roles?)
//! 2. [`TokenResolver`] determines the caller:
//!    - `x-app-token` header, or `Authorization: Bearer <token>`
//!    - `x-receipts-token` on `/receipts/*` only (synthetic operator)
//! 3. [`AccessDecision`] checks the route's role list and blocks any
//!    mutating method for viewers
//! 4. The handler runs with an [`AuthPrincipal`] in request extensions
//!
//! ## Security
//!
//! - Tokens come from the environment once at startup (see [`SecurityConfig`])
//! - `/health` and routes declared public are never gated
//! - Enforcement defaults to off only in development-like modes
//! - Secret values are never logged or rendered in `Debug`

pub mod decision;
pub mod error;
pub mod extractor;
pub mod pipeline;
pub mod principal;
pub mod registry;
pub mod resolver;
pub mod roles;
pub mod routes;

pub use decision::AccessDecision;
pub use error::AuthError;
pub use extractor::{MaybePrincipal, Principal};
pub use pipeline::{security_middleware, GuardContext, GuardStage, SecurityGate, SecurityPipeline};
pub use principal::AuthPrincipal;
pub use registry::{RoleToken, SecurityConfig};
pub use resolver::TokenResolver;
pub use roles::Role;
pub use routes::{Controller, Declaration, RoutePolicy, RouteTable, SecuredRouter};
