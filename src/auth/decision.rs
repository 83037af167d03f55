// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Role-based access decision.
//!
//! Two independent restrictions apply to a resolved principal:
//!
//! - the route's declared role list (feature gating), and
//! - viewers may never use a mutating method (capability gating), whether
//!   or not the route declares roles.
//!
//! A route that lists `viewer` still refuses viewer writes.

use std::sync::Arc;

use axum::http::Method;

use super::pipeline::{GuardContext, GuardStage};
use super::registry::SecurityConfig;
use super::AuthError;

const MUTATING_METHODS: [&str; 4] = ["POST", "PUT", "PATCH", "DELETE"];

/// Second pipeline stage.
pub struct AccessDecision {
    config: Arc<SecurityConfig>,
}

impl AccessDecision {
    pub fn new(config: Arc<SecurityConfig>) -> Self {
        Self { config }
    }
}

impl GuardStage for AccessDecision {
    fn name(&self) -> &'static str {
        "access-decision"
    }

    fn check(&self, ctx: &mut GuardContext<'_>) -> Result<(), AuthError> {
        // Same exemptions as the resolver; this stage may run on its own.
        if ctx.policy.is_public() || !self.config.enabled() {
            return Ok(());
        }

        let principal = ctx.principal.as_ref().ok_or_else(|| {
            AuthError::InternalContractViolation(
                "access decision ran without a resolved principal".to_string(),
            )
        })?;

        if let Some(roles) = ctx.policy.required_roles() {
            if !principal.has_any_role(roles) {
                return Err(AuthError::Forbidden);
            }
        }

        if principal.role.is_read_only() && is_mutating(ctx.method) {
            return Err(AuthError::Forbidden);
        }

        Ok(())
    }
}

/// `POST`, `PUT`, `PATCH` or `DELETE`, compared case-insensitively.
pub fn is_mutating(method: &Method) -> bool {
    MUTATING_METHODS
        .iter()
        .any(|m| method.as_str().eq_ignore_ascii_case(m))
}
