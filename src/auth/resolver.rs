// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token resolution: turns request headers into an [`AuthPrincipal`].
//!
//! ## Order of checks (first match wins)
//!
//! 1. Public route - allow, no principal
//! 2. Enforcement disabled - allow, no principal
//! 3. Exact path `/health` - allow, no principal
//! 4. `/receipts/...` with a matching `x-receipts-token` - synthetic operator
//! 5. `x-app-token`, else `Authorization: Bearer <token>` - registry lookup
//!
//! Missing credentials reject with `AuthenticationRequired`; unknown ones
//! with `InvalidCredential`.

use std::sync::Arc;

use axum::http::{header::AUTHORIZATION, HeaderMap};
use subtle::ConstantTimeEq;

use super::pipeline::{GuardContext, GuardStage};
use super::registry::SecurityConfig;
use super::{AuthError, AuthPrincipal};

pub const APP_TOKEN_HEADER: &str = "x-app-token";
pub const RECEIPTS_TOKEN_HEADER: &str = "x-receipts-token";

pub const HEALTH_PATH: &str = "/health";
pub const RECEIPTS_PREFIX: &str = "/receipts/";

/// First pipeline stage.
pub struct TokenResolver {
    config: Arc<SecurityConfig>,
}

impl TokenResolver {
    pub fn new(config: Arc<SecurityConfig>) -> Self {
        Self { config }
    }

    fn resolve(
        &self,
        path: &str,
        headers: &HeaderMap,
    ) -> Result<Option<AuthPrincipal>, AuthError> {
        let path = strip_query(path);

        if path == HEALTH_PATH {
            return Ok(None);
        }

        // Path-scoped only; method is not checked.
        if path.starts_with(RECEIPTS_PREFIX) {
            if let (Some(expected), Some(presented)) = (
                self.config.receipts_token(),
                header_str(headers, RECEIPTS_TOKEN_HEADER),
            ) {
                if bool::from(presented.as_bytes().ct_eq(expected.as_bytes())) {
                    return Ok(Some(AuthPrincipal::receipts()));
                }
            }
        }

        let token = extract_token(headers).ok_or(AuthError::AuthenticationRequired)?;
        let registered = self
            .config
            .lookup(token)
            .ok_or(AuthError::InvalidCredential)?;

        Ok(Some(AuthPrincipal::from(registered)))
    }
}

impl GuardStage for TokenResolver {
    fn name(&self) -> &'static str {
        "token-resolver"
    }

    fn check(&self, ctx: &mut GuardContext<'_>) -> Result<(), AuthError> {
        if ctx.policy.is_public() || !self.config.enabled() {
            return Ok(());
        }
        ctx.principal = self.resolve(ctx.path, ctx.headers)?;
        Ok(())
    }
}

/// Pull the app token from `x-app-token`, falling back to a bearer header.
///
/// Blank values count as absent.
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    header_str(headers, APP_TOKEN_HEADER).or_else(|| bearer_token(headers))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, token) = value.split_once(char::is_whitespace)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Trimmed, non-empty header value.
fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)?
        .to_str()
        .ok()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn strip_query(path: &str) -> &str {
    path.split_once('?').map_or(path, |(path, _)| path)
}
