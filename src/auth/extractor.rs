// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for the resolved principal.
//!
//! The security middleware does all the checking; these only read what it
//! left in the request extensions.
//!
//! ```rust,ignore
//! async fn whoami(Principal(principal): Principal) -> impl IntoResponse {
//!     // principal.role, principal.token_label
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};

use super::{AuthError, AuthPrincipal};

/// Extractor that requires a resolved principal.
///
/// Public routes and requests served with enforcement disabled carry no
/// principal; this extractor rejects those with `AuthenticationRequired`.
pub struct Principal(pub AuthPrincipal);

impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthPrincipal>()
            .cloned()
            .map(Principal)
            .ok_or(AuthError::AuthenticationRequired)
    }
}

/// Optional principal extractor.
///
/// Returns `None` when the request was let through without one.
pub struct MaybePrincipal(pub Option<AuthPrincipal>);

impl MaybePrincipal {
    /// Label for audit fields.
    pub fn label(&self) -> String {
        self.0
            .as_ref()
            .map(|p| p.token_label.clone())
            .unwrap_or_else(|| "anonymous".to_string())
    }
}

impl<S> FromRequestParts<S> for MaybePrincipal
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybePrincipal(parts.extensions.get::<AuthPrincipal>().cloned()))
    }
}
