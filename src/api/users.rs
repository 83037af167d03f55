// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Caller identity endpoint.

use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::{AuthPrincipal, Principal, Role};

/// Response for GET /me
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub role: Role,
    /// Label of the token that authenticated the request (never the secret)
    pub token_label: String,
    /// Whether the role may use mutating methods
    pub can_write: bool,
}

impl From<AuthPrincipal> for MeResponse {
    fn from(principal: AuthPrincipal) -> Self {
        Self {
            role: principal.role,
            can_write: !principal.role.is_read_only(),
            token_label: principal.token_label,
        }
    }
}

/// Echo the resolved principal.
///
/// With enforcement disabled no principal exists and this answers 401.
#[utoipa::path(
    get,
    path = "/me",
    tag = "Users",
    security(("app_token" = []), ("bearer" = [])),
    responses(
        (status = 200, description = "Caller identity", body = MeResponse),
        (status = 401, description = "Missing or unknown token", body = crate::error::ErrorBody),
    )
)]
pub async fn get_me(Principal(principal): Principal) -> Json<MeResponse> {
    Json(principal.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn me_response_from_principal() {
        let response = MeResponse::from(AuthPrincipal {
            role: Role::Viewer,
            token_label: "APP_AUTH_TOKENS[2]".to_string(),
        });
        assert_eq!(response.role, Role::Viewer);
        assert_eq!(response.token_label, "APP_AUTH_TOKENS[2]");
        assert!(!response.can_write);
    }

    #[tokio::test]
    async fn handler_echoes_principal() {
        let Json(response) = get_me(Principal(AuthPrincipal {
            role: Role::Admin,
            token_label: "APP_AUTH_TOKEN".to_string(),
        }))
        .await;
        assert!(response.can_write);
        assert_eq!(response.role, Role::Admin);
    }
}
