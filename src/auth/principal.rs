// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The resolved caller identity attached to a request.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::registry::{RoleToken, RECEIPTS_TOKEN_LABEL};
use super::roles::Role;

/// Authenticated principal for one request.
///
/// Created by the token resolver and stored in request extensions; the
/// access decision and downstream handlers only read it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthPrincipal {
    /// Role granted by the presented token
    pub role: Role,
    /// Where the token was configured (e.g. `APP_AUTH_TOKENS[1]`)
    pub token_label: String,
}

impl AuthPrincipal {
    /// Synthetic operator created by the receipts token.
    pub fn receipts() -> Self {
        Self {
            role: Role::Operator,
            token_label: RECEIPTS_TOKEN_LABEL.to_string(),
        }
    }

    /// Whether the principal's role is one of `roles`.
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.contains(&self.role)
    }
}

impl From<&RoleToken> for AuthPrincipal {
    fn from(token: &RoleToken) -> Self {
        Self {
            role: token.role,
            token_label: token.label.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_role_token_copies_role_and_label_only() {
        let token = RoleToken {
            secret: "s3cret".to_string(),
            role: Role::Operator,
            label: "APP_AUTH_TOKENS[0]".to_string(),
        };
        let principal = AuthPrincipal::from(&token);
        assert_eq!(principal.role, Role::Operator);
        assert_eq!(principal.token_label, "APP_AUTH_TOKENS[0]");
        assert!(!serde_json::to_string(&principal).unwrap().contains("s3cret"));
    }

    #[test]
    fn receipts_principal_is_operator() {
        let principal = AuthPrincipal::receipts();
        assert_eq!(principal.role, Role::Operator);
        assert_eq!(principal.token_label, "receipts-token-source");
    }

    #[test]
    fn has_any_role_is_exact_membership() {
        let principal = AuthPrincipal {
            role: Role::Admin,
            token_label: "t".to_string(),
        };
        assert!(principal.has_any_role(&[Role::Admin, Role::Operator]));
        assert!(!principal.has_any_role(&[Role::Viewer]));
        assert!(!principal.has_any_role(&[]));
    }
}
