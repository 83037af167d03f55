// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Access roles for API tokens.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Role attached to an API token.
///
/// ## Roles
///
/// - `Admin` - Full access, including automation and configuration endpoints
/// - `Operator` - Day-to-day operations (orders, receipts, stock movements)
/// - `Viewer` - Read-only access; any mutating HTTP method is refused
///
/// There is no numeric rank. Route role lists are checked by exact
/// membership; the only cross-cutting rule is that viewers cannot mutate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full administrative access
    Admin,
    /// Operational access (can mutate)
    Operator,
    /// Read-only access
    Viewer,
}

impl Role {
    /// All roles, in declaration order.
    pub const ALL: [Role; 3] = [Role::Admin, Role::Operator, Role::Viewer];

    /// Parse role from string (case-insensitive, surrounding whitespace ignored).
    pub fn parse(s: &str) -> Option<Role> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "operator" => Some(Role::Operator),
            "viewer" => Some(Role::Viewer),
            _ => None,
        }
    }

    /// Whether this role is globally restricted to non-mutating methods.
    pub fn is_read_only(&self) -> bool {
        matches!(self, Role::Viewer)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Operator => "operator",
            Role::Viewer => "viewer",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive_and_trimmed() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("ADMIN"), Some(Role::Admin));
        assert_eq!(Role::parse("  Operator "), Some(Role::Operator));
        assert_eq!(Role::parse("viewer"), Some(Role::Viewer));
    }

    #[test]
    fn parse_rejects_unknown_roles() {
        assert_eq!(Role::parse("client"), None);
        assert_eq!(Role::parse(""), None);
        assert_eq!(Role::parse("admin:"), None);
    }

    #[test]
    fn only_viewer_is_read_only() {
        assert!(!Role::Admin.is_read_only());
        assert!(!Role::Operator.is_read_only());
        assert!(Role::Viewer.is_read_only());
    }

    #[test]
    fn display_matches_wire_name() {
        for role in Role::ALL {
            assert_eq!(role.to_string(), role.as_str());
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{}\"", role.as_str()));
        }
    }
}
