// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token registry built from environment configuration.
//!
//! The registry is constructed once at startup and shared read-only through
//! `AppState`. Tests build their own instances with [`SecurityConfig::from_lookup`]
//! or [`SecurityConfig::builder`], so several configurations can coexist in
//! one process.

use std::collections::HashMap;
use std::fmt;

use crate::config::{
    is_dev_mode, non_empty, parse_flag, process_env, AUTH_ENABLED_ENV, AUTH_TOKENS_ENV,
    AUTH_TOKEN_ENV, RECEIPTS_TOKEN_ENV,
};

use super::Role;

/// Label for the single admin token.
pub const ADMIN_TOKEN_LABEL: &str = "APP_AUTH_TOKEN";

/// Label of the synthetic principal created by the receipts token.
pub const RECEIPTS_TOKEN_LABEL: &str = "receipts-token-source";

/// A registered secret and where it came from.
///
/// The label exists for diagnostics only and is never compared for
/// security decisions.
#[derive(Clone, PartialEq, Eq)]
pub struct RoleToken {
    pub secret: String,
    pub role: Role,
    pub label: String,
}

// Keep secrets out of Debug output.
impl fmt::Debug for RoleToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoleToken")
            .field("secret", &"<redacted>")
            .field("role", &self.role)
            .field("label", &self.label)
            .finish()
    }
}

/// Immutable security configuration.
#[derive(Clone)]
pub struct SecurityConfig {
    enabled: bool,
    tokens_by_secret: HashMap<String, RoleToken>,
    receipts_token: Option<String>,
}

impl fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("enabled", &self.enabled)
            .field("tokens", &self.tokens_by_secret.len())
            .field("receipts_token", &self.receipts_token.is_some())
            .finish()
    }
}

impl SecurityConfig {
    /// Load from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(process_env)
    }

    /// Load from an arbitrary key/value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let enabled = lookup(AUTH_ENABLED_ENV)
            .as_deref()
            .and_then(parse_flag)
            .unwrap_or_else(|| !is_dev_mode(&lookup));

        let mut tokens_by_secret = HashMap::new();

        if let Some(secret) = non_empty(&lookup, AUTH_TOKEN_ENV) {
            tokens_by_secret.insert(
                secret.clone(),
                RoleToken {
                    secret,
                    role: Role::Admin,
                    label: ADMIN_TOKEN_LABEL.to_string(),
                },
            );
        }

        if let Some(list) = lookup(AUTH_TOKENS_ENV) {
            for token in parse_role_tokens(&list) {
                tokens_by_secret.insert(token.secret.clone(), token);
            }
        }

        Self {
            enabled,
            tokens_by_secret,
            receipts_token: non_empty(&lookup, RECEIPTS_TOKEN_ENV),
        }
    }

    pub fn builder() -> SecurityConfigBuilder {
        SecurityConfigBuilder::default()
    }

    /// Whether token enforcement is active.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Look up a presented secret.
    pub fn lookup(&self, secret: &str) -> Option<&RoleToken> {
        self.tokens_by_secret.get(secret)
    }

    pub fn receipts_token(&self) -> Option<&str> {
        self.receipts_token.as_deref()
    }

    pub fn token_count(&self) -> usize {
        self.tokens_by_secret.len()
    }
}

/// Parse a `role:secret,role:secret` list.
///
/// Entries are trimmed; empty entries, unknown roles and empty secrets are
/// dropped silently. The split happens at the first colon, so secrets may
/// themselves contain colons. Labels carry the 0-based list position.
pub fn parse_role_tokens(raw: &str) -> Vec<RoleToken> {
    raw.split(',')
        .enumerate()
        .filter_map(|(index, entry)| {
            let entry = entry.trim();
            if entry.is_empty() {
                return None;
            }
            let (role, secret) = entry.split_once(':')?;
            let role = Role::parse(role)?;
            let secret = secret.trim();
            if secret.is_empty() {
                return None;
            }
            Some(RoleToken {
                secret: secret.to_string(),
                role,
                label: format!("{AUTH_TOKENS_ENV}[{index}]"),
            })
        })
        .collect()
}

/// Programmatic construction, mostly for tests and embedding.
#[derive(Debug, Default)]
pub struct SecurityConfigBuilder {
    enabled: Option<bool>,
    tokens: Vec<RoleToken>,
    receipts_token: Option<String>,
}

impl SecurityConfigBuilder {
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    pub fn token(mut self, role: Role, secret: impl Into<String>) -> Self {
        let label = format!("builder[{}]", self.tokens.len());
        self.tokens.push(RoleToken {
            secret: secret.into(),
            role,
            label,
        });
        self
    }

    pub fn receipts_token(mut self, secret: impl Into<String>) -> Self {
        self.receipts_token = Some(secret.into());
        self
    }

    pub fn build(self) -> SecurityConfig {
        let tokens_by_secret = self
            .tokens
            .into_iter()
            .map(|token| (token.secret.clone(), token))
            .collect();
        SecurityConfig {
            enabled: self.enabled.unwrap_or(true),
            tokens_by_secret,
            receipts_token: self.receipts_token.filter(|t| !t.trim().is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(pairs: &[(&str, &str)]) -> SecurityConfig {
        let pairs: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        SecurityConfig::from_lookup(move |key| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        })
    }

    #[test]
    fn enabled_by_default_outside_dev() {
        assert!(config(&[]).enabled());
        assert!(config(&[("APP_ENV", "production")]).enabled());
    }

    #[test]
    fn disabled_by_default_in_dev() {
        assert!(!config(&[("APP_ENV", "development")]).enabled());
    }

    #[test]
    fn explicit_override_wins() {
        assert!(config(&[("APP_ENV", "dev"), ("APP_AUTH_ENABLED", "yes")]).enabled());
        assert!(!config(&[("APP_AUTH_ENABLED", "off")]).enabled());
        // Unrecognized values fall back to the mode default.
        assert!(config(&[("APP_AUTH_ENABLED", "maybe")]).enabled());
        assert!(!config(&[("APP_ENV", "local"), ("APP_AUTH_ENABLED", "")]).enabled());
    }

    #[test]
    fn single_admin_token_is_registered() {
        let config = config(&[("APP_AUTH_TOKEN", " root-secret ")]);
        let token = config.lookup("root-secret").expect("registered");
        assert_eq!(token.role, Role::Admin);
        assert_eq!(token.label, ADMIN_TOKEN_LABEL);
    }

    #[test]
    fn blank_admin_token_is_ignored() {
        assert_eq!(config(&[("APP_AUTH_TOKEN", "   ")]).token_count(), 0);
    }

    #[test]
    fn role_list_parsing() {
        let tokens = parse_role_tokens(" operator:secretA , ,viewer:secretB,bogus:x,admin:,:y,noseparator");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].role, Role::Operator);
        assert_eq!(tokens[0].secret, "secretA");
        assert_eq!(tokens[0].label, "APP_AUTH_TOKENS[0]");
        assert_eq!(tokens[1].role, Role::Viewer);
        assert_eq!(tokens[1].label, "APP_AUTH_TOKENS[2]");
    }

    #[test]
    fn split_happens_at_first_colon() {
        let tokens = parse_role_tokens("ADMIN:abc:def");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].role, Role::Admin);
        assert_eq!(tokens[0].secret, "abc:def");
    }

    #[test]
    fn later_duplicate_secret_wins() {
        let config = config(&[("APP_AUTH_TOKENS", "admin:shared,viewer:shared")]);
        assert_eq!(config.token_count(), 1);
        assert_eq!(config.lookup("shared").unwrap().role, Role::Viewer);
    }

    #[test]
    fn role_list_overrides_single_admin_token() {
        let config = config(&[
            ("APP_AUTH_TOKEN", "same"),
            ("APP_AUTH_TOKENS", "operator:same"),
        ]);
        assert_eq!(config.lookup("same").unwrap().role, Role::Operator);
    }

    #[test]
    fn receipts_token_is_not_a_registry_entry() {
        let config = config(&[("RECEIPTS_API_TOKEN", "rtok")]);
        assert_eq!(config.receipts_token(), Some("rtok"));
        assert!(config.lookup("rtok").is_none());
    }

    #[test]
    fn debug_output_hides_secrets() {
        let config = config(&[("APP_AUTH_TOKENS", "admin:topsecret")]);
        let rendered = format!("{config:?} {:?}", config.lookup("topsecret").unwrap());
        assert!(!rendered.contains("topsecret"));
    }

    #[test]
    fn builder_defaults_to_enabled() {
        let config = SecurityConfig::builder()
            .token(Role::Viewer, "v")
            .receipts_token("r")
            .build();
        assert!(config.enabled());
        assert_eq!(config.lookup("v").unwrap().role, Role::Viewer);
        assert_eq!(config.receipts_token(), Some("r"));
    }
}
