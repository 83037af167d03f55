// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! OAuth-style account linking for the voice-assistant skill.
//!
//! ## Flow
//!
//! 1. The assistant opens `GET /alexa/oauth/authorize` in a browser
//! 2. An app user approves with their app token; an authorization code
//!    (single use, 5 minutes) is issued and the browser is redirected to
//!    `redirect_uri?code=...&state=...`
//! 3. The assistant exchanges the code at `POST /alexa/oauth/token` for an
//!    access token (1 hour) and a refresh token (30 days)
//! 4. Bridge commands may carry the access token to act as the linked user
//!
//! Everything lives in memory; a restart unlinks every account.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use subtle::ConstantTimeEq;
use tokio::sync::RwLock;
use url::Url;
use uuid::Uuid;

use crate::config::{
    non_empty, process_env, OAUTH_CLIENT_ID_ENV, OAUTH_CLIENT_SECRET_ENV,
    OAUTH_REDIRECT_ORIGINS_ENV,
};

const CODE_TTL_SECS: i64 = 5 * 60;
const ACCESS_TTL_SECS: i64 = 60 * 60;
const REFRESH_TTL_SECS: i64 = 30 * 24 * 60 * 60;

/// Registered OAuth client.
#[derive(Clone)]
pub struct LinkingConfig {
    pub client_id: String,
    client_secret: String,
    /// Allowed redirect origins, e.g. `https://layla.amazon.com`
    pub redirect_origins: Vec<String>,
}

impl fmt::Debug for LinkingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkingConfig")
            .field("client_id", &self.client_id)
            .field("redirect_origins", &self.redirect_origins)
            .finish_non_exhaustive()
    }
}

impl LinkingConfig {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_origins: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_origins: redirect_origins
                .into_iter()
                .map(|origin| origin.trim().trim_end_matches('/').to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
        }
    }

    /// `None` unless client id and secret are both set.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(process_env)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let client_id = non_empty(&lookup, OAUTH_CLIENT_ID_ENV)?;
        let client_secret = non_empty(&lookup, OAUTH_CLIENT_SECRET_ENV)?;
        let origins = non_empty(&lookup, OAUTH_REDIRECT_ORIGINS_ENV)
            .map(|raw| raw.split(',').map(str::to_string).collect::<Vec<_>>())
            .unwrap_or_default();
        Some(Self::new(client_id, client_secret, origins))
    }

    fn client_matches(&self, client_id: &str, client_secret: &str) -> bool {
        client_id == self.client_id
            && bool::from(client_secret.as_bytes().ct_eq(self.client_secret.as_bytes()))
    }

    /// Parse and check a redirect URI against the allowed origins.
    pub fn check_redirect(&self, redirect_uri: &str) -> Result<Url, LinkError> {
        let url = Url::parse(redirect_uri).map_err(|_| LinkError::InvalidRequest)?;
        if url.scheme() != "https" {
            return Err(LinkError::InvalidRequest);
        }
        let origin = url.origin().ascii_serialization();
        if !self.redirect_origins.iter().any(|allowed| *allowed == origin) {
            return Err(LinkError::InvalidRequest);
        }
        Ok(url)
    }
}

/// RFC 6749 error codes used by the token endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LinkError {
    #[error("invalid_request")]
    InvalidRequest,
    #[error("invalid_client")]
    InvalidClient,
    #[error("invalid_grant")]
    InvalidGrant,
    #[error("unsupported_grant_type")]
    UnsupportedGrantType,
    #[error("temporarily_unavailable")]
    NotConfigured,
}

/// Token response body.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TokenGrant {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub refresh_token: String,
}

/// A linked account as seen by the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedAccount {
    /// Token label of the app user who approved the link
    pub linked_by: String,
    pub client_id: String,
}

#[derive(Debug, Clone)]
struct PendingCode {
    client_id: String,
    redirect_uri: String,
    linked_by: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct IssuedToken {
    account: LinkedAccount,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct LinkTables {
    codes: HashMap<String, PendingCode>,
    access: HashMap<String, IssuedToken>,
    refresh: HashMap<String, IssuedToken>,
}

/// Issues and validates linking codes and tokens.
pub struct AccountLinking {
    config: Option<LinkingConfig>,
    tables: RwLock<LinkTables>,
}

impl AccountLinking {
    pub fn new(config: Option<LinkingConfig>) -> Self {
        Self {
            config,
            tables: RwLock::new(LinkTables::default()),
        }
    }

    pub fn config(&self) -> Result<&LinkingConfig, LinkError> {
        self.config.as_ref().ok_or(LinkError::NotConfigured)
    }

    /// Validate an authorize request; returns the parsed redirect URI.
    pub fn check_authorize(
        &self,
        client_id: &str,
        redirect_uri: &str,
        response_type: &str,
    ) -> Result<Url, LinkError> {
        let config = self.config()?;
        if client_id != config.client_id {
            return Err(LinkError::InvalidClient);
        }
        if response_type != "code" {
            return Err(LinkError::InvalidRequest);
        }
        config.check_redirect(redirect_uri)
    }

    /// Issue a single-use authorization code.
    pub async fn issue_code(
        &self,
        client_id: &str,
        redirect_uri: &str,
        linked_by: &str,
        now: DateTime<Utc>,
    ) -> Result<String, LinkError> {
        self.check_authorize(client_id, redirect_uri, "code")?;
        let code = random_token();
        self.tables.write().await.codes.insert(
            code.clone(),
            PendingCode {
                client_id: client_id.to_string(),
                redirect_uri: redirect_uri.to_string(),
                linked_by: linked_by.to_string(),
                expires_at: now + Duration::seconds(CODE_TTL_SECS),
            },
        );
        Ok(code)
    }

    /// `grant_type=authorization_code`.
    pub async fn exchange_code(
        &self,
        client_id: &str,
        client_secret: &str,
        code: &str,
        redirect_uri: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<TokenGrant, LinkError> {
        let config = self.config()?;
        if !config.client_matches(client_id, client_secret) {
            return Err(LinkError::InvalidClient);
        }

        let mut tables = self.tables.write().await;
        // Removed up front: a code is burned even when the exchange fails.
        let pending = tables.codes.remove(code).ok_or(LinkError::InvalidGrant)?;
        if pending.expires_at <= now || pending.client_id != client_id {
            return Err(LinkError::InvalidGrant);
        }
        if redirect_uri.is_some_and(|uri| uri != pending.redirect_uri) {
            return Err(LinkError::InvalidGrant);
        }

        let account = LinkedAccount {
            linked_by: pending.linked_by,
            client_id: pending.client_id,
        };
        Ok(issue_tokens(&mut tables, account, now))
    }

    /// `grant_type=refresh_token`. Rotates both tokens.
    pub async fn refresh(
        &self,
        client_id: &str,
        client_secret: &str,
        refresh_token: &str,
        now: DateTime<Utc>,
    ) -> Result<TokenGrant, LinkError> {
        let config = self.config()?;
        if !config.client_matches(client_id, client_secret) {
            return Err(LinkError::InvalidClient);
        }

        let mut tables = self.tables.write().await;
        let issued = tables
            .refresh
            .remove(refresh_token)
            .ok_or(LinkError::InvalidGrant)?;
        if issued.expires_at <= now || issued.account.client_id != client_id {
            return Err(LinkError::InvalidGrant);
        }
        // Old access tokens for this link stay valid until they expire.
        Ok(issue_tokens(&mut tables, issued.account, now))
    }

    /// Resolve a bearer token presented through the bridge.
    pub async fn resolve(&self, access_token: &str, now: DateTime<Utc>) -> Option<LinkedAccount> {
        let tables = self.tables.read().await;
        tables
            .access
            .get(access_token)
            .filter(|issued| issued.expires_at > now)
            .map(|issued| issued.account.clone())
    }

    /// Drop expired codes and tokens. Returns how many entries went away.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut tables = self.tables.write().await;
        let before = tables.codes.len() + tables.access.len() + tables.refresh.len();
        tables.codes.retain(|_, code| code.expires_at > now);
        tables.access.retain(|_, token| token.expires_at > now);
        tables.refresh.retain(|_, token| token.expires_at > now);
        before - (tables.codes.len() + tables.access.len() + tables.refresh.len())
    }
}

fn issue_tokens(tables: &mut LinkTables, account: LinkedAccount, now: DateTime<Utc>) -> TokenGrant {
    let access_token = random_token();
    let refresh_token = random_token();
    tables.access.insert(
        access_token.clone(),
        IssuedToken {
            account: account.clone(),
            expires_at: now + Duration::seconds(ACCESS_TTL_SECS),
        },
    );
    tables.refresh.insert(
        refresh_token.clone(),
        IssuedToken {
            account,
            expires_at: now + Duration::seconds(REFRESH_TTL_SECS),
        },
    );
    TokenGrant {
        access_token,
        token_type: "Bearer",
        expires_in: ACCESS_TTL_SECS,
        refresh_token,
    }
}

fn random_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    const REDIRECT: &str = "https://layla.amazon.com/api/skill/link/M123";

    fn linking() -> AccountLinking {
        AccountLinking::new(Some(LinkingConfig::new(
            "skill",
            "skill-secret",
            vec!["https://layla.amazon.com/".to_string()],
        )))
    }

    async fn code(linking: &AccountLinking, now: DateTime<Utc>) -> String {
        linking
            .issue_code("skill", REDIRECT, "APP_AUTH_TOKEN", now)
            .await
            .unwrap()
    }

    #[test]
    fn authorize_checks_client_and_redirect() {
        let linking = linking();
        assert!(linking.check_authorize("skill", REDIRECT, "code").is_ok());
        assert_eq!(
            linking.check_authorize("other", REDIRECT, "code"),
            Err(LinkError::InvalidClient)
        );
        assert_eq!(
            linking.check_authorize("skill", REDIRECT, "token"),
            Err(LinkError::InvalidRequest)
        );
        for bad in [
            "http://layla.amazon.com/x",
            "https://evil.example.com/x",
            "https://layla.amazon.com.evil.example/x",
            "not a url",
        ] {
            assert_eq!(
                linking.check_authorize("skill", bad, "code"),
                Err(LinkError::InvalidRequest),
                "{bad}"
            );
        }
    }

    #[test]
    fn unconfigured_linking_refuses() {
        let linking = AccountLinking::new(None);
        assert_eq!(
            linking.check_authorize("skill", REDIRECT, "code"),
            Err(LinkError::NotConfigured)
        );
    }

    #[test]
    fn config_from_lookup_requires_id_and_secret() {
        assert!(LinkingConfig::from_lookup(|key| {
            (key == "ALEXA_OAUTH_CLIENT_ID").then(|| "skill".to_string())
        })
        .is_none());

        let config = LinkingConfig::from_lookup(|key| match key {
            "ALEXA_OAUTH_CLIENT_ID" => Some("skill".to_string()),
            "ALEXA_OAUTH_CLIENT_SECRET" => Some("secret".to_string()),
            "ALEXA_OAUTH_REDIRECT_ORIGINS" => {
                Some("https://a.example.com, https://b.example.com/".to_string())
            }
            _ => None,
        })
        .unwrap();
        assert_eq!(
            config.redirect_origins,
            vec!["https://a.example.com", "https://b.example.com"]
        );
        assert!(!format!("{config:?}").contains("secret\""));
    }

    #[tokio::test]
    async fn code_exchange_issues_usable_token() {
        let linking = linking();
        let now = Utc::now();
        let code = code(&linking, now).await;

        let grant = linking
            .exchange_code("skill", "skill-secret", &code, Some(REDIRECT), now)
            .await
            .unwrap();
        assert_eq!(grant.token_type, "Bearer");
        assert_eq!(grant.expires_in, 3600);

        let account = linking.resolve(&grant.access_token, now).await.unwrap();
        assert_eq!(account.linked_by, "APP_AUTH_TOKEN");
        assert!(linking
            .resolve(&grant.access_token, now + Duration::hours(2))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn codes_are_single_use() {
        let linking = linking();
        let now = Utc::now();
        let code = code(&linking, now).await;

        assert!(linking
            .exchange_code("skill", "skill-secret", &code, None, now)
            .await
            .is_ok());
        assert_eq!(
            linking
                .exchange_code("skill", "skill-secret", &code, None, now)
                .await,
            Err(LinkError::InvalidGrant)
        );
    }

    #[tokio::test]
    async fn exchange_rejects_bad_client_expired_code_and_redirect_mismatch() {
        let linking = linking();
        let now = Utc::now();

        let c = code(&linking, now).await;
        assert_eq!(
            linking.exchange_code("skill", "wrong", &c, None, now).await,
            Err(LinkError::InvalidClient)
        );

        let c = code(&linking, now).await;
        assert_eq!(
            linking
                .exchange_code("skill", "skill-secret", &c, None, now + Duration::minutes(6))
                .await,
            Err(LinkError::InvalidGrant)
        );

        let c = code(&linking, now).await;
        assert_eq!(
            linking
                .exchange_code(
                    "skill",
                    "skill-secret",
                    &c,
                    Some("https://layla.amazon.com/other"),
                    now
                )
                .await,
            Err(LinkError::InvalidGrant)
        );
    }

    #[tokio::test]
    async fn refresh_rotates_tokens() {
        let linking = linking();
        let now = Utc::now();
        let code = code(&linking, now).await;
        let first = linking
            .exchange_code("skill", "skill-secret", &code, None, now)
            .await
            .unwrap();

        let second = linking
            .refresh("skill", "skill-secret", &first.refresh_token, now)
            .await
            .unwrap();
        assert_ne!(first.access_token, second.access_token);
        assert!(linking.resolve(&second.access_token, now).await.is_some());

        assert_eq!(
            linking
                .refresh("skill", "skill-secret", &first.refresh_token, now)
                .await,
            Err(LinkError::InvalidGrant)
        );
    }

    #[tokio::test]
    async fn purge_drops_expired_entries() {
        let linking = linking();
        let now = Utc::now();
        let code_value = code(&linking, now).await;
        let _unused = code(&linking, now).await;
        linking
            .exchange_code("skill", "skill-secret", &code_value, None, now)
            .await
            .unwrap();

        assert_eq!(linking.purge_expired(now).await, 0);
        // Unused code and access token are gone; refresh token remains.
        assert_eq!(linking.purge_expired(now + Duration::hours(2)).await, 2);
        assert_eq!(linking.purge_expired(now + Duration::days(31)).await, 1);
    }
}
