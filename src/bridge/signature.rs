// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HMAC-SHA256 verification for voice-assistant bridge calls.
//!
//! The bridge cannot present app tokens, so it authenticates with three
//! headers:
//!
//! | Header | Value |
//! |--------|-------|
//! | `x-alexa-token` | shared bridge token |
//! | `x-alexa-timestamp` | unix seconds |
//! | `x-alexa-signature` | `sha256=<hex>` of `HMAC(secret, "{timestamp}.{canonical body}")` |
//!
//! The verifier canonicalizes the body it actually received, so the sender's
//! key order and whitespace do not matter, but any change to the content
//! does.

use std::fmt;

use axum::http::HeaderMap;
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::canonical::canonicalize;
use crate::auth::AuthError;
use crate::config::{
    non_empty, process_env, BRIDGE_MAX_SKEW_ENV, BRIDGE_SECRET_ENV, BRIDGE_TOKEN_ENV,
};

type HmacSha256 = Hmac<Sha256>;

pub const TOKEN_HEADER: &str = "x-alexa-token";
pub const SIGNATURE_HEADER: &str = "x-alexa-signature";
pub const TIMESTAMP_HEADER: &str = "x-alexa-timestamp";
pub const SIGNATURE_PREFIX: &str = "sha256=";

/// Default accepted clock skew (5 minutes).
pub const DEFAULT_MAX_SKEW_SECS: i64 = 300;

/// Bridge credentials.
#[derive(Clone)]
pub struct BridgeConfig {
    token: Option<String>,
    secret: Option<String>,
    max_skew_secs: i64,
}

impl fmt::Debug for BridgeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeConfig")
            .field("token", &self.token.is_some())
            .field("secret", &self.secret.is_some())
            .field("max_skew_secs", &self.max_skew_secs)
            .finish()
    }
}

impl BridgeConfig {
    pub fn new(token: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            secret: Some(secret.into()),
            max_skew_secs: DEFAULT_MAX_SKEW_SECS,
        }
    }

    /// A configuration that rejects every call.
    pub fn disabled() -> Self {
        Self {
            token: None,
            secret: None,
            max_skew_secs: DEFAULT_MAX_SKEW_SECS,
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(process_env)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let max_skew_secs = non_empty(&lookup, BRIDGE_MAX_SKEW_ENV)
            .and_then(|raw| raw.parse::<i64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_MAX_SKEW_SECS);

        Self {
            token: non_empty(&lookup, BRIDGE_TOKEN_ENV),
            secret: non_empty(&lookup, BRIDGE_SECRET_ENV),
            max_skew_secs,
        }
    }

    pub fn with_max_skew(mut self, secs: i64) -> Self {
        self.max_skew_secs = secs;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.token.is_some() && self.secret.is_some()
    }
}

/// Why a bridge call was refused. Logged, never returned to the caller.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum VerifyFailure {
    #[error("bridge token or secret not configured")]
    NotConfigured,
    #[error("missing header {0}")]
    MissingHeader(&'static str),
    #[error("bridge token mismatch")]
    TokenMismatch,
    #[error("timestamp is not unix seconds")]
    BadTimestamp,
    #[error("timestamp outside accepted window ({skew}s)")]
    StaleTimestamp { skew: i64 },
    #[error("signature header is not sha256=<hex>")]
    MalformedSignature,
    #[error("body is not valid JSON")]
    BodyNotJson,
    #[error("signature mismatch")]
    SignatureMismatch,
}

/// String that gets signed: `"{timestamp}.{canonical}"`.
pub fn signing_input(timestamp: &str, canonical: &str) -> String {
    format!("{timestamp}.{canonical}")
}

fn mac_for(secret: &[u8], timestamp: &str, canonical: &str) -> HmacSha256 {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(signing_input(timestamp, canonical).as_bytes());
    mac
}

/// Hex-encoded signature without prefix.
pub fn compute_signature(secret: &[u8], timestamp: &str, canonical: &str) -> String {
    hex::encode(mac_for(secret, timestamp, canonical).finalize().into_bytes())
}

/// Header value a bridge client sends for `payload` at `timestamp`.
pub fn sign_bridge_payload(secret: &str, timestamp: i64, payload: &Value) -> String {
    let signature = compute_signature(
        secret.as_bytes(),
        &timestamp.to_string(),
        &canonicalize(payload),
    );
    format!("{SIGNATURE_PREFIX}{signature}")
}

/// Verifies bridge requests before any automation runs.
#[derive(Debug, Clone)]
pub struct BridgeVerifier {
    config: BridgeConfig,
}

impl BridgeVerifier {
    pub fn new(config: BridgeConfig) -> Self {
        Self { config }
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    /// Verify headers and raw body at time `now` (unix seconds).
    ///
    /// Returns the parsed body on success. Every failure maps to the same
    /// generic error; the reason is only logged at debug level.
    pub fn verify(&self, headers: &HeaderMap, body: &[u8], now: i64) -> Result<Value, AuthError> {
        self.check(headers, body, now).map_err(|reason| {
            tracing::debug!(reason = %reason, "Bridge signature rejected");
            AuthError::SignatureVerificationFailed
        })
    }

    fn check(&self, headers: &HeaderMap, body: &[u8], now: i64) -> Result<Value, VerifyFailure> {
        let (Some(expected_token), Some(secret)) = (&self.config.token, &self.config.secret)
        else {
            return Err(VerifyFailure::NotConfigured);
        };

        let token = header(headers, TOKEN_HEADER)?;
        if !bool::from(token.as_bytes().ct_eq(expected_token.as_bytes())) {
            return Err(VerifyFailure::TokenMismatch);
        }

        let timestamp = header(headers, TIMESTAMP_HEADER)?;
        let sent_at: i64 = timestamp.parse().map_err(|_| VerifyFailure::BadTimestamp)?;
        let skew = now.saturating_sub(sent_at).saturating_abs();
        if skew > self.config.max_skew_secs {
            return Err(VerifyFailure::StaleTimestamp { skew });
        }

        let signature = header(headers, SIGNATURE_HEADER)?;
        let signature = signature
            .strip_prefix(SIGNATURE_PREFIX)
            .and_then(|hex_sig| hex::decode(hex_sig).ok())
            .filter(|bytes| bytes.len() == 32)
            .ok_or(VerifyFailure::MalformedSignature)?;

        let payload: Value = serde_json::from_slice(body).map_err(|_| VerifyFailure::BodyNotJson)?;
        let canonical = canonicalize(&payload);

        mac_for(secret.as_bytes(), timestamp, &canonical)
            .verify_slice(&signature)
            .map_err(|_| VerifyFailure::SignatureMismatch)?;

        Ok(payload)
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str, VerifyFailure> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(VerifyFailure::MissingHeader(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::json;

    const NOW: i64 = 1_760_000_000;

    fn verifier() -> BridgeVerifier {
        BridgeVerifier::new(BridgeConfig::new("bridge-token", "bridge-secret"))
    }

    fn signed_headers(token: &str, timestamp: i64, signature: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(TOKEN_HEADER, HeaderValue::from_str(token).unwrap());
        headers.insert(
            TIMESTAMP_HEADER,
            HeaderValue::from_str(&timestamp.to_string()).unwrap(),
        );
        headers.insert(SIGNATURE_HEADER, HeaderValue::from_str(signature).unwrap());
        headers
    }

    fn signed(payload: &Value, timestamp: i64) -> (HeaderMap, Vec<u8>) {
        let signature = sign_bridge_payload("bridge-secret", timestamp, payload);
        (
            signed_headers("bridge-token", timestamp, &signature),
            serde_json::to_vec(payload).unwrap(),
        )
    }

    #[test]
    fn signature_has_prefix_and_64_hex_chars() {
        let header = sign_bridge_payload("s", NOW, &json!({"a": 1}));
        let hex_part = header.strip_prefix("sha256=").unwrap();
        assert_eq!(hex_part.len(), 64);
        assert!(hex_part.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn signature_is_over_timestamp_dot_canonical_body() {
        let expected = compute_signature(b"s", "42", r#"{"a":2,"b":1}"#);
        let header = sign_bridge_payload("s", 42, &json!({"b": 1, "a": 2}));
        assert_eq!(header, format!("sha256={expected}"));
    }

    #[test]
    fn valid_request_verifies_and_returns_payload() {
        let payload = json!({"intent": "StockCheck", "slots": {"sku": "A-1"}});
        let (headers, body) = signed(&payload, NOW);
        assert_eq!(verifier().verify(&headers, &body, NOW).unwrap(), payload);
    }

    #[test]
    fn received_key_order_does_not_matter() {
        let signature = sign_bridge_payload("bridge-secret", NOW, &json!({"a": 2, "b": 1}));
        let headers = signed_headers("bridge-token", NOW, &signature);
        let body = br#"{ "b": 1, "a": 2 }"#;
        assert!(verifier().verify(&headers, body, NOW).is_ok());
    }

    #[test]
    fn unconfigured_bridge_rejects() {
        let payload = json!({"intent": "x"});
        let (headers, body) = signed(&payload, NOW);
        let verifier = BridgeVerifier::new(BridgeConfig::disabled());
        assert_eq!(
            verifier.check(&headers, &body, NOW),
            Err(VerifyFailure::NotConfigured)
        );
    }

    #[test]
    fn wrong_token_rejects() {
        let payload = json!({"intent": "x"});
        let signature = sign_bridge_payload("bridge-secret", NOW, &payload);
        let headers = signed_headers("other-token", NOW, &signature);
        let body = serde_json::to_vec(&payload).unwrap();
        assert_eq!(
            verifier().check(&headers, &body, NOW),
            Err(VerifyFailure::TokenMismatch)
        );
    }

    #[test]
    fn missing_headers_reject() {
        let payload = json!({"intent": "x"});
        let (mut headers, body) = signed(&payload, NOW);
        headers.remove(SIGNATURE_HEADER);
        assert_eq!(
            verifier().check(&headers, &body, NOW),
            Err(VerifyFailure::MissingHeader(SIGNATURE_HEADER))
        );
        assert!(matches!(
            verifier().verify(&HeaderMap::new(), &body, NOW),
            Err(AuthError::SignatureVerificationFailed)
        ));
    }

    #[test]
    fn stale_and_future_timestamps_reject() {
        let payload = json!({"intent": "x"});
        let (headers, body) = signed(&payload, NOW - 301);
        assert_eq!(
            verifier().check(&headers, &body, NOW),
            Err(VerifyFailure::StaleTimestamp { skew: 301 })
        );

        let (headers, body) = signed(&payload, NOW + 301);
        assert!(verifier().check(&headers, &body, NOW).is_err());

        let (headers, body) = signed(&payload, NOW - 300);
        assert!(verifier().check(&headers, &body, NOW).is_ok());
    }

    #[test]
    fn narrower_window_is_honoured() {
        let verifier = BridgeVerifier::new(
            BridgeConfig::new("bridge-token", "bridge-secret").with_max_skew(30),
        );
        let payload = json!({"intent": "x"});
        let (headers, body) = signed(&payload, NOW - 31);
        assert_eq!(
            verifier.check(&headers, &body, NOW),
            Err(VerifyFailure::StaleTimestamp { skew: 31 })
        );
        let (headers, body) = signed(&payload, NOW + 30);
        assert!(verifier.check(&headers, &body, NOW).is_ok());
    }

    #[test]
    fn non_numeric_timestamp_rejects() {
        let mut headers = signed_headers("bridge-token", NOW, "sha256=00");
        headers.insert(TIMESTAMP_HEADER, HeaderValue::from_static("yesterday"));
        assert_eq!(
            verifier().check(&headers, b"{}", NOW),
            Err(VerifyFailure::BadTimestamp)
        );
    }

    #[test]
    fn malformed_signature_rejects() {
        for bad in ["deadbeef", "sha256=zz", "sha256=abcd", "md5=00"] {
            let headers = signed_headers("bridge-token", NOW, bad);
            assert_eq!(
                verifier().check(&headers, b"{}", NOW),
                Err(VerifyFailure::MalformedSignature),
                "{bad}"
            );
        }
    }

    #[test]
    fn tampered_body_rejects() {
        let payload = json!({"intent": "CreateOrder", "slots": {"qty": 1}});
        let (headers, _) = signed(&payload, NOW);
        let tampered = serde_json::to_vec(&json!({"intent": "CreateOrder", "slots": {"qty": 9}}))
            .unwrap();
        assert_eq!(
            verifier().check(&headers, &tampered, NOW),
            Err(VerifyFailure::SignatureMismatch)
        );
    }

    #[test]
    fn last_digit_of_wide_integer_is_signed() {
        let payload: Value =
            serde_json::from_str(r#"{"intent":"x","slots":{"n":12345678901234567890123}}"#)
                .unwrap();
        let (headers, body) = signed(&payload, NOW);
        assert!(verifier().check(&headers, &body, NOW).is_ok());

        let tampered = br#"{"intent":"x","slots":{"n":12345678901234567890124}}"#;
        assert_eq!(
            verifier().check(&headers, tampered, NOW),
            Err(VerifyFailure::SignatureMismatch)
        );
    }

    #[test]
    fn signature_bound_to_timestamp() {
        let payload = json!({"intent": "x"});
        let signature = sign_bridge_payload("bridge-secret", NOW - 10, &payload);
        let headers = signed_headers("bridge-token", NOW, &signature);
        let body = serde_json::to_vec(&payload).unwrap();
        assert_eq!(
            verifier().check(&headers, &body, NOW),
            Err(VerifyFailure::SignatureMismatch)
        );
    }

    #[test]
    fn config_from_lookup() {
        let config = BridgeConfig::from_lookup(|key| match key {
            "ALEXA_BRIDGE_TOKEN" => Some("t".to_string()),
            "ALEXA_BRIDGE_SECRET" => Some(" s ".to_string()),
            "ALEXA_MAX_SKEW_SECS" => Some("60".to_string()),
            _ => None,
        });
        assert!(config.is_configured());
        assert_eq!(config.max_skew_secs, 60);
        assert!(!format!("{config:?}").contains("\"s\""));

        let partial = BridgeConfig::from_lookup(|key| {
            (key == "ALEXA_BRIDGE_TOKEN").then(|| "t".to_string())
        });
        assert!(!partial.is_configured());
        assert_eq!(partial.max_skew_secs, DEFAULT_MAX_SKEW_SECS);
    }
}
