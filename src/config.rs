// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is read from the environment
//! once, in `main`, and the resulting structs are handed to the components
//! that need them. Nothing re-reads the environment after startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `APP_ENV` | Runtime mode (`development`, `dev`, `local`, `test` are dev-like) | `production` |
//! | `APP_AUTH_ENABLED` | Force token enforcement on/off | on, off in dev-like modes |
//! | `APP_AUTH_TOKEN` | Single admin token | - |
//! | `APP_AUTH_TOKENS` | Comma-separated `role:secret` list | - |
//! | `RECEIPTS_API_TOKEN` | Operator token valid only under `/receipts/` | - |
//! | `ALEXA_BRIDGE_TOKEN` | Shared token sent by the voice bridge | - |
//! | `ALEXA_BRIDGE_SECRET` | HMAC key for bridge signatures | - |
//! | `ALEXA_MAX_SKEW_SECS` | Accepted bridge clock skew in seconds | `300` |
//! | `ALEXA_OAUTH_CLIENT_ID` | Account-linking client id | - |
//! | `ALEXA_OAUTH_CLIENT_SECRET` | Account-linking client secret | - |
//! | `ALEXA_OAUTH_REDIRECT_ORIGINS` | Comma-separated allowed redirect origins | - |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM files; TLS is enabled when both are set | - |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `SEED_CUSTOMERS` | Comma-separated customer names inserted at startup | - |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::path::PathBuf;

pub const APP_ENV_ENV: &str = "APP_ENV";
pub const AUTH_ENABLED_ENV: &str = "APP_AUTH_ENABLED";
pub const AUTH_TOKEN_ENV: &str = "APP_AUTH_TOKEN";
pub const AUTH_TOKENS_ENV: &str = "APP_AUTH_TOKENS";
pub const RECEIPTS_TOKEN_ENV: &str = "RECEIPTS_API_TOKEN";

pub const BRIDGE_TOKEN_ENV: &str = "ALEXA_BRIDGE_TOKEN";
pub const BRIDGE_SECRET_ENV: &str = "ALEXA_BRIDGE_SECRET";
pub const BRIDGE_MAX_SKEW_ENV: &str = "ALEXA_MAX_SKEW_SECS";
pub const OAUTH_CLIENT_ID_ENV: &str = "ALEXA_OAUTH_CLIENT_ID";
pub const OAUTH_CLIENT_SECRET_ENV: &str = "ALEXA_OAUTH_CLIENT_SECRET";
pub const OAUTH_REDIRECT_ORIGINS_ENV: &str = "ALEXA_OAUTH_REDIRECT_ORIGINS";

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";
pub const SEED_CUSTOMERS_ENV: &str = "SEED_CUSTOMERS";

pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

const DEV_LIKE_MODES: [&str; 4] = ["development", "dev", "local", "test"];

/// Read a variable from the real process environment.
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Parse a boolean-ish flag.
///
/// Accepts `1/true/yes/y/on` and `0/false/no/n/off` (trimmed,
/// case-insensitive). Anything else, including an empty value, is `None`
/// so the caller can fall back to its default.
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

/// Whether `APP_ENV` names a development-like mode.
pub fn is_dev_mode(lookup: &impl Fn(&str) -> Option<String>) -> bool {
    lookup(APP_ENV_ENV)
        .map(|mode| DEV_LIKE_MODES.contains(&mode.trim().to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Read a variable and drop it when empty after trimming.
pub fn non_empty(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Listener and logging settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub tls: Option<TlsPaths>,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid bind address {0}")]
    InvalidAddress(String),
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(process_env)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = non_empty(&lookup, HOST_ENV).unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = non_empty(&lookup, PORT_ENV)
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .map_err(|_| ConfigError::InvalidAddress(format!("{host}:{port}")))?;

        let tls = match (
            non_empty(&lookup, TLS_CERT_PATH_ENV),
            non_empty(&lookup, TLS_KEY_PATH_ENV),
        ) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            _ => None,
        };

        let log_format = match non_empty(&lookup, LOG_FORMAT_ENV).as_deref() {
            Some(f) if f.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            addr,
            tls,
            log_format,
        })
    }
}
