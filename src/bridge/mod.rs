// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Voice Assistant Bridge
//!
//! Trust path for the Alexa skill, independent of the app-token pipeline.
//! The bridge endpoint is declared public and verifies every call itself:
//!
//! - [`signature`] - shared token + timestamp + HMAC over the canonical body
//! - [`linking`] - OAuth-style account linking that issues bridge bearer tokens
//! - [`sweeper`] - background purge of expired linking state

pub mod canonical;
pub mod linking;
pub mod signature;
pub mod sweeper;

use serde::Deserialize;
use serde_json::{Map, Value};

pub use canonical::canonicalize;
pub use linking::{AccountLinking, LinkError, LinkedAccount, LinkingConfig, TokenGrant};
pub use signature::{sign_bridge_payload, BridgeConfig, BridgeVerifier};
pub use sweeper::LinkSweeper;

/// Command relayed by the skill after verification.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeCommand {
    /// Intent name, e.g. `StockCheck`
    pub intent: String,
    #[serde(default)]
    pub slots: Map<String, Value>,
    /// Account-linking token, when the skill user has linked an account
    #[serde(default)]
    pub access_token: Option<String>,
}
