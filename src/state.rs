// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::auth::SecurityConfig;
use crate::bridge::{AccountLinking, BridgeConfig, BridgeVerifier, LinkingConfig};
use crate::store::InMemoryStore;

/// Shared handler state. Everything except the store is immutable after
/// startup.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<InMemoryStore>>,
    pub security: Arc<SecurityConfig>,
    pub bridge: Arc<BridgeVerifier>,
    pub linking: Arc<AccountLinking>,
}

impl AppState {
    pub fn new(store: InMemoryStore, security: SecurityConfig) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            security: Arc::new(security),
            bridge: Arc::new(BridgeVerifier::new(BridgeConfig::disabled())),
            linking: Arc::new(AccountLinking::new(None)),
        }
    }

    pub fn with_bridge(mut self, config: BridgeConfig) -> Self {
        self.bridge = Arc::new(BridgeVerifier::new(config));
        self
    }

    pub fn with_linking(mut self, config: Option<LinkingConfig>) -> Self {
        self.linking = Arc::new(AccountLinking::new(config));
        self
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(InMemoryStore::new(), SecurityConfig::builder().build())
    }
}
