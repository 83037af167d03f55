// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Link Sweeper
//!
//! Background task that periodically drops expired account-linking codes
//! and tokens so the in-memory tables do not grow without bound.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken` for graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::linking::AccountLinking;

/// Default interval between sweeps.
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

pub struct LinkSweeper {
    linking: Arc<AccountLinking>,
    interval: Duration,
}

impl LinkSweeper {
    pub fn new(linking: Arc<AccountLinking>) -> Self {
        Self {
            linking,
            interval: DEFAULT_SWEEP_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run the sweep loop until the cancellation token is triggered.
    ///
    /// Should be spawned as a background task:
    /// ```rust,ignore
    /// tokio::spawn(sweeper.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            "Link sweeper starting"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Link sweeper shutting down");
                    return;
                }
            }

            let removed = self.linking.purge_expired(Utc::now()).await;
            if removed > 0 {
                debug!(removed, "Link sweeper: purged expired entries");
            }
        }
    }
}
