// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// Health check response with individual component status.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    /// Always "ok" while the process serves requests.
    pub status: String,
    pub checks: HealthChecks,
}

/// Individual component status.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthChecks {
    pub service: String,
    /// "enforced" or "disabled"
    pub auth: String,
    /// "configured" or "unconfigured"; an unconfigured bridge rejects every call.
    pub bridge: String,
    /// "configured" or "unconfigured"
    pub account_linking: String,
}

/// Simple health check response for liveness probes.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

fn configured(flag: bool) -> String {
    let status = if flag { "configured" } else { "unconfigured" };
    status.to_string()
}

/// Health check endpoint handler.
///
/// Reachable without credentials. Reports whether each trust path is set up
/// but never any secret material.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses((status = 200, description = "Service is up", body = ReadyResponse))
)]
pub async fn health(State(state): State<AppState>) -> Json<ReadyResponse> {
    let auth = if state.security.enabled() {
        "enforced"
    } else {
        "disabled"
    };

    Json(ReadyResponse {
        status: "ok".to_string(),
        checks: HealthChecks {
            service: "ok".to_string(),
            auth: auth.to_string(),
            bridge: configured(state.bridge.is_configured()),
            account_linking: configured(state.linking.config().is_ok()),
        },
    })
}

/// Liveness probe handler.
///
/// Always returns 200 if the process is running.
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses((status = 200, description = "Process is alive", body = HealthResponse))
)]
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
