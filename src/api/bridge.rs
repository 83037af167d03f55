// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Voice-assistant bridge endpoint.
//!
//! Declared public: the app-token pipeline never sees these calls. The
//! handler verifies the shared token, timestamp and body signature itself
//! before anything reaches automation.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;

use crate::{
    auth::AuthError,
    bridge::BridgeCommand,
    error::ApiError,
    models::AutomationRecord,
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/alexa/bridge",
    tag = "Bridge",
    params(
        ("x-alexa-token" = String, Header, description = "Shared bridge token"),
        ("x-alexa-timestamp" = String, Header, description = "Unix seconds used in the signature"),
        ("x-alexa-signature" = String, Header, description = "sha256=<hex HMAC of \"{ts}.{canonical body}\">")
    ),
    request_body(content = Object, content_type = "application/json", description = "Signed bridge command"),
    responses(
        (status = 202, description = "Command verified and recorded", body = AutomationRecord),
        (status = 400, description = "Verified body is not a command", body = crate::error::ErrorBody),
        (status = 401, description = "Signature rejected or account not linked", body = crate::error::ErrorBody)
    )
)]
pub async fn bridge_command(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<AutomationRecord>), Response> {
    let now = Utc::now();
    let payload = state
        .bridge
        .verify(&headers, &body, now.timestamp())
        .map_err(IntoResponse::into_response)?;

    let command: BridgeCommand = serde_json::from_value(payload)
        .map_err(|e| ApiError::bad_request(format!("Invalid bridge command: {e}")).into_response())?;

    let linked_by = match command.access_token.as_deref() {
        Some(token) => {
            let account = state
                .linking
                .resolve(token, now)
                .await
                .ok_or_else(|| AuthError::AccountNotLinked.into_response())?;
            Some(account.linked_by)
        }
        None => None,
    };

    let record = state
        .store
        .write()
        .await
        .record_automation(command.intent, command.slots, linked_by);

    tracing::info!(
        intent = %record.intent,
        linked = record.linked_by.is_some(),
        matched_rules = record.matched_rules.len(),
        "Bridge command accepted"
    );
    Ok((StatusCode::ACCEPTED, Json(record)))
}
