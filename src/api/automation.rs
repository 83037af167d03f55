// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    error::ApiError,
    models::{AutomationRule, CreateAutomationRuleRequest},
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/automation/rules",
    tag = "Automation",
    security(("app_token" = []), ("bearer" = [])),
    responses(
        (status = 200, body = [AutomationRule]),
        (status = 403, description = "Admin or operator only", body = crate::error::ErrorBody)
    )
)]
pub async fn list_rules(State(state): State<AppState>) -> Json<Vec<AutomationRule>> {
    Json(state.store.read().await.list_rules())
}

#[utoipa::path(
    post,
    path = "/automation/rules",
    request_body = CreateAutomationRuleRequest,
    tag = "Automation",
    security(("app_token" = []), ("bearer" = [])),
    responses(
        (status = 201, body = AutomationRule),
        (status = 403, description = "Admin or operator only", body = crate::error::ErrorBody)
    )
)]
pub async fn create_rule(
    State(state): State<AppState>,
    Json(request): Json<CreateAutomationRuleRequest>,
) -> Result<(StatusCode, Json<AutomationRule>), ApiError> {
    if request.intent.trim().is_empty() {
        return Err(ApiError::bad_request("intent must not be empty"));
    }
    let rule = state.store.write().await.create_rule(request);
    Ok((StatusCode::CREATED, Json(rule)))
}
