// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Receipt ingestion.
//!
//! Called by the ingestion service with `x-receipts-token`, which the
//! resolver only honours under `/receipts/`. App tokens work as well.

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    auth::MaybePrincipal,
    error::ApiError,
    models::{IngestReceiptRequest, Receipt},
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/receipts/ingest",
    request_body = IngestReceiptRequest,
    tag = "Receipts",
    security(("receipts_token" = []), ("app_token" = []), ("bearer" = [])),
    responses(
        (status = 201, body = Receipt),
        (status = 422, description = "Negative total", body = crate::error::ErrorBody)
    )
)]
pub async fn ingest_receipt(
    State(state): State<AppState>,
    principal: MaybePrincipal,
    Json(request): Json<IngestReceiptRequest>,
) -> Result<(StatusCode, Json<Receipt>), ApiError> {
    if request.total_cents < 0 {
        return Err(ApiError::unprocessable("totalCents must not be negative"));
    }
    let receipt = state
        .store
        .write()
        .await
        .ingest_receipt(request, principal.label());
    tracing::info!(
        receipt_id = %receipt.id,
        ingested_by = %receipt.ingested_by,
        "Receipt ingested"
    );
    Ok((StatusCode::CREATED, Json(receipt)))
}
