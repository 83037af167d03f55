// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    auth::MaybePrincipal,
    error::ApiError,
    models::{CreateOrderRequest, Order},
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/orders",
    tag = "Orders",
    security(("app_token" = []), ("bearer" = [])),
    responses((status = 200, body = [Order]))
)]
pub async fn list_orders(State(state): State<AppState>) -> Result<Json<Vec<Order>>, ApiError> {
    let store = state.store.read().await;
    Ok(Json(store.list_orders()))
}

#[utoipa::path(
    post,
    path = "/orders",
    request_body = CreateOrderRequest,
    tag = "Orders",
    security(("app_token" = []), ("bearer" = [])),
    responses(
        (status = 201, body = Order),
        (status = 403, description = "Viewer tokens cannot create orders", body = crate::error::ErrorBody)
    )
)]
pub async fn create_order(
    State(state): State<AppState>,
    principal: MaybePrincipal,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let mut store = state.store.write().await;
    let order = store.create_order(request, principal.label())?;
    tracing::info!(order_id = %order.id, created_by = %order.created_by, "Order created");
    Ok((StatusCode::CREATED, Json(order)))
}

#[utoipa::path(
    delete,
    path = "/orders/{order_id}",
    params(
        ("order_id" = String, Path, description = "Identifier of the order to delete")
    ),
    tag = "Orders",
    security(("app_token" = []), ("bearer" = [])),
    responses(
        (status = 204),
        (status = 403, description = "Admin or operator only", body = crate::error::ErrorBody),
        (status = 404, body = crate::error::ErrorBody)
    )
)]
pub async fn delete_order(
    Path(order_id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let mut store = state.store.write().await;
    store.delete_order(&order_id)?;
    Ok(StatusCode::NO_CONTENT)
}
