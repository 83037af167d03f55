// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};

use crate::{models::Customer, state::AppState};

#[utoipa::path(
    get,
    path = "/customers",
    tag = "Customers",
    security(("app_token" = []), ("bearer" = [])),
    responses((status = 200, body = [Customer]))
)]
pub async fn list_customers(State(state): State<AppState>) -> Json<Vec<Customer>> {
    Json(state.store.read().await.list_customers())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lists_seeded_customers() {
        let state = AppState::default();
        let seeded = state.store.write().await.insert_customer("Acme Fasteners");

        let Json(customers) = list_customers(State(state)).await;
        assert_eq!(customers, vec![seeded]);
    }
}
