// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{middleware::from_fn_with_state, Router};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{
        security_middleware, AuthPrincipal, Controller, Declaration, Role, SecuredRouter,
        SecurityGate, SecurityPipeline,
    },
    error::ErrorBody,
    models::{
        AutomationRecord, AutomationRule, CreateAutomationRuleRequest, CreateOrderRequest,
        Customer, IngestReceiptRequest, Order, OrderLine, Receipt,
    },
    state::AppState,
};

pub mod automation;
pub mod bridge;
pub mod customers;
pub mod health;
pub mod oauth;
pub mod orders;
pub mod receipts;
pub mod users;

type AppController = Controller<AppState>;

/// Every route with its security declaration.
///
/// Controllers without a `declare` call require authentication with no role
/// restriction; viewers still cannot use mutating methods anywhere.
fn controllers() -> SecuredRouter<AppState> {
    use Role::{Admin, Operator};

    SecuredRouter::new()
        .mount(
            AppController::new("health")
                .declare(Declaration::public())
                .get("/health", health::health, Declaration::none())
                .get("/health/live", health::liveness, Declaration::none()),
        )
        .mount(AppController::new("users").get("/me", users::get_me, Declaration::none()))
        .mount(
            AppController::new("orders")
                .get("/orders", orders::list_orders, Declaration::none())
                .post("/orders", orders::create_order, Declaration::none())
                .delete(
                    "/orders/{order_id}",
                    orders::delete_order,
                    Declaration::roles([Admin, Operator]),
                ),
        )
        .mount(AppController::new("customers").get(
            "/customers",
            customers::list_customers,
            Declaration::none(),
        ))
        .mount(AppController::new("receipts").post(
            "/receipts/ingest",
            receipts::ingest_receipt,
            Declaration::none(),
        ))
        .mount(
            AppController::new("automation")
                .declare(Declaration::roles([Admin, Operator]))
                .get("/automation/rules", automation::list_rules, Declaration::none())
                .post("/automation/rules", automation::create_rule, Declaration::none()),
        )
        .mount(
            AppController::new("bridge")
                .declare(Declaration::public())
                .post("/alexa/bridge", bridge::bridge_command, Declaration::none())
                .get("/alexa/oauth/authorize", oauth::authorize, Declaration::none())
                .post("/alexa/oauth/approve", oauth::approve, Declaration::none())
                .post("/alexa/oauth/token", oauth::token, Declaration::none()),
        )
}

pub fn router(state: AppState) -> Router {
    let (routes, table) = controllers().into_parts();
    tracing::debug!(routes = table.len(), "Route table built");

    let gate = SecurityGate::new(SecurityPipeline::standard(state.security.clone()), table);

    routes
        .route_layer(from_fn_with_state(gate, security_middleware))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "app_token",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("x-app-token"))),
        );
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
        components.add_security_scheme(
            "receipts_token",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("x-receipts-token"))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        users::get_me,
        orders::list_orders,
        orders::create_order,
        orders::delete_order,
        customers::list_customers,
        receipts::ingest_receipt,
        automation::list_rules,
        automation::create_rule,
        bridge::bridge_command,
        oauth::authorize,
        oauth::approve,
        oauth::token
    ),
    components(
        schemas(
            ErrorBody,
            Role,
            AuthPrincipal,
            Order,
            OrderLine,
            CreateOrderRequest,
            Customer,
            Receipt,
            IngestReceiptRequest,
            AutomationRule,
            CreateAutomationRuleRequest,
            AutomationRecord,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse,
            users::MeResponse,
            oauth::ApproveForm,
            oauth::TokenForm,
            oauth::TokenResponse,
            oauth::OAuthErrorBody
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and configuration status"),
        (name = "Users", description = "Caller identity"),
        (name = "Orders", description = "Order management"),
        (name = "Customers", description = "Customer records"),
        (name = "Receipts", description = "Supplier receipt ingestion"),
        (name = "Automation", description = "Automation rules"),
        (name = "Bridge", description = "Signed voice-assistant commands"),
        (name = "Account Linking", description = "OAuth-style linking for the voice assistant")
    )
)]
struct ApiDoc;
