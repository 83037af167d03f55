// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum_server::{tls_rustls::RustlsConfig, Handle};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use erp_rust_server::{
    api::router,
    auth::SecurityConfig,
    bridge::{BridgeConfig, LinkSweeper, LinkingConfig},
    config::{process_env, LogFormat, ServerConfig, DEFAULT_LOG_FILTER, SEED_CUSTOMERS_ENV},
    state::AppState,
    store::InMemoryStore,
};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let server = ServerConfig::from_env()?;
    init_tracing(server.log_format);

    let security = SecurityConfig::from_env();
    let bridge = BridgeConfig::from_env();
    let linking = LinkingConfig::from_env();

    if security.enabled() && security.token_count() == 0 {
        tracing::warn!("Token enforcement is on but no role tokens are configured");
    }
    tracing::info!(
        enforced = security.enabled(),
        role_tokens = security.token_count(),
        receipts_token = security.receipts_token().is_some(),
        bridge = bridge.is_configured(),
        account_linking = linking.is_some(),
        "Security configuration loaded"
    );

    let mut store = InMemoryStore::new();
    if let Some(names) = process_env(SEED_CUSTOMERS_ENV) {
        for name in names.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            store.insert_customer(name);
        }
    }

    let state = AppState::new(store, security)
        .with_bridge(bridge)
        .with_linking(linking);

    let shutdown = CancellationToken::new();
    let sweeper = LinkSweeper::new(Arc::clone(&state.linking));
    let sweeper_task = tokio::spawn(sweeper.run(shutdown.clone()));

    let app = router(state);
    let handle = Handle::new();
    tokio::spawn(shutdown_signal(handle.clone(), shutdown.clone()));

    match &server.tls {
        Some(paths) => {
            rustls::crypto::ring::default_provider()
                .install_default()
                .map_err(|_| "rustls crypto provider already installed")?;
            let tls = RustlsConfig::from_pem_file(&paths.cert, &paths.key).await?;

            tracing::info!(addr = %server.addr, "ERP API listening on https (docs at /docs)");
            axum_server::bind_rustls(server.addr, tls)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            tracing::info!(addr = %server.addr, "ERP API listening on http (docs at /docs)");
            axum_server::bind(server.addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
    }

    shutdown.cancel();
    if let Err(e) = sweeper_task.await {
        tracing::error!(error = %e, "Link sweeper task failed");
    }
    tracing::info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Wait for SIGINT or SIGTERM, then stop background tasks and drain
/// in-flight requests.
async fn shutdown_signal(handle: Handle<SocketAddr>, shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Received shutdown signal");
    shutdown.cancel();
    handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
}
