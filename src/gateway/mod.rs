//! HTTP Gateway
//!
//! Thin axum layer over the ledger store and the transfer engine. Every
//! response uses the `{code, msg, data}` envelope.

pub mod handlers;
pub mod openapi;
pub mod state;
pub mod types;

use std::sync::Arc;

use axum::{
    Json, Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use utoipa::OpenApi;

use crate::config::GatewayConfig;
use crate::ledger::UnitOfWork;
use state::AppState;

/// Build the application router
pub fn router<U: UnitOfWork + 'static>(state: Arc<AppState<U>>) -> Router {
    Router::new()
        // Health check
        .route("/api/v1/health", get(handlers::health_check::<U>))
        // Accounts
        .route(
            "/accounts",
            post(handlers::create_account::<U>).get(handlers::list_accounts::<U>),
        )
        .route(
            "/accounts/{id}",
            get(handlers::get_account::<U>)
                .patch(handlers::update_account::<U>)
                .delete(handlers::delete_account::<U>),
        )
        .route("/accounts/{id}/entries", get(handlers::list_entries::<U>))
        // Transfers
        .route("/transfers", post(handlers::create_transfer::<U>))
        .route("/transfers/{id}", get(handlers::get_transfer::<U>))
        .with_state(state)
        // Stateless, added after with_state
        .route("/api-docs/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(openapi::ApiDoc::openapi())
}

/// Start HTTP Gateway server, until Ctrl-C
pub async fn run_server<U: UnitOfWork + 'static>(
    config: &GatewayConfig,
    state: Arc<AppState<U>>,
) -> anyhow::Result<()> {
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", addr, e))?;

    tracing::info!("Gateway listening on http://{}", addr);
    tracing::info!("API Docs: http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
