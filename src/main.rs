//! Simple Bank - ledger server
//!
//! ```text
//! ┌──────────┐    ┌──────────┐    ┌──────────┐    ┌──────────┐
//! │ Gateway  │───▶│ Transfer │───▶│  Unit of │───▶│ Postgres │
//! │  (HTTP)  │    │  Engine  │    │   Work   │    │  (sqlx)  │
//! └──────────┘    └──────────┘    └──────────┘    └──────────┘
//! ```
//!
//! Usage: `simplebank [--env dev] [--port 8080]`

use std::sync::Arc;

use anyhow::{Context, Result};

use simplebank::config::AppConfig;
use simplebank::db::{Database, schema};
use simplebank::gateway::{self, state::AppState};
use simplebank::ledger::PgLedger;
use simplebank::logging;
use simplebank::transfer::{TransferEngine, TransferPolicy};

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

#[tokio::main]
async fn main() -> Result<()> {
    let env = get_env();
    let mut app_config = AppConfig::load(&env)?;
    if let Some(port) = get_port_override() {
        app_config.gateway.port = port;
    }
    let _log_guard = logging::init_logging(&app_config);

    tracing::info!("Starting Simple Bank in {} mode", env);

    let db = Database::connect(&app_config.postgres)
        .await
        .context("failed to connect to PostgreSQL")?;
    schema::init_schema(db.pool()).await?;
    tracing::info!("PostgreSQL schema ready");

    let ledger = Arc::new(PgLedger::new(
        db.pool().clone(),
        app_config.postgres.lock_timeout(),
    ));
    let policy = TransferPolicy::from(&app_config.transfer);
    tracing::info!(
        allow_overdraft = policy.allow_overdraft,
        require_same_currency = policy.require_same_currency,
        "Transfer policy"
    );

    let state = Arc::new(AppState::new(TransferEngine::with_policy(ledger, policy)));
    gateway::run_server(&app_config.gateway, state).await
}
