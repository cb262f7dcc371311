//! Transfer handlers

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};

use super::super::state::AppState;
use super::super::types::{ApiResult, created, ok};
use crate::core_types::TransferId;
use crate::ledger::{LedgerStore, Transfer, UnitOfWork, execute_tx};
use crate::transfer::{TransferTxParams, TransferTxResult};

/// Move money between two accounts
///
/// POST /transfers
///
/// Transient failures (lock timeout, deadlock) answer 409 and are safe to
/// retry; nothing was written.
#[utoipa::path(
    post,
    path = "/transfers",
    request_body = TransferTxParams,
    responses(
        (status = 201, description = "Transfer committed", body = TransferTxResult, content_type = "application/json"),
        (status = 400, description = "Same account, non-positive amount or currency mismatch"),
        (status = 404, description = "Account not found"),
        (status = 409, description = "Insufficient balance or transient conflict")
    ),
    tag = "Transfer"
)]
pub async fn create_transfer<U: UnitOfWork>(
    State(state): State<Arc<AppState<U>>>,
    Json(req): Json<TransferTxParams>,
) -> ApiResult<TransferTxResult> {
    let result = state.engine.transfer_tx(req).await?;
    created(result)
}

/// GET /transfers/{id}
#[utoipa::path(
    get,
    path = "/transfers/{id}",
    params(("id" = i64, Path, description = "Transfer ID")),
    responses(
        (status = 200, description = "Transfer", body = Transfer, content_type = "application/json"),
        (status = 404, description = "Transfer not found")
    ),
    tag = "Transfer"
)]
pub async fn get_transfer<U: UnitOfWork>(
    State(state): State<Arc<AppState<U>>>,
    Path(id): Path<TransferId>,
) -> ApiResult<Transfer> {
    let transfer = execute_tx(&*state.store, |tx| tx.get_transfer(id)).await?;
    ok(transfer)
}
