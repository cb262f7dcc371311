//! Account handlers (CRUD, entry history)

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
};

use super::super::state::AppState;
use super::super::types::{
    ApiResult, CreateAccountRequest, DeletedAccount, PageQuery, UpdateAccountRequest, created, ok,
};
use crate::core_types::AccountId;
use crate::ledger::{
    Account, CreateAccountParams, Entry, ListAccountsParams, ListEntriesParams, LedgerStore,
    UnitOfWork, UpdateAccountParams, execute_tx,
};

/// Open an account with zero balance
///
/// POST /accounts
#[utoipa::path(
    post,
    path = "/accounts",
    request_body = CreateAccountRequest,
    responses(
        (status = 201, description = "Account created", body = Account, content_type = "application/json"),
        (status = 400, description = "Invalid owner or currency")
    ),
    tag = "Account"
)]
pub async fn create_account<U: UnitOfWork>(
    State(state): State<Arc<AppState<U>>>,
    Json(req): Json<CreateAccountRequest>,
) -> ApiResult<Account> {
    let params = CreateAccountParams {
        owner: req.owner,
        balance: 0,
        currency: req.currency,
    };

    let account = execute_tx(&*state.store, |tx| {
        Box::pin(async move { tx.create_account(&params).await })
    })
    .await?;

    tracing::info!(account_id = account.id, owner = %account.owner, "Account created");
    created(account)
}

/// GET /accounts/{id}
#[utoipa::path(
    get,
    path = "/accounts/{id}",
    params(("id" = i64, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Account", body = Account, content_type = "application/json"),
        (status = 404, description = "Account not found")
    ),
    tag = "Account"
)]
pub async fn get_account<U: UnitOfWork>(
    State(state): State<Arc<AppState<U>>>,
    Path(id): Path<AccountId>,
) -> ApiResult<Account> {
    let account = execute_tx(&*state.store, |tx| tx.get_account(id)).await?;
    ok(account)
}

/// GET /accounts?limit=&offset=
#[utoipa::path(
    get,
    path = "/accounts",
    params(PageQuery),
    responses(
        (status = 200, description = "Accounts ordered by id", body = [Account], content_type = "application/json"),
        (status = 400, description = "Invalid page")
    ),
    tag = "Account"
)]
pub async fn list_accounts<U: UnitOfWork>(
    State(state): State<Arc<AppState<U>>>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Vec<Account>> {
    let params = ListAccountsParams {
        limit: page.limit,
        offset: page.offset,
    };

    let accounts = execute_tx(&*state.store, |tx| {
        Box::pin(async move { tx.list_accounts(&params).await })
    })
    .await?;
    ok(accounts)
}

/// Overwrite an account balance
///
/// PATCH /accounts/{id}
#[utoipa::path(
    patch,
    path = "/accounts/{id}",
    params(("id" = i64, Path, description = "Account ID")),
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Updated account", body = Account, content_type = "application/json"),
        (status = 404, description = "Account not found")
    ),
    tag = "Account"
)]
pub async fn update_account<U: UnitOfWork>(
    State(state): State<Arc<AppState<U>>>,
    Path(id): Path<AccountId>,
    Json(req): Json<UpdateAccountRequest>,
) -> ApiResult<Account> {
    let params = UpdateAccountParams {
        id,
        balance: req.balance,
    };

    let account = execute_tx(&*state.store, |tx| {
        Box::pin(async move { tx.update_account(&params).await })
    })
    .await?;

    tracing::info!(account_id = id, balance = account.balance, "Account balance set");
    ok(account)
}

/// DELETE /accounts/{id}
#[utoipa::path(
    delete,
    path = "/accounts/{id}",
    params(("id" = i64, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Account deleted", body = DeletedAccount, content_type = "application/json"),
        (status = 400, description = "Account still has entries or transfers"),
        (status = 404, description = "Account not found")
    ),
    tag = "Account"
)]
pub async fn delete_account<U: UnitOfWork>(
    State(state): State<Arc<AppState<U>>>,
    Path(id): Path<AccountId>,
) -> ApiResult<DeletedAccount> {
    execute_tx(&*state.store, |tx| tx.delete_account(id)).await?;

    tracing::info!(account_id = id, "Account deleted");
    ok(DeletedAccount { id })
}

/// Entry history of one account, oldest first
///
/// GET /accounts/{id}/entries?limit=&offset=
#[utoipa::path(
    get,
    path = "/accounts/{id}/entries",
    params(("id" = i64, Path, description = "Account ID"), PageQuery),
    responses(
        (status = 200, description = "Entries ordered by id", body = [Entry], content_type = "application/json"),
        (status = 404, description = "Account not found")
    ),
    tag = "Account"
)]
pub async fn list_entries<U: UnitOfWork>(
    State(state): State<Arc<AppState<U>>>,
    Path(id): Path<AccountId>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Vec<Entry>> {
    let params = ListEntriesParams {
        account_id: id,
        limit: page.limit,
        offset: page.offset,
    };

    let entries = execute_tx(&*state.store, |tx| {
        Box::pin(async move {
            // 404 for an unknown account rather than an empty page
            tx.get_account(params.account_id).await?;
            tx.list_entries(&params).await
        })
    })
    .await?;
    ok(entries)
}
