//! HTTP handlers, one module per resource

pub mod account;
pub mod health;
pub mod transfer;

pub use account::{
    create_account, delete_account, get_account, list_accounts, list_entries, update_account,
};
pub use health::{HealthResponse, health_check};
pub use transfer::{create_transfer, get_transfer};

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::Json;
    use axum::extract::{Path, Query, State};
    use axum::http::StatusCode;

    use super::*;
    use crate::gateway::state::AppState;
    use crate::gateway::types::{
        CreateAccountRequest, PageQuery, UpdateAccountRequest, error_codes,
    };
    use crate::ledger::MemoryLedger;
    use crate::transfer::{TransferEngine, TransferTxParams};

    fn state() -> Arc<AppState<MemoryLedger>> {
        let engine = TransferEngine::new(Arc::new(MemoryLedger::new()));
        Arc::new(AppState::new(engine))
    }

    async fn open(state: &Arc<AppState<MemoryLedger>>, owner: &str, balance: i64) -> i64 {
        let (status, Json(body)) = create_account(
            State(state.clone()),
            Json(CreateAccountRequest {
                owner: owner.to_string(),
                currency: "USD".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        let id = body.data.unwrap().id;

        update_account(
            State(state.clone()),
            Path(id),
            Json(UpdateAccountRequest { balance }),
        )
        .await
        .unwrap();
        id
    }

    #[tokio::test]
    async fn test_health_ok() {
        let (status, Json(body)) = health_check(State(state())).await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.code, 0);
        assert!(body.data.unwrap().timestamp_ms > 0);
    }

    #[tokio::test]
    async fn test_health_unavailable_when_store_down() {
        let state = state();
        state.store.set_fail_ping(true);

        let err = health_check(State(state)).await.unwrap_err();
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.code, error_codes::SERVICE_UNAVAILABLE);
        assert_eq!(err.msg, "unavailable");
    }

    #[tokio::test]
    async fn test_account_crud() {
        let state = state();
        let id = open(&state, "alice", 75).await;

        let (_, Json(body)) = get_account(State(state.clone()), Path(id)).await.unwrap();
        let account = body.data.unwrap();
        assert_eq!(account.owner, "alice");
        assert_eq!(account.balance, 75);
        assert_eq!(account.currency, "USD");

        let (_, Json(body)) = list_accounts(State(state.clone()), Query(PageQuery::default()))
            .await
            .unwrap();
        assert_eq!(body.data.unwrap().len(), 1);

        delete_account(State(state.clone()), Path(id)).await.unwrap();
        let err = get_account(State(state.clone()), Path(id)).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.code, error_codes::ACCOUNT_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_account_rejects_bad_currency() {
        let err = create_account(
            State(state()),
            Json(CreateAccountRequest {
                owner: "bob".to_string(),
                currency: "usd".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_accounts_rejects_bad_page() {
        let err = list_accounts(
            State(state()),
            Query(PageQuery {
                limit: 0,
                offset: 0,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_transfer_round_trip() {
        let state = state();
        let x = open(&state, "x", 100).await;
        let y = open(&state, "y", 50).await;

        let (status, Json(body)) = create_transfer(
            State(state.clone()),
            Json(TransferTxParams {
                from_account_id: x,
                to_account_id: y,
                amount: 10,
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        let result = body.data.unwrap();
        assert_eq!(result.from_account.balance, 90);
        assert_eq!(result.to_account.balance, 60);

        let (_, Json(body)) = get_transfer(State(state.clone()), Path(result.transfer.id))
            .await
            .unwrap();
        assert_eq!(body.data.unwrap(), result.transfer);

        let (_, Json(body)) = list_entries(State(state.clone()), Path(x), Query(PageQuery::default()))
            .await
            .unwrap();
        let entries = body.data.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].amount, -10);
    }

    #[tokio::test]
    async fn test_transfer_errors_map_to_status() {
        let state = state();
        let x = open(&state, "x", 100).await;

        let same = create_transfer(
            State(state.clone()),
            Json(TransferTxParams {
                from_account_id: x,
                to_account_id: x,
                amount: 10,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(same.status, StatusCode::BAD_REQUEST);
        assert_eq!(same.code, error_codes::SAME_ACCOUNT);

        let missing = create_transfer(
            State(state.clone()),
            Json(TransferTxParams {
                from_account_id: x,
                to_account_id: x + 1000,
                amount: 10,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(missing.status, StatusCode::NOT_FOUND);

        let err = get_transfer(State(state.clone()), Path(42)).await.unwrap_err();
        assert_eq!(err.code, error_codes::TRANSFER_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_entries_of_unknown_account() {
        let err = list_entries(State(state()), Path(7), Query(PageQuery::default()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
