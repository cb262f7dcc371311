//! Transfer Engine
//!
//! Executes a transfer as one unit of work:
//!
//! ```text
//! validate ─▶ begin ─▶ transfer row ─▶ debit entry ─▶ credit entry
//!                   ─▶ balance(lower id) ─▶ balance(higher id) ─▶ commit
//! ```
//!
//! # Lock ordering
//!
//! `add_account_balance` takes the account's row lock. Both adjustments are
//! issued in ascending account-id order regardless of direction, so two
//! transfers A→B and B→A always queue on the same row first and can never
//! wait on each other in a cycle. Every code path that adjusts more than one
//! balance in a unit of work must go through [`balance_adjustments`].

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::types::{BalanceAdjustment, TransferPolicy, TransferTxParams, TransferTxResult};
use crate::ledger::error::{LedgerError, Result};
use crate::ledger::{
    AddAccountBalanceParams, CreateEntryParams, CreateTransferParams, LedgerStore, UnitOfWork,
    execute_tx,
};

/// Reject inputs that must never open a transaction
pub fn validate(params: &TransferTxParams) -> Result<()> {
    if params.from_account_id == params.to_account_id {
        return Err(LedgerError::SameAccount(params.from_account_id));
    }
    if params.amount <= 0 {
        return Err(LedgerError::InvalidAmount(params.amount));
    }
    Ok(())
}

/// The two balance changes of a transfer, ordered by ascending account id
pub fn balance_adjustments(params: &TransferTxParams) -> [BalanceAdjustment; 2] {
    let debit = BalanceAdjustment {
        account_id: params.from_account_id,
        delta: -params.amount,
    };
    let credit = BalanceAdjustment {
        account_id: params.to_account_id,
        delta: params.amount,
    };

    if debit.account_id < credit.account_id {
        [debit, credit]
    } else {
        [credit, debit]
    }
}

/// Runs transfers against any [`UnitOfWork`] backend.
///
/// Holds no in-process lock: concurrent calls only contend on the backing
/// store's row locks. No retries happen here; a [`LedgerError::Transient`]
/// is for the caller to retry.
pub struct TransferEngine<U> {
    store: Arc<U>,
    policy: TransferPolicy,
}

impl<U> Clone for TransferEngine<U> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            policy: self.policy,
        }
    }
}

impl<U: UnitOfWork> TransferEngine<U> {
    pub fn new(store: Arc<U>) -> Self {
        Self::with_policy(store, TransferPolicy::default())
    }

    pub fn with_policy(store: Arc<U>, policy: TransferPolicy) -> Self {
        Self { store, policy }
    }

    pub fn store(&self) -> &Arc<U> {
        &self.store
    }

    pub fn policy(&self) -> TransferPolicy {
        self.policy
    }

    /// Move `amount` between two accounts atomically.
    ///
    /// Either the transfer row, both entries and both balance updates are
    /// committed together, or nothing is.
    pub async fn transfer_tx(&self, params: TransferTxParams) -> Result<TransferTxResult> {
        validate(&params)?;

        let policy = self.policy;
        debug!(
            from_account_id = params.from_account_id,
            to_account_id = params.to_account_id,
            amount = params.amount,
            "Transfer started"
        );

        let result = execute_tx(&*self.store, |tx| {
            Box::pin(async move { run_transfer(tx, params, policy).await })
        })
        .await;

        match &result {
            Ok(res) => info!(
                transfer_id = res.transfer.id,
                from_account_id = params.from_account_id,
                to_account_id = params.to_account_id,
                amount = params.amount,
                "Transfer committed"
            ),
            Err(e) => warn!(
                from_account_id = params.from_account_id,
                to_account_id = params.to_account_id,
                amount = params.amount,
                code = e.code(),
                error = %e,
                "Transfer failed"
            ),
        }

        result
    }
}

/// Body of the unit of work. Every `?` aborts and rolls back everything.
async fn run_transfer<S: LedgerStore>(
    tx: &mut S,
    params: TransferTxParams,
    policy: TransferPolicy,
) -> Result<TransferTxResult> {
    if policy.require_same_currency {
        let from = tx.get_account(params.from_account_id).await?;
        let to = tx.get_account(params.to_account_id).await?;
        if from.currency != to.currency {
            return Err(LedgerError::CurrencyMismatch {
                from_account_id: from.id,
                from: from.currency,
                to_account_id: to.id,
                to: to.currency,
            });
        }
    }

    let transfer = tx
        .create_transfer(&CreateTransferParams {
            from_account_id: params.from_account_id,
            to_account_id: params.to_account_id,
            amount: params.amount,
        })
        .await?;

    let from_entry = tx
        .create_entry(&CreateEntryParams {
            account_id: params.from_account_id,
            amount: -params.amount,
        })
        .await?;

    let to_entry = tx
        .create_entry(&CreateEntryParams {
            account_id: params.to_account_id,
            amount: params.amount,
        })
        .await?;

    let [first, second] = balance_adjustments(&params);
    let first_account = tx
        .add_account_balance(&AddAccountBalanceParams {
            id: first.account_id,
            amount: first.delta,
        })
        .await?;
    let second_account = tx
        .add_account_balance(&AddAccountBalanceParams {
            id: second.account_id,
            amount: second.delta,
        })
        .await?;

    let (from_account, to_account) = if first.account_id == params.from_account_id {
        (first_account, second_account)
    } else {
        (second_account, first_account)
    };

    if !policy.allow_overdraft && from_account.balance < 0 {
        return Err(LedgerError::InsufficientBalance {
            account_id: from_account.id,
            balance: from_account.balance,
        });
    }

    Ok(TransferTxResult {
        transfer,
        from_account,
        to_account,
        from_entry,
        to_entry,
    })
}
