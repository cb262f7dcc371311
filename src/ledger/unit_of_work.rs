//! Unit-of-Work Executor
//!
//! Runs a sequence of [`LedgerStore`] calls as one all-or-nothing
//! transaction against the backing store.
//!
//! # Outcomes
//!
//! ```text
//! begin ─▶ op ─Ok─▶ commit ─Ok──▶ Ok(value)
//!           │          └─Err─▶ CommitFailed            (fatal)
//!           └─Err─▶ rollback ─Ok──▶ Err(op error, unchanged)
//!                       └─Err─▶ RollbackFailed          (fatal)
//! ```
//!
//! Dropping the future returned by [`execute_tx`] before it completes drops
//! the open transaction, which both backends treat as a rollback.
//! Independent invocations share nothing in-process; they only contend on
//! the backing store's row locks.

use async_trait::async_trait;
use futures::future::BoxFuture;

use super::error::{LedgerError, Result};
use super::store::LedgerStore;

/// An open transaction
#[async_trait]
pub trait LedgerTx: LedgerStore + Sized {
    async fn commit(self) -> Result<()>;

    async fn rollback(self) -> Result<()>;
}

/// A backing store able to open transactions
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    type Tx: LedgerTx + 'static;

    async fn begin(&self) -> Result<Self::Tx>;

    /// Cheap liveness probe
    async fn ping(&self) -> Result<()>;
}

/// Future returned by a unit-of-work operation, borrowing the transaction
pub type TxFuture<'t, T> = BoxFuture<'t, Result<T>>;

/// Execute `op` in a single transaction.
///
/// The error of a failed `op` is returned unchanged once the rollback has
/// succeeded. No retries happen here.
///
/// ```ignore
/// let account = execute_tx(&store, |tx| tx.get_account(id)).await?;
/// ```
pub async fn execute_tx<U, T, F>(store: &U, op: F) -> Result<T>
where
    U: UnitOfWork,
    T: Send,
    F: for<'t> FnOnce(&'t mut U::Tx) -> TxFuture<'t, T> + Send,
{
    let mut tx = store.begin().await?;

    match op(&mut tx).await {
        Ok(value) => {
            tx.commit()
                .await
                .map_err(|e| LedgerError::CommitFailed(Box::new(e)))?;
            Ok(value)
        }
        Err(err) => match tx.rollback().await {
            Ok(()) => Err(err),
            Err(rollback_err) => {
                tracing::error!(
                    code = err.code(),
                    error = %err,
                    rollback_error = %rollback_err,
                    "Rollback failed"
                );
                Err(LedgerError::RollbackFailed {
                    cause: Box::new(err),
                    rollback: Box::new(rollback_err),
                })
            }
        },
    }
}
