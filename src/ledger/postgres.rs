//! PostgreSQL ledger backend
//!
//! Each unit of work is one `sqlx::Transaction`. Balance changes are a
//! single `UPDATE … RETURNING`, which takes the row lock and returns the
//! new balance atomically; the lock is held until commit or rollback.
//! `lock_timeout` is set per transaction so a lock wait can never hang a
//! caller forever.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use super::error::{LedgerError, Result, foreign_key_violation};
use super::models::{
    Account, AddAccountBalanceParams, CreateAccountParams, CreateEntryParams,
    CreateTransferParams, Entry, ListAccountsParams, ListEntriesParams, ListTransfersParams,
    Transfer, UpdateAccountParams,
};
use super::store::LedgerStore;
use super::unit_of_work::{LedgerTx, UnitOfWork};
use crate::core_types::{AccountId, EntryId, TransferId};

/// PostgreSQL-backed ledger
#[derive(Clone)]
pub struct PgLedger {
    pool: PgPool,
    lock_timeout: Duration,
}

impl PgLedger {
    pub fn new(pool: PgPool, lock_timeout: Duration) -> Self {
        Self { pool, lock_timeout }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UnitOfWork for PgLedger {
    type Tx = PgTx;

    async fn begin(&self) -> Result<PgTx> {
        let mut tx = self.pool.begin().await?;
        // SET does not take bind parameters
        let set_lock_timeout = format!(
            "SET LOCAL lock_timeout = '{}ms'",
            self.lock_timeout.as_millis()
        );
        sqlx::query(&set_lock_timeout).execute(&mut *tx).await?;
        Ok(PgTx { tx })
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Open PostgreSQL transaction. Dropping it without commit rolls back.
pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerStore for PgTx {
    async fn create_account(&mut self, params: &CreateAccountParams) -> Result<Account> {
        params.validate()?;
        let account = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (owner, balance, currency)
            VALUES ($1, $2, $3)
            RETURNING id, owner, balance, currency, created_at
            "#,
        )
        .bind(&params.owner)
        .bind(params.balance)
        .bind(&params.currency)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(account)
    }

    async fn get_account(&mut self, id: AccountId) -> Result<Account> {
        sqlx::query_as::<_, Account>(
            "SELECT id, owner, balance, currency, created_at FROM accounts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or(LedgerError::AccountNotFound(id))
    }

    async fn get_account_for_update(&mut self, id: AccountId) -> Result<Account> {
        // NO KEY UPDATE: does not conflict with the KEY SHARE lock taken by
        // foreign-key checks of concurrent entry/transfer inserts
        sqlx::query_as::<_, Account>(
            r#"
            SELECT id, owner, balance, currency, created_at FROM accounts
            WHERE id = $1
            FOR NO KEY UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or(LedgerError::AccountNotFound(id))
    }

    async fn list_accounts(&mut self, params: &ListAccountsParams) -> Result<Vec<Account>> {
        params.validate()?;
        let accounts = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, owner, balance, currency, created_at FROM accounts
            ORDER BY id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(params.limit)
        .bind(params.offset)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(accounts)
    }

    async fn update_account(&mut self, params: &UpdateAccountParams) -> Result<Account> {
        sqlx::query_as::<_, Account>(
            r#"
            UPDATE accounts SET balance = $2
            WHERE id = $1
            RETURNING id, owner, balance, currency, created_at
            "#,
        )
        .bind(params.id)
        .bind(params.balance)
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or(LedgerError::AccountNotFound(params.id))
    }

    async fn delete_account(&mut self, id: AccountId) -> Result<()> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| match foreign_key_violation(&e) {
                Some(_) => LedgerError::InvalidParameter(format!(
                    "account {} still has entries or transfers",
                    id
                )),
                None => LedgerError::from(e),
            })?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::AccountNotFound(id));
        }
        Ok(())
    }

    async fn add_account_balance(&mut self, params: &AddAccountBalanceParams) -> Result<Account> {
        sqlx::query_as::<_, Account>(
            r#"
            UPDATE accounts SET balance = balance + $1
            WHERE id = $2
            RETURNING id, owner, balance, currency, created_at
            "#,
        )
        .bind(params.amount)
        .bind(params.id)
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or(LedgerError::AccountNotFound(params.id))
    }

    async fn create_entry(&mut self, params: &CreateEntryParams) -> Result<Entry> {
        sqlx::query_as::<_, Entry>(
            r#"
            INSERT INTO entries (account_id, amount)
            VALUES ($1, $2)
            RETURNING id, account_id, amount, created_at
            "#,
        )
        .bind(params.account_id)
        .bind(params.amount)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| LedgerError::from_insert(e, |_| params.account_id))
    }

    async fn get_entry(&mut self, id: EntryId) -> Result<Entry> {
        sqlx::query_as::<_, Entry>(
            "SELECT id, account_id, amount, created_at FROM entries WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or(LedgerError::EntryNotFound(id))
    }

    async fn list_entries(&mut self, params: &ListEntriesParams) -> Result<Vec<Entry>> {
        params.validate()?;
        let entries = sqlx::query_as::<_, Entry>(
            r#"
            SELECT id, account_id, amount, created_at FROM entries
            WHERE account_id = $1
            ORDER BY id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(params.account_id)
        .bind(params.limit)
        .bind(params.offset)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(entries)
    }

    async fn create_transfer(&mut self, params: &CreateTransferParams) -> Result<Transfer> {
        sqlx::query_as::<_, Transfer>(
            r#"
            INSERT INTO transfers (from_account_id, to_account_id, amount)
            VALUES ($1, $2, $3)
            RETURNING id, from_account_id, to_account_id, amount, created_at
            "#,
        )
        .bind(params.from_account_id)
        .bind(params.to_account_id)
        .bind(params.amount)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| {
            LedgerError::from_insert(e, |constraint| {
                if constraint.contains("to_account") {
                    params.to_account_id
                } else {
                    params.from_account_id
                }
            })
        })
    }

    async fn get_transfer(&mut self, id: TransferId) -> Result<Transfer> {
        sqlx::query_as::<_, Transfer>(
            r#"
            SELECT id, from_account_id, to_account_id, amount, created_at FROM transfers
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or(LedgerError::TransferNotFound(id))
    }

    async fn list_transfers(&mut self, params: &ListTransfersParams) -> Result<Vec<Transfer>> {
        params.validate()?;
        let transfers = sqlx::query_as::<_, Transfer>(
            r#"
            SELECT id, from_account_id, to_account_id, amount, created_at FROM transfers
            WHERE from_account_id = $1 OR to_account_id = $2
            ORDER BY id
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(params.from_account_id)
        .bind(params.to_account_id)
        .bind(params.limit)
        .bind(params.offset)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(transfers)
    }
}

#[async_trait]
impl LedgerTx for PgTx {
    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
