//! In-process ledger backend
//!
//! Behaves like the PostgreSQL backend under `READ COMMITTED`:
//!
//! - Committed rows live in [`Tables`] behind a mutex that is only held for
//!   short, non-async critical sections.
//! - Each account has an async row lock. `get_account_for_update`,
//!   `add_account_balance`, `update_account` and `delete_account` take it and
//!   keep it until the transaction ends.
//! - Each account also has a key lock standing in for the foreign-key check.
//!   `create_entry` and `create_transfer` hold it shared, `delete_account`
//!   holds it exclusive. Shared holders never wait on the row lock, so balance
//!   updates and inserts referencing the same account do not block each other.
//! - Writes are staged per transaction and applied in one critical section
//!   at commit, before the row locks are released. Dropping a transaction
//!   discards its staged writes and releases its locks.
//! - A row-lock wait longer than `lock_timeout` fails with
//!   [`LedgerError::Transient`], the in-process equivalent of PostgreSQL's
//!   deadlock detector.
//! - Identifiers come from sequences that are never rolled back.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::{
    OwnedMutexGuard, OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock,
};
use tracing::debug;

use super::error::{LedgerError, Result};
use super::models::{
    Account, AddAccountBalanceParams, CreateAccountParams, CreateEntryParams,
    CreateTransferParams, Entry, ListAccountsParams, ListEntriesParams, ListTransfersParams,
    Transfer, UpdateAccountParams,
};
use super::store::LedgerStore;
use super::unit_of_work::{LedgerTx, UnitOfWork};
use crate::core_types::{AccountId, EntryId, TransferId};

/// Default upper bound on a single row-lock wait
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Default)]
struct Tables {
    accounts: BTreeMap<AccountId, Account>,
    entries: BTreeMap<EntryId, Entry>,
    transfers: BTreeMap<TransferId, Transfer>,
}

#[derive(Default)]
struct Faults {
    fail_entry_for: Option<AccountId>,
    fail_commit: bool,
    fail_rollback: bool,
    fail_ping: bool,
}

struct Shared {
    tables: Mutex<Tables>,
    row_locks: DashMap<AccountId, Arc<tokio::sync::Mutex<()>>>,
    key_locks: DashMap<AccountId, Arc<RwLock<()>>>,
    lock_timeout: Duration,
    next_account_id: AtomicI64,
    next_entry_id: AtomicI64,
    next_transfer_id: AtomicI64,
    transactions_started: AtomicU64,
    faults: Mutex<Faults>,
}

impl Shared {
    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn faults(&self) -> MutexGuard<'_, Faults> {
        self.faults.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// In-process ledger. Clones share the same tables and locks.
#[derive(Clone)]
pub struct MemoryLedger {
    shared: Arc<Shared>,
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::with_lock_timeout(DEFAULT_LOCK_TIMEOUT)
    }

    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                tables: Mutex::new(Tables::default()),
                row_locks: DashMap::new(),
                key_locks: DashMap::new(),
                lock_timeout,
                next_account_id: AtomicI64::new(1),
                next_entry_id: AtomicI64::new(1),
                next_transfer_id: AtomicI64::new(1),
                transactions_started: AtomicU64::new(0),
                faults: Mutex::new(Faults::default()),
            }),
        }
    }

    /// Make every `create_entry` for `account_id` fail
    pub fn set_fail_entry_for(&self, account_id: Option<AccountId>) {
        self.shared.faults().fail_entry_for = account_id;
    }

    pub fn set_fail_commit(&self, fail: bool) {
        self.shared.faults().fail_commit = fail;
    }

    pub fn set_fail_rollback(&self, fail: bool) {
        self.shared.faults().fail_rollback = fail;
    }

    pub fn set_fail_ping(&self, fail: bool) {
        self.shared.faults().fail_ping = fail;
    }

    /// Number of transactions opened so far
    pub fn transactions_started(&self) -> u64 {
        self.shared.transactions_started.load(Ordering::SeqCst)
    }

    /// Committed row counts: (accounts, entries, transfers)
    pub fn row_counts(&self) -> (usize, usize, usize) {
        let tables = self.shared.tables();
        (
            tables.accounts.len(),
            tables.entries.len(),
            tables.transfers.len(),
        )
    }
}

#[async_trait]
impl UnitOfWork for MemoryLedger {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx> {
        self.shared
            .transactions_started
            .fetch_add(1, Ordering::SeqCst);
        Ok(MemoryTx {
            shared: Arc::clone(&self.shared),
            held: HashMap::new(),
            keys: HashMap::new(),
            staged: Staged::default(),
        })
    }

    async fn ping(&self) -> Result<()> {
        if self.shared.faults().fail_ping {
            return Err(LedgerError::Store("injected ping failure".to_string()));
        }
        Ok(())
    }
}

/// Writes not yet visible outside their transaction
#[derive(Default)]
struct Staged {
    /// Full row images of created or modified accounts
    accounts: BTreeMap<AccountId, Account>,
    deleted_accounts: BTreeSet<AccountId>,
    entries: BTreeMap<EntryId, Entry>,
    transfers: BTreeMap<TransferId, Transfer>,
}

#[allow(dead_code)]
enum KeyGuard {
    Shared(OwnedRwLockReadGuard<()>),
    Exclusive(OwnedRwLockWriteGuard<()>),
}

/// Open in-process transaction
pub struct MemoryTx {
    shared: Arc<Shared>,
    held: HashMap<AccountId, OwnedMutexGuard<()>>,
    keys: HashMap<AccountId, KeyGuard>,
    staged: Staged,
}

impl MemoryTx {
    fn lock_timeout_error(&self, id: AccountId) -> LedgerError {
        debug!(account_id = id, "Row lock wait timed out");
        LedgerError::Transient(format!(
            "lock timeout after {:?} waiting for account {}",
            self.shared.lock_timeout, id
        ))
    }

    /// Shared key lock, held by rows that reference `id`
    async fn share_key(&mut self, id: AccountId) -> Result<()> {
        if self.keys.contains_key(&id) {
            return Ok(());
        }

        let key_lock = Arc::clone(&self.shared.key_locks.entry(id).or_default());
        match tokio::time::timeout(self.shared.lock_timeout, key_lock.read_owned()).await {
            Ok(guard) => {
                self.keys.insert(id, KeyGuard::Shared(guard));
                Ok(())
            }
            Err(_) => Err(self.lock_timeout_error(id)),
        }
    }

    /// Exclusive key lock, waits for every transaction referencing `id`
    async fn claim_key(&mut self, id: AccountId) -> Result<()> {
        if matches!(self.keys.get(&id), Some(KeyGuard::Exclusive(_))) {
            return Ok(());
        }
        // a shared guard of our own would block the upgrade
        self.keys.remove(&id);

        let key_lock = Arc::clone(&self.shared.key_locks.entry(id).or_default());
        match tokio::time::timeout(self.shared.lock_timeout, key_lock.write_owned()).await {
            Ok(guard) => {
                self.keys.insert(id, KeyGuard::Exclusive(guard));
                Ok(())
            }
            Err(_) => Err(self.lock_timeout_error(id)),
        }
    }

    async fn lock_row(&mut self, id: AccountId) -> Result<()> {
        if self.held.contains_key(&id) {
            return Ok(());
        }

        let row_lock = Arc::clone(&self.shared.row_locks.entry(id).or_default());
        match tokio::time::timeout(self.shared.lock_timeout, row_lock.lock_owned()).await {
            Ok(guard) => {
                self.held.insert(id, guard);
                Ok(())
            }
            Err(_) => Err(self.lock_timeout_error(id)),
        }
    }

    /// Own staged writes first, then committed state
    fn read_account(&self, id: AccountId) -> Result<Account> {
        if self.staged.deleted_accounts.contains(&id) {
            return Err(LedgerError::AccountNotFound(id));
        }
        if let Some(account) = self.staged.accounts.get(&id) {
            return Ok(account.clone());
        }
        self.shared
            .tables()
            .accounts
            .get(&id)
            .cloned()
            .ok_or(LedgerError::AccountNotFound(id))
    }

    fn account_exists(&self, id: AccountId) -> bool {
        self.read_account(id).is_ok()
    }

    fn is_referenced(&self, id: AccountId) -> bool {
        let touches = |t: &Transfer| t.from_account_id == id || t.to_account_id == id;
        if self.staged.entries.values().any(|e| e.account_id == id)
            || self.staged.transfers.values().any(touches)
        {
            return true;
        }
        let tables = self.shared.tables();
        tables.entries.values().any(|e| e.account_id == id)
            || tables.transfers.values().any(touches)
    }

    fn ensure_unreferenced(&self, id: AccountId) -> Result<()> {
        if self.is_referenced(id) {
            return Err(LedgerError::InvalidParameter(format!(
                "account {} still has entries or transfers",
                id
            )));
        }
        Ok(())
    }

    fn visible_accounts(&self) -> Vec<Account> {
        let mut merged = self.shared.tables().accounts.clone();
        merged.extend(self.staged.accounts.clone());
        merged
            .into_values()
            .filter(|a| !self.staged.deleted_accounts.contains(&a.id))
            .collect()
    }

    fn visible_entries(&self) -> Vec<Entry> {
        let mut merged = self.shared.tables().entries.clone();
        merged.extend(self.staged.entries.clone());
        merged.into_values().collect()
    }

    fn visible_transfers(&self) -> Vec<Transfer> {
        let mut merged = self.shared.tables().transfers.clone();
        merged.extend(self.staged.transfers.clone());
        merged.into_values().collect()
    }

    fn apply(&mut self) {
        let staged = std::mem::take(&mut self.staged);
        let mut tables = self.shared.tables();
        tables.accounts.extend(staged.accounts);
        for id in &staged.deleted_accounts {
            tables.accounts.remove(id);
        }
        tables.entries.extend(staged.entries);
        tables.transfers.extend(staged.transfers);
    }
}

fn page<T>(rows: Vec<T>, limit: i64, offset: i64) -> Vec<T> {
    rows.into_iter()
        .skip(offset as usize)
        .take(limit as usize)
        .collect()
}

#[async_trait]
impl LedgerStore for MemoryTx {
    async fn create_account(&mut self, params: &CreateAccountParams) -> Result<Account> {
        params.validate()?;
        let account = Account {
            id: self.shared.next_account_id.fetch_add(1, Ordering::SeqCst),
            owner: params.owner.clone(),
            balance: params.balance,
            currency: params.currency.clone(),
            created_at: Utc::now(),
        };
        self.staged.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn get_account(&mut self, id: AccountId) -> Result<Account> {
        self.read_account(id)
    }

    async fn get_account_for_update(&mut self, id: AccountId) -> Result<Account> {
        self.lock_row(id).await?;
        self.read_account(id)
    }

    async fn list_accounts(&mut self, params: &ListAccountsParams) -> Result<Vec<Account>> {
        params.validate()?;
        Ok(page(self.visible_accounts(), params.limit, params.offset))
    }

    async fn update_account(&mut self, params: &UpdateAccountParams) -> Result<Account> {
        self.lock_row(params.id).await?;
        let mut account = self.read_account(params.id)?;
        account.balance = params.balance;
        self.staged.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn delete_account(&mut self, id: AccountId) -> Result<()> {
        self.lock_row(id).await?;
        self.read_account(id)?;
        // Own staged references first: they hold a shared key guard
        self.ensure_unreferenced(id)?;
        self.claim_key(id).await?;
        self.read_account(id)?;
        self.ensure_unreferenced(id)?;
        self.staged.accounts.remove(&id);
        self.staged.deleted_accounts.insert(id);
        Ok(())
    }

    async fn add_account_balance(&mut self, params: &AddAccountBalanceParams) -> Result<Account> {
        self.lock_row(params.id).await?;
        let mut account = self.read_account(params.id)?;
        account.balance = account.balance.checked_add(params.amount).ok_or_else(|| {
            LedgerError::InvalidParameter(format!("balance overflow on account {}", params.id))
        })?;
        self.staged.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn create_entry(&mut self, params: &CreateEntryParams) -> Result<Entry> {
        if self.shared.faults().fail_entry_for == Some(params.account_id) {
            return Err(LedgerError::Store(format!(
                "injected failure creating entry for account {}",
                params.account_id
            )));
        }
        self.share_key(params.account_id).await?;
        if !self.account_exists(params.account_id) {
            return Err(LedgerError::AccountNotFound(params.account_id));
        }
        let entry = Entry {
            id: self.shared.next_entry_id.fetch_add(1, Ordering::SeqCst),
            account_id: params.account_id,
            amount: params.amount,
            created_at: Utc::now(),
        };
        self.staged.entries.insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn get_entry(&mut self, id: EntryId) -> Result<Entry> {
        if let Some(entry) = self.staged.entries.get(&id) {
            return Ok(entry.clone());
        }
        self.shared
            .tables()
            .entries
            .get(&id)
            .cloned()
            .ok_or(LedgerError::EntryNotFound(id))
    }

    async fn list_entries(&mut self, params: &ListEntriesParams) -> Result<Vec<Entry>> {
        params.validate()?;
        let rows = self
            .visible_entries()
            .into_iter()
            .filter(|e| e.account_id == params.account_id)
            .collect();
        Ok(page(rows, params.limit, params.offset))
    }

    async fn create_transfer(&mut self, params: &CreateTransferParams) -> Result<Transfer> {
        for id in [params.from_account_id, params.to_account_id] {
            self.share_key(id).await?;
            if !self.account_exists(id) {
                return Err(LedgerError::AccountNotFound(id));
            }
        }
        let transfer = Transfer {
            id: self.shared.next_transfer_id.fetch_add(1, Ordering::SeqCst),
            from_account_id: params.from_account_id,
            to_account_id: params.to_account_id,
            amount: params.amount,
            created_at: Utc::now(),
        };
        self.staged.transfers.insert(transfer.id, transfer.clone());
        Ok(transfer)
    }

    async fn get_transfer(&mut self, id: TransferId) -> Result<Transfer> {
        if let Some(transfer) = self.staged.transfers.get(&id) {
            return Ok(transfer.clone());
        }
        self.shared
            .tables()
            .transfers
            .get(&id)
            .cloned()
            .ok_or(LedgerError::TransferNotFound(id))
    }

    async fn list_transfers(&mut self, params: &ListTransfersParams) -> Result<Vec<Transfer>> {
        params.validate()?;
        let rows = self
            .visible_transfers()
            .into_iter()
            .filter(|t| {
                t.from_account_id == params.from_account_id
                    || t.to_account_id == params.to_account_id
            })
            .collect();
        Ok(page(rows, params.limit, params.offset))
    }
}

#[async_trait]
impl LedgerTx for MemoryTx {
    async fn commit(self) -> Result<()> {
        if self.shared.faults().fail_commit {
            return Err(LedgerError::Store("injected commit failure".to_string()));
        }
        let mut tx = self;
        // Apply while still holding the row locks
        tx.apply();
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        if self.shared.faults().fail_rollback {
            return Err(LedgerError::Store("injected rollback failure".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::unit_of_work::execute_tx;

    fn usd(owner: &str, balance: i64) -> CreateAccountParams {
        CreateAccountParams {
            owner: owner.to_string(),
            balance,
            currency: "USD".to_string(),
        }
    }

    async fn seed(ledger: &MemoryLedger, balance: i64) -> Account {
        let params = usd("seed", balance);
        execute_tx(ledger, |tx| {
            Box::pin(async move { tx.create_account(&params).await })
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_uncommitted_writes_are_invisible() {
        let ledger = MemoryLedger::new();
        let account = seed(&ledger, 100).await;

        let mut tx = ledger.begin().await.unwrap();
        let updated = tx
            .add_account_balance(&AddAccountBalanceParams {
                id: account.id,
                amount: -30,
            })
            .await
            .unwrap();
        assert_eq!(updated.balance, 70);
        // read-your-writes inside the transaction
        assert_eq!(tx.get_account(account.id).await.unwrap().balance, 70);

        let mut other = ledger.begin().await.unwrap();
        assert_eq!(other.get_account(account.id).await.unwrap().balance, 100);

        tx.commit().await.unwrap();
        assert_eq!(other.get_account(account.id).await.unwrap().balance, 70);
    }

    #[tokio::test]
    async fn test_drop_discards_and_releases_lock() {
        let ledger = MemoryLedger::with_lock_timeout(Duration::from_millis(200));
        let account = seed(&ledger, 100).await;

        let mut tx = ledger.begin().await.unwrap();
        tx.get_account_for_update(account.id).await.unwrap();
        tx.add_account_balance(&AddAccountBalanceParams {
            id: account.id,
            amount: 5,
        })
        .await
        .unwrap();
        drop(tx);

        let mut next = ledger.begin().await.unwrap();
        let locked = next.get_account_for_update(account.id).await.unwrap();
        assert_eq!(locked.balance, 100);
    }

    #[tokio::test]
    async fn test_lock_wait_times_out_as_transient() {
        let ledger = MemoryLedger::with_lock_timeout(Duration::from_millis(50));
        let account = seed(&ledger, 10).await;

        let mut holder = ledger.begin().await.unwrap();
        holder.get_account_for_update(account.id).await.unwrap();

        let mut waiter = ledger.begin().await.unwrap();
        let err = waiter
            .add_account_balance(&AddAccountBalanceParams {
                id: account.id,
                amount: 1,
            })
            .await
            .unwrap_err();
        assert!(err.is_retryable(), "got {err:?}");
    }

    #[tokio::test]
    async fn test_entry_requires_existing_account() {
        let ledger = MemoryLedger::new();
        let mut tx = ledger.begin().await.unwrap();
        let err = tx
            .create_entry(&CreateEntryParams {
                account_id: 42,
                amount: 10,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::AccountNotFound(42)));
    }

    #[tokio::test]
    async fn test_delete_referenced_account_is_rejected() {
        let ledger = MemoryLedger::new();
        let account = seed(&ledger, 10).await;
        let id = account.id;

        execute_tx(&ledger, |tx| {
            Box::pin(async move {
                tx.create_entry(&CreateEntryParams {
                    account_id: id,
                    amount: 3,
                })
                .await
            })
        })
        .await
        .unwrap();

        let err = execute_tx(&ledger, |tx| tx.delete_account(id))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_PARAMETER");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_entry_waits_for_pending_delete_then_fails() {
        let ledger = MemoryLedger::new();
        let account = seed(&ledger, 0).await;
        let id = account.id;

        let mut deleter = ledger.begin().await.unwrap();
        deleter.delete_account(id).await.unwrap();

        let writer = ledger.clone();
        let insert = tokio::spawn(async move {
            execute_tx(&writer, |tx| {
                Box::pin(async move {
                    tx.create_entry(&CreateEntryParams {
                        account_id: id,
                        amount: 5,
                    })
                    .await
                })
            })
            .await
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!insert.is_finished(), "insert must wait for the delete");

        deleter.commit().await.unwrap();
        let err = insert.await.unwrap().unwrap_err();
        assert!(matches!(err, LedgerError::AccountNotFound(missing) if missing == id));
        assert_eq!(ledger.row_counts(), (0, 0, 0));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_delete_waits_for_pending_transfer_then_fails() {
        let ledger = MemoryLedger::new();
        let from = seed(&ledger, 10).await.id;
        let to = seed(&ledger, 10).await.id;

        let mut writer = ledger.begin().await.unwrap();
        writer
            .create_transfer(&CreateTransferParams {
                from_account_id: from,
                to_account_id: to,
                amount: 1,
            })
            .await
            .unwrap();

        let deleter = ledger.clone();
        let delete =
            tokio::spawn(async move { execute_tx(&deleter, |tx| tx.delete_account(to)).await });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!delete.is_finished(), "delete must wait for the insert");

        writer.commit().await.unwrap();
        let err = delete.await.unwrap().unwrap_err();
        assert_eq!(err.code(), "INVALID_PARAMETER");
        assert_eq!(ledger.row_counts(), (2, 0, 1));
    }

    #[tokio::test]
    async fn test_key_lock_does_not_block_balance_updates() {
        let ledger = MemoryLedger::with_lock_timeout(Duration::from_millis(50));
        let account = seed(&ledger, 10).await;

        let mut inserter = ledger.begin().await.unwrap();
        inserter
            .create_entry(&CreateEntryParams {
                account_id: account.id,
                amount: 1,
            })
            .await
            .unwrap();

        let mut updater = ledger.begin().await.unwrap();
        let updated = updater
            .add_account_balance(&AddAccountBalanceParams {
                id: account.id,
                amount: 1,
            })
            .await
            .unwrap();
        assert_eq!(updated.balance, 11);
    }

    #[tokio::test]
    async fn test_ids_are_not_reused_after_rollback() {
        let ledger = MemoryLedger::new();
        let mut tx = ledger.begin().await.unwrap();
        let first = tx.create_account(&usd("a", 1)).await.unwrap();
        tx.rollback().await.unwrap();

        let second = seed(&ledger, 1).await;
        assert!(second.id > first.id);
        assert_eq!(ledger.row_counts(), (1, 0, 0));
    }
}
