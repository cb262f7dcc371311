//! Ledger Store primitives
//!
//! Point reads and writes on accounts, entries and transfers. Every method
//! runs inside the unit of work that owns `self`; nothing is visible to
//! other units of work before commit.

use async_trait::async_trait;

use super::error::Result;
use super::models::{
    Account, AddAccountBalanceParams, CreateAccountParams, CreateEntryParams,
    CreateTransferParams, Entry, ListAccountsParams, ListEntriesParams, ListTransfersParams,
    Transfer, UpdateAccountParams,
};
use crate::core_types::{AccountId, EntryId, TransferId};

#[async_trait]
pub trait LedgerStore: Send {
    // === Accounts ===

    async fn create_account(&mut self, params: &CreateAccountParams) -> Result<Account>;

    /// Plain read, takes no row lock
    async fn get_account(&mut self, id: AccountId) -> Result<Account>;

    /// Read that takes the account's row lock until the unit of work ends
    async fn get_account_for_update(&mut self, id: AccountId) -> Result<Account>;

    async fn list_accounts(&mut self, params: &ListAccountsParams) -> Result<Vec<Account>>;

    async fn update_account(&mut self, params: &UpdateAccountParams) -> Result<Account>;

    async fn delete_account(&mut self, id: AccountId) -> Result<()>;

    /// `balance = balance + amount` as one atomic read-modify-write.
    ///
    /// Takes the row lock and returns the row as updated. Never implement
    /// this as a read followed by a separate write.
    async fn add_account_balance(&mut self, params: &AddAccountBalanceParams) -> Result<Account>;

    // === Entries ===

    async fn create_entry(&mut self, params: &CreateEntryParams) -> Result<Entry>;

    async fn get_entry(&mut self, id: EntryId) -> Result<Entry>;

    async fn list_entries(&mut self, params: &ListEntriesParams) -> Result<Vec<Entry>>;

    // === Transfers ===

    async fn create_transfer(&mut self, params: &CreateTransferParams) -> Result<Transfer>;

    async fn get_transfer(&mut self, id: TransferId) -> Result<Transfer>;

    async fn list_transfers(&mut self, params: &ListTransfersParams) -> Result<Vec<Transfer>>;
}
