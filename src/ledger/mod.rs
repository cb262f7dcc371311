//! Ledger Store
//!
//! Accounts, entries and transfers, the primitives that read and write them,
//! and the unit of work that groups those primitives into one transaction.
//!
//! # Backends
//!
//! - [`PgLedger`]: PostgreSQL via sqlx, row-level locks from `UPDATE`.
//! - [`MemoryLedger`]: in-process tables with per-account async row locks,
//!   same isolation behaviour, used for embedding and tests.

pub mod error;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;
pub mod unit_of_work;
pub mod validation;

pub use error::LedgerError;
pub use memory::MemoryLedger;
pub use models::{
    Account, AddAccountBalanceParams, CreateAccountParams, CreateEntryParams,
    CreateTransferParams, Entry, ListAccountsParams, ListEntriesParams, ListTransfersParams,
    Transfer, UpdateAccountParams,
};
pub use postgres::PgLedger;
pub use store::LedgerStore;
pub use unit_of_work::{LedgerTx, TxFuture, UnitOfWork, execute_tx};
