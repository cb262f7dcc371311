//! Simple Bank - banking ledger backend
//!
//! Accounts, immutable ledger entries and atomic money transfers.
//!
//! # Modules
//!
//! - [`core_types`] - Identifier and amount aliases
//! - [`config`] - YAML application config
//! - [`logging`] - tracing subscriber setup
//! - [`db`] - PostgreSQL pool and schema bootstrap
//! - [`ledger`] - Ledger store, unit of work, PostgreSQL and in-process backends
//! - [`transfer`] - Transfer engine (deadlock-free, all-or-nothing)
//! - [`gateway`] - HTTP API
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use simplebank::{MemoryLedger, TransferEngine, TransferTxParams};
//!
//! # async fn run() -> Result<(), simplebank::LedgerError> {
//! let engine = TransferEngine::new(Arc::new(MemoryLedger::new()));
//! let result = engine
//!     .transfer_tx(TransferTxParams { from_account_id: 1, to_account_id: 2, amount: 10 })
//!     .await?;
//! println!("from balance: {}", result.from_account.balance);
//! # Ok(())
//! # }
//! ```

// Core types - must be first!
pub mod core_types;

pub mod config;
pub mod db;
pub mod gateway;
pub mod ledger;
pub mod logging;
pub mod transfer;

// Convenient re-exports at crate root
pub use core_types::{AccountId, Amount, EntryId, TransferId};
pub use ledger::{
    Account, Entry, LedgerError, LedgerStore, LedgerTx, MemoryLedger, PgLedger, Transfer,
    UnitOfWork, execute_tx,
};
pub use transfer::{TransferEngine, TransferPolicy, TransferTxParams, TransferTxResult};
