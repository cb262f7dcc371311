//! Transfer Engine
//!
//! The one business operation that touches more than one row:
//! `transfer_tx` writes a transfer, two entries and two balance updates
//! as a single unit of work.
//!
//! # Safety Invariants
//!
//! 1. **All-or-nothing**: the five writes commit together or not at all
//! 2. **Atomic adjust**: balances change through `add_account_balance`,
//!    never read-then-write
//! 3. **Lock ordering**: balance rows are locked in ascending account id
//! 4. **No hidden retries**: every failure reaches the caller unchanged

pub mod engine;
pub mod types;

pub use engine::{TransferEngine, balance_adjustments, validate};
pub use types::{BalanceAdjustment, TransferPolicy, TransferTxParams, TransferTxResult};
