//! Transfer request and result types

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core_types::{AccountId, Amount};
use crate::ledger::{Account, Entry, Transfer};

/// Move `amount` from `from_account_id` to `to_account_id`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TransferTxParams {
    pub from_account_id: AccountId,
    pub to_account_id: AccountId,
    /// Positive, minor currency units
    pub amount: Amount,
}

/// Everything a committed transfer wrote, with post-update account
/// snapshots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TransferTxResult {
    pub transfer: Transfer,
    pub from_account: Account,
    pub to_account: Account,
    pub from_entry: Entry,
    pub to_entry: Entry,
}

/// Configurable preconditions checked inside every transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferPolicy {
    /// When false, a debit leaving the source balance below zero fails with
    /// `InsufficientBalance`
    pub allow_overdraft: bool,
    /// When true, both accounts must hold the same currency
    pub require_same_currency: bool,
}

impl Default for TransferPolicy {
    fn default() -> Self {
        Self {
            allow_overdraft: true,
            require_same_currency: false,
        }
    }
}

impl From<&crate::config::TransferConfig> for TransferPolicy {
    fn from(config: &crate::config::TransferConfig) -> Self {
        Self {
            allow_overdraft: config.allow_overdraft,
            require_same_currency: config.require_same_currency,
        }
    }
}

/// One balance change issued by a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceAdjustment {
    pub account_id: AccountId,
    pub delta: Amount,
}
