//! Ledger Error Types
//!
//! One taxonomy for the store, the unit of work and the transfer engine:
//! validation, not-found, transient store errors and fatal commit/rollback
//! failures.

use thiserror::Error;

use crate::core_types::{AccountId, Amount, EntryId, TransferId};

/// PostgreSQL SQLSTATE codes the caller may retry on
mod sqlstate {
    pub const SERIALIZATION_FAILURE: &str = "40001";
    pub const DEADLOCK_DETECTED: &str = "40P01";
    pub const LOCK_NOT_AVAILABLE: &str = "55P03";
    pub const FOREIGN_KEY_VIOLATION: &str = "23503";
}

#[derive(Error, Debug)]
pub enum LedgerError {
    // === Validation Errors ===
    #[error("Source and destination account are the same: {0}")]
    SameAccount(AccountId),

    #[error("Amount must be greater than zero, got {0}")]
    InvalidAmount(Amount),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Currency mismatch: account {from_account_id} is {from}, account {to_account_id} is {to}")]
    CurrencyMismatch {
        from_account_id: AccountId,
        from: String,
        to_account_id: AccountId,
        to: String,
    },

    #[error("Insufficient balance on account {account_id}: balance would become {balance}")]
    InsufficientBalance { account_id: AccountId, balance: Amount },

    // === Not Found ===
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("Entry not found: {0}")]
    EntryNotFound(EntryId),

    #[error("Transfer not found: {0}")]
    TransferNotFound(TransferId),

    // === Store Errors ===
    /// Lock timeout, deadlock or serialization failure. Retry is the
    /// caller's decision.
    #[error("Transient store error: {0}")]
    Transient(String),

    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("Store error: {0}")]
    Store(String),

    // === Fatal ===
    #[error("Commit failed: {0}")]
    CommitFailed(#[source] Box<LedgerError>),

    #[error("Rollback failed ({rollback}) after: {cause}")]
    RollbackFailed {
        #[source]
        cause: Box<LedgerError>,
        rollback: Box<LedgerError>,
    },
}

impl LedgerError {
    /// Stable error code for API responses and logs
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::SameAccount(_) => "SAME_ACCOUNT",
            LedgerError::InvalidAmount(_) => "INVALID_AMOUNT",
            LedgerError::InvalidParameter(_) => "INVALID_PARAMETER",
            LedgerError::CurrencyMismatch { .. } => "CURRENCY_MISMATCH",
            LedgerError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            LedgerError::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            LedgerError::EntryNotFound(_) => "ENTRY_NOT_FOUND",
            LedgerError::TransferNotFound(_) => "TRANSFER_NOT_FOUND",
            LedgerError::Transient(_) => "TRANSIENT",
            LedgerError::Database(_) => "DATABASE_ERROR",
            LedgerError::Store(_) => "STORE_ERROR",
            LedgerError::CommitFailed(_) => "COMMIT_FAILED",
            LedgerError::RollbackFailed { .. } => "ROLLBACK_FAILED",
        }
    }

    /// Business-rule rejection; nothing was committed
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            LedgerError::SameAccount(_)
                | LedgerError::InvalidAmount(_)
                | LedgerError::InvalidParameter(_)
                | LedgerError::CurrencyMismatch { .. }
                | LedgerError::InsufficientBalance { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            LedgerError::AccountNotFound(_)
                | LedgerError::EntryNotFound(_)
                | LedgerError::TransferNotFound(_)
        )
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::Transient(_))
    }

    /// The unit of work could not be finished cleanly; state of the
    /// backing store must be checked before anything else happens.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            LedgerError::CommitFailed(_) | LedgerError::RollbackFailed { .. }
        )
    }

    /// Map a failed entry/transfer insert: a foreign-key violation means
    /// the referenced account does not exist.
    pub(crate) fn from_insert(err: sqlx::Error, referenced: impl Fn(&str) -> AccountId) -> Self {
        match foreign_key_violation(&err) {
            Some(constraint) => LedgerError::AccountNotFound(referenced(&constraint)),
            None => LedgerError::from(err),
        }
    }
}

/// Name of the violated constraint, if `err` is a foreign-key violation
pub(crate) fn foreign_key_violation(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db_err)
            if db_err.code().as_deref() == Some(sqlstate::FOREIGN_KEY_VIOLATION) =>
        {
            Some(db_err.constraint().unwrap_or_default().to_string())
        }
        _ => None,
    }
}

impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        let transient = match &err {
            sqlx::Error::Database(db_err) => matches!(
                db_err.code().as_deref(),
                Some(
                    sqlstate::SERIALIZATION_FAILURE
                        | sqlstate::DEADLOCK_DETECTED
                        | sqlstate::LOCK_NOT_AVAILABLE
                )
            ),
            sqlx::Error::PoolTimedOut => true,
            _ => false,
        };
        if transient {
            LedgerError::Transient(err.to_string())
        } else {
            LedgerError::Database(err)
        }
    }
}

pub type Result<T, E = LedgerError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(LedgerError::SameAccount(1).code(), "SAME_ACCOUNT");
        assert_eq!(LedgerError::InvalidAmount(0).code(), "INVALID_AMOUNT");
        assert_eq!(LedgerError::AccountNotFound(7).code(), "ACCOUNT_NOT_FOUND");
        assert_eq!(LedgerError::Transient("x".into()).code(), "TRANSIENT");
        assert_eq!(
            LedgerError::CommitFailed(Box::new(LedgerError::Store("io".into()))).code(),
            "COMMIT_FAILED"
        );
    }

    #[test]
    fn test_classification() {
        assert!(LedgerError::SameAccount(1).is_validation());
        assert!(LedgerError::InvalidAmount(-5).is_validation());
        assert!(!LedgerError::SameAccount(1).is_retryable());

        assert!(LedgerError::TransferNotFound(3).is_not_found());
        assert!(!LedgerError::TransferNotFound(3).is_fatal());

        assert!(LedgerError::Transient("lock timeout".into()).is_retryable());
        assert!(!LedgerError::Transient("lock timeout".into()).is_fatal());

        let rollback = LedgerError::RollbackFailed {
            cause: Box::new(LedgerError::AccountNotFound(2)),
            rollback: Box::new(LedgerError::Store("connection reset".into())),
        };
        assert!(rollback.is_fatal());
        assert!(!rollback.is_retryable());
    }

    #[test]
    fn test_rollback_failed_keeps_cause() {
        let err = LedgerError::RollbackFailed {
            cause: Box::new(LedgerError::AccountNotFound(2)),
            rollback: Box::new(LedgerError::Store("connection reset".into())),
        };
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("Account not found: 2"));
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_sqlx_row_not_found_is_database_error() {
        let err = LedgerError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.code(), "DATABASE_ERROR");
        assert!(LedgerError::from(sqlx::Error::PoolTimedOut).is_retryable());
    }
}
