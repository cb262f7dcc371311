//! Input validation for account creation and list queries
//!
//! Checks run before a unit of work is opened, so a rejected request never
//! touches the backing store.

use super::error::LedgerError;
use super::models::{
    CreateAccountParams, ListAccountsParams, ListEntriesParams, ListTransfersParams,
    MAX_PAGE_SIZE,
};

/// Validation errors for ledger inputs
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ValidationError {
    #[error("Invalid length for {field}: expected {min}-{max}, got {actual}")]
    InvalidLength {
        field: &'static str,
        min: usize,
        max: usize,
        actual: usize,
    },

    #[error("Invalid format for {field}: '{value}' (expected: {expected})")]
    InvalidFormat {
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("Invalid page: limit must be 1-{max}, offset >= 0 (got limit={limit}, offset={offset})")]
    InvalidPage { limit: i64, offset: i64, max: i64 },
}

impl From<ValidationError> for LedgerError {
    fn from(err: ValidationError) -> Self {
        LedgerError::InvalidParameter(err.to_string())
    }
}

const OWNER_MAX_LEN: usize = 64;

/// ISO 4217 currency code: exactly 3 upper-case ASCII letters
///
/// # Examples
/// ```
/// use simplebank::ledger::validation::validate_currency;
///
/// assert!(validate_currency("USD").is_ok());
/// assert!(validate_currency("usd").is_err());
/// ```
pub fn validate_currency(code: &str) -> Result<(), ValidationError> {
    if code.len() != 3 {
        return Err(ValidationError::InvalidLength {
            field: "currency",
            min: 3,
            max: 3,
            actual: code.len(),
        });
    }

    if !code.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(ValidationError::InvalidFormat {
            field: "currency",
            value: code.to_string(),
            expected: "^[A-Z]{3}$",
        });
    }

    Ok(())
}

pub fn validate_owner(owner: &str) -> Result<(), ValidationError> {
    let trimmed = owner.trim();
    if trimmed.is_empty() || owner.len() > OWNER_MAX_LEN {
        return Err(ValidationError::InvalidLength {
            field: "owner",
            min: 1,
            max: OWNER_MAX_LEN,
            actual: trimmed.len(),
        });
    }
    Ok(())
}

pub fn validate_page(limit: i64, offset: i64) -> Result<(), ValidationError> {
    if !(1..=MAX_PAGE_SIZE).contains(&limit) || offset < 0 {
        return Err(ValidationError::InvalidPage {
            limit,
            offset,
            max: MAX_PAGE_SIZE,
        });
    }
    Ok(())
}

impl CreateAccountParams {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_owner(&self.owner)?;
        validate_currency(&self.currency)
    }
}

impl ListAccountsParams {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_page(self.limit, self.offset)
    }
}

impl ListEntriesParams {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_page(self.limit, self.offset)
    }
}

impl ListTransfersParams {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_page(self.limit, self.offset)
    }
}
