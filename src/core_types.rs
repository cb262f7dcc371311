//! Core types used throughout the system
//!
//! Identifiers mirror PostgreSQL `BIGSERIAL` keys, amounts are signed
//! minor currency units (cents for USD).

/// Account ID - primary key of `accounts`.
///
/// # Constraints:
/// - **Immutable**: Once assigned, NEVER changes
/// - **Totally ordered**: The transfer engine acquires balance row locks
///   in ascending `AccountId` order, whatever the transfer direction
pub type AccountId = i64;

/// Entry ID - primary key of `entries`
pub type EntryId = i64;

/// Transfer ID - primary key of `transfers`
pub type TransferId = i64;

/// Signed amount in minor currency units.
///
/// Negative values are debits, positive values are credits.
pub type Amount = i64;
