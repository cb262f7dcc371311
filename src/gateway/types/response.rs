//! API Response types and error codes
//!
//! - `ApiResponse<T>`: Unified response wrapper
//! - `error_codes`: Standard error code constants
//! - `ApiError`: Error half of every handler result

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::core_types::AccountId;
use crate::ledger::LedgerError;

// ============================================================================
// Unified API Response Format
// ============================================================================

/// Unified API response wrapper
///
/// All API responses follow this structure:
/// - code: 0 = success, non-zero = error code
/// - msg: short message description
/// - data: actual data (success) or null (error)
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response code: 0 for success, non-zero for errors
    #[schema(example = 0)]
    pub code: i32,
    /// Response message
    #[schema(example = "ok")]
    pub msg: String,
    /// Response data (only present when code == 0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Create success response
    pub fn success(data: T) -> Self {
        Self {
            code: error_codes::SUCCESS,
            msg: "ok".to_string(),
            data: Some(data),
        }
    }

    /// Create error response
    pub fn error(code: i32, msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            code,
            msg: msg.into(),
            data: None,
        }
    }
}

// ============================================================================
// Response DTOs
// ============================================================================

/// Returned by `DELETE /accounts/{id}`
#[derive(Debug, Serialize, ToSchema)]
pub struct DeletedAccount {
    pub id: AccountId,
}

// ============================================================================
// Error Codes
// ============================================================================

/// Standard API error codes
pub mod error_codes {
    // Success
    pub const SUCCESS: i32 = 0;

    // Client errors (1xxx)
    pub const INVALID_PARAMETER: i32 = 1001;
    pub const INSUFFICIENT_BALANCE: i32 = 1002;
    pub const SAME_ACCOUNT: i32 = 1003;
    pub const INVALID_AMOUNT: i32 = 1004;
    pub const CURRENCY_MISMATCH: i32 = 1005;

    // Resource errors (4xxx)
    pub const ACCOUNT_NOT_FOUND: i32 = 4001;
    pub const ENTRY_NOT_FOUND: i32 = 4002;
    pub const TRANSFER_NOT_FOUND: i32 = 4003;
    pub const CONFLICT: i32 = 4090;

    // Server errors (5xxx)
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const SERVICE_UNAVAILABLE: i32 = 5001;
}

// ============================================================================
// Errors
// ============================================================================

/// Handler error: HTTP status plus the envelope's `code` and `msg`
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: i32,
    pub msg: String,
}

pub type ApiResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;

/// 200 with `data`
pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok((StatusCode::OK, Json(ApiResponse::success(data))))
}

/// 201 with `data`
pub fn created<T>(data: T) -> ApiResult<T> {
    Ok((StatusCode::CREATED, Json(ApiResponse::success(data))))
}

impl ApiError {
    pub fn new(status: StatusCode, code: i32, msg: impl Into<String>) -> Self {
        Self {
            status,
            code,
            msg: msg.into(),
        }
    }

    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            error_codes::SERVICE_UNAVAILABLE,
            msg,
        )
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            error_codes::INTERNAL_ERROR,
            msg,
        )
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        let (status, code) = match &err {
            LedgerError::SameAccount(_) => (StatusCode::BAD_REQUEST, error_codes::SAME_ACCOUNT),
            LedgerError::InvalidAmount(_) => {
                (StatusCode::BAD_REQUEST, error_codes::INVALID_AMOUNT)
            }
            LedgerError::InvalidParameter(_) => {
                (StatusCode::BAD_REQUEST, error_codes::INVALID_PARAMETER)
            }
            LedgerError::CurrencyMismatch { .. } => {
                (StatusCode::BAD_REQUEST, error_codes::CURRENCY_MISMATCH)
            }
            LedgerError::InsufficientBalance { .. } => {
                (StatusCode::CONFLICT, error_codes::INSUFFICIENT_BALANCE)
            }
            LedgerError::AccountNotFound(_) => {
                (StatusCode::NOT_FOUND, error_codes::ACCOUNT_NOT_FOUND)
            }
            LedgerError::EntryNotFound(_) => (StatusCode::NOT_FOUND, error_codes::ENTRY_NOT_FOUND),
            LedgerError::TransferNotFound(_) => {
                (StatusCode::NOT_FOUND, error_codes::TRANSFER_NOT_FOUND)
            }
            LedgerError::Transient(_) => (StatusCode::CONFLICT, error_codes::CONFLICT),
            LedgerError::Database(_)
            | LedgerError::Store(_)
            | LedgerError::CommitFailed(_)
            | LedgerError::RollbackFailed { .. } => {
                // Store internals stay in the log
                tracing::error!(code = err.code(), error = %err, "Request failed");
                return ApiError::internal("internal error");
            }
        };

        ApiError::new(status, code, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiResponse::<()>::error(self.code, self.msg);
        (self.status, Json(body)).into_response()
    }
}
