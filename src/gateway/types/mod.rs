//! Gateway types module
//!
//! ## Input Types
//! - [`CreateAccountRequest`], [`UpdateAccountRequest`], [`PageQuery`]
//!
//! ## Output Types
//! - [`ApiResponse<T>`]: Unified API response wrapper
//! - [`ApiError`]: Error response with HTTP status

pub mod request;
pub mod response;

pub use request::{CreateAccountRequest, PageQuery, UpdateAccountRequest};
pub use response::{
    ApiError, ApiResponse, ApiResult, DeletedAccount, created, error_codes, ok,
};
