//! Request bodies and query strings

use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::core_types::Amount;

/// `POST /accounts`. New accounts start at zero.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateAccountRequest {
    #[schema(example = "alice")]
    pub owner: String,
    #[schema(example = "USD")]
    pub currency: String,
}

/// `PATCH /accounts/{id}`
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub struct UpdateAccountRequest {
    pub balance: Amount,
}

/// `?limit=&offset=`
#[derive(Debug, Clone, Copy, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// 1..=100, default 10
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    10
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            offset: 0,
        }
    }
}
