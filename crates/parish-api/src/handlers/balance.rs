//! Monthly cash balance - GET /api/v1/balance?year=&month=

use axum::extract::State;
use serde::Deserialize;

use parish_core::MonthlyBalance;

use crate::extractors::{CurrentTenant, QueryParams};
use crate::response::{ApiResponse, ApiResult};
use crate::state::AppState;

/// Either field left out falls back to the current month.
#[derive(Debug, Deserialize)]
pub struct BalanceQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

pub async fn monthly(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    QueryParams(query): QueryParams<BalanceQuery>,
) -> ApiResult<MonthlyBalance> {
    let balance = state
        .balances
        .monthly_balance(&tenant, query.year, query.month)
        .await?;
    Ok(ApiResponse::ok(balance))
}
