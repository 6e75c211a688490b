//! Liveness and pool occupancy - GET /health

use axum::{extract::State, Json};
use serde::Serialize;

use parish_infrastructure::PoolStats;

use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: String,
    pub pools: Vec<PoolStats>,
}

pub async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    ApiResponse::ok(HealthResponse {
        status: "ok",
        service: state.config.app.name.clone(),
        pools: state.registry.stats(),
    })
}
