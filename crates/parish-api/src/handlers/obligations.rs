// ============================================================================
// Parish API - Obligation Handlers
// File: crates/parish-api/src/handlers/obligations.rs
// ============================================================================

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use parish_core::{CashMovementInput, Obligation, ObligationInput, StatusFilter};

use crate::error::ApiError;
use crate::extractors::{parse_kind, CurrentTenant, JsonBody, PathParams, QueryParams};
use crate::response::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterObligationRequest {
    #[serde(flatten)]
    pub obligation: ObligationInput,
    #[serde(default)]
    pub movement: Option<CashMovementInput>,
}

/// GET /api/v1/obligations/{kind}?status=
pub async fn list(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    PathParams(kind): PathParams<String>,
    QueryParams(query): QueryParams<ListQuery>,
) -> ApiResult<Vec<Obligation>> {
    let kind = parse_kind(&kind)?;
    let filter = StatusFilter::parse(query.status.as_deref())?;
    let obligations = state.obligations.list(&tenant, kind, filter).await?;
    Ok(ApiResponse::ok(obligations))
}

/// GET /api/v1/obligations/{kind}/{id}
pub async fn get(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    PathParams((kind, id)): PathParams<(String, i64)>,
) -> ApiResult<Obligation> {
    let kind = parse_kind(&kind)?;
    let obligation = state.obligations.get(&tenant, kind, id).await?;
    Ok(ApiResponse::ok(obligation))
}

/// POST /api/v1/obligations/{kind}
pub async fn register(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    PathParams(kind): PathParams<String>,
    JsonBody(payload): JsonBody<RegisterObligationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Obligation>>), ApiError> {
    let kind = parse_kind(&kind)?;
    let obligation = state
        .obligations
        .register(&tenant, kind, &payload.obligation, payload.movement.as_ref())
        .await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(obligation)))
}

/// PUT /api/v1/obligations/{kind}/{id}
pub async fn update(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    PathParams((kind, id)): PathParams<(String, i64)>,
    JsonBody(payload): JsonBody<ObligationInput>,
) -> ApiResult<Obligation> {
    let kind = parse_kind(&kind)?;
    let obligation = state.obligations.update(&tenant, kind, id, &payload).await?;
    Ok(ApiResponse::ok(obligation))
}

/// DELETE /api/v1/obligations/{kind}/{id}
pub async fn delete(
    State(state): State<AppState>,
    CurrentTenant(tenant): CurrentTenant,
    PathParams((kind, id)): PathParams<(String, i64)>,
) -> Result<StatusCode, ApiError> {
    let kind = parse_kind(&kind)?;
    state.obligations.delete(&tenant, kind, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
