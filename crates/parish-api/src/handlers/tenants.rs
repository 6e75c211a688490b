// ============================================================================
// Parish API - Tenant Handlers
// File: crates/parish-api/src/handlers/tenants.rs
// ============================================================================

use axum::extract::State;
use serde::{Deserialize, Serialize};

use parish_core::Tenant;

use crate::extractors::JsonBody;
use crate::response::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct VerifyTenantRequest {
    pub verification_key: String,
}

#[derive(Debug, Serialize)]
pub struct TenantSummary {
    pub name: String,
    pub display_name: String,
    pub active: bool,
}

impl From<Tenant> for TenantSummary {
    fn from(tenant: Tenant) -> Self {
        Self {
            name: tenant.name.to_string(),
            display_name: tenant.display_name,
            active: tenant.status.is_active(),
        }
    }
}

/// Verify handler - POST /api/v1/tenants/verify
///
/// Reports inactive tenants rather than rejecting them.
pub async fn verify(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<VerifyTenantRequest>,
) -> ApiResult<TenantSummary> {
    let tenant = state.tenants.lookup_by_key(&payload.verification_key).await?;
    Ok(ApiResponse::ok(tenant.into()))
}
