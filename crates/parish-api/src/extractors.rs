//! Custom Axum extractors

use axum::extract::{FromRequest, FromRequestParts};
use axum::http::request::Parts;

use parish_core::{ActiveTenant, DomainError, ObligationKind};

use crate::error::ApiError;
use crate::state::AppState;

pub const TENANT_KEY_HEADER: &str = "x-tenant-key";
pub const TENANT_NAME_HEADER: &str = "x-tenant-name";

/// Active tenant resolved from the request headers.
///
/// When `x-tenant-name` is present it must name the tenant the key belongs to.
pub struct CurrentTenant(pub ActiveTenant);

impl FromRequestParts<AppState> for CurrentTenant {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let key = header(parts, TENANT_KEY_HEADER)?.ok_or(DomainError::TenantNotFound)?;

        let tenant = match header(parts, TENANT_NAME_HEADER)? {
            Some(claimed) => state.tenants.resolve_claimed(key, claimed).await?,
            None => state.tenants.resolve_by_key(key).await?,
        };
        Ok(Self(tenant))
    }
}

fn header<'a>(parts: &'a Parts, name: &str) -> Result<Option<&'a str>, ApiError> {
    match parts.headers.get(name) {
        None => Ok(None),
        Some(value) => value
            .to_str()
            .map(Some)
            .map_err(|_| ApiError::BadRequest(format!("{} must be visible ASCII", name))),
    }
}

pub fn parse_kind(raw: &str) -> Result<ObligationKind, ApiError> {
    ObligationKind::from_str(raw)
        .ok_or_else(|| ApiError::BadRequest(format!("unknown obligation kind {:?}", raw)))
}

/// `Json` whose rejection is reported through the [`ApiError`] envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// `Path` whose rejection is reported through the [`ApiError`] envelope.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct PathParams<T>(pub T);

/// `Query` whose rejection is reported through the [`ApiError`] envelope.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct QueryParams<T>(pub T);
