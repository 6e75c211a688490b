//! Maps domain errors and extractor rejections onto HTTP responses

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use parish_core::DomainError;

use crate::response::ApiResponse;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A body, path or query string that could not be extracted. Keeps the
    /// status axum chose (400, 415, 422).
    #[error("Invalid request: {message}")]
    Rejected { status: StatusCode, message: String },
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl ApiError {
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Rejected { status, .. } => (*status, "INVALID_REQUEST"),
            ApiError::Domain(err) => match err {
                DomainError::TenantNotFound => (StatusCode::NOT_FOUND, "TENANT_NOT_FOUND"),
                DomainError::ObligationNotFound(_) => (StatusCode::NOT_FOUND, "OBLIGATION_NOT_FOUND"),
                DomainError::TenantInactive(_) => (StatusCode::FORBIDDEN, "TENANT_INACTIVE"),
                DomainError::TenantMismatch(_) => (StatusCode::BAD_REQUEST, "TENANT_MISMATCH"),
                DomainError::InvalidTenantName(_) => (StatusCode::BAD_REQUEST, "INVALID_TENANT_NAME"),
                DomainError::InvalidObligationData(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
                DomainError::InvalidPeriod(_) => (StatusCode::BAD_REQUEST, "INVALID_PERIOD"),
                DomainError::PoolExhausted { .. } => (StatusCode::SERVICE_UNAVAILABLE, "POOL_EXHAUSTED"),
                DomainError::PoolClosed { .. } => (StatusCode::SERVICE_UNAVAILABLE, "POOL_CLOSED"),
                DomainError::PoolConstructionFailed { .. } => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "POOL_CONSTRUCTION_FAILED")
                }
                DomainError::PersistenceFailure(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "PERSISTENCE_FAILURE")
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(code, "Request failed: {}", self);
        } else {
            tracing::warn!(code, "Request rejected: {}", self);
        }

        // Internal details stay in the log
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(ApiResponse::failure(code, message))).into_response()
    }
}
