//! Response envelope shared by every endpoint
//!
//! Successful calls carry `data`, failed ones carry `error`; never both.

use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::ApiError;

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    pub timestamp: DateTime<Utc>,
}

/// Machine-readable `code` (e.g. `TENANT_INACTIVE`) plus a human message.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
        })
    }
}

impl ApiResponse<()> {
    pub fn failure(code: &'static str, message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ErrorBody { code, message }),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_omits_error() {
        let Json(body) = ApiResponse::ok(vec![1, 2]);
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["data"], serde_json::json!([1, 2]));
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_failure_omits_data() {
        let value = serde_json::to_value(ApiResponse::failure("POOL_CLOSED", "closed".into())).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["error"]["code"], "POOL_CLOSED");
        assert!(value.get("data").is_none());
        assert!(value["timestamp"].is_string());
    }
}
