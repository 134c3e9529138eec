//! API response envelope and structured errors
//!
//! - `ApiResponse<T>`: success wrapper
//! - `ApiError`: failure payload with a correlation id
//! - `error_codes`: codes produced by the gateway itself

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::LedgerError;

// ============================================================================
// Unified API Response Format
// ============================================================================

/// Unified API response wrapper
///
/// - code: 0 = success
/// - msg: short message description
/// - data: the resource
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    #[schema(example = 0)]
    pub code: i32,
    #[schema(example = "ok")]
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: 0,
            msg: "ok".to_string(),
            data: Some(data),
        }
    }
}

pub type ApiResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;

/// 200 OK with `data`
pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok((StatusCode::OK, Json(ApiResponse::success(data))))
}

/// 201 Created with `data`
pub fn created<T>(data: T) -> ApiResult<T> {
    Ok((StatusCode::CREATED, Json(ApiResponse::success(data))))
}

// ============================================================================
// Errors
// ============================================================================

/// Error codes raised by the gateway before a request reaches the ledger.
/// Ledger failures carry `LedgerError::code()`.
pub mod error_codes {
    pub const VALIDATION_FAILED: &str = "VALIDATION_FAILED";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const SERVICE_UNAVAILABLE: &str = "SERVICE_UNAVAILABLE";
    pub const UNKNOWN_ERROR: &str = "UNKNOWN_ERROR";
}

const UNKNOWN_ERROR_MESSAGE: &str = "An unexpected error occurred, please retry later";

/// Body of every failed request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Quote this when reporting a problem
    pub correlation_id: String,
    #[schema(example = "INSUFFICIENT_FUNDS")]
    pub code: String,
    pub message: String,
    /// Field-level violations
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                correlation_id: Uuid::new_v4().to_string(),
                code: code.to_string(),
                message: message.into(),
                errors: Vec::new(),
            },
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            error_codes::VALIDATION_FAILED,
            message,
        )
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, error_codes::NOT_FOUND, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            error_codes::SERVICE_UNAVAILABLE,
            message,
        )
    }

    /// Request validation failure listing every violated constraint.
    pub fn validation(errors: Vec<String>) -> Self {
        let mut err = Self::bad_request("Validation failed");
        err.body.errors = errors;
        err
    }

    pub fn correlation_id(&self) -> &str {
        &self.body.correlation_id
    }

    pub fn into_err<T>(self) -> Result<T, ApiError> {
        Err(self)
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        let status =
            StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if !err.is_business() {
            let api_err = Self::new(status, error_codes::UNKNOWN_ERROR, UNKNOWN_ERROR_MESSAGE);
            error!(
                correlation_id = %api_err.correlation_id(),
                code = err.code(),
                error = %err,
                "Request failed"
            );
            return api_err;
        }

        match err {
            LedgerError::ValidationFailed(errors) => {
                let mut api_err = Self::new(status, error_codes::VALIDATION_FAILED, "Validation failed");
                api_err.body.errors = errors;
                api_err
            }
            other => Self::new(status, other.code(), other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
