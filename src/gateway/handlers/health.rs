//! Health check handler

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::state::AppState;
use super::super::types::{ApiError, ApiResponse};

/// Health check response data
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "UP")]
    pub status: String,
    /// `postgres` or `memory`
    #[schema(example = "memory")]
    pub store: String,
    #[schema(example = 1703494800000_i64)]
    pub timestamp_ms: i64,
}

/// Health check endpoint
///
/// Pings PostgreSQL when the ledger is stored there. The error is logged
/// but not exposed.
#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse, content_type = "application/json"),
        (status = 503, description = "Store unreachable")
    ),
    tag = "System"
)]
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<ApiResponse<HealthResponse>>), ApiError> {
    let store = match state.database {
        Some(ref db) => {
            if let Err(e) = db.health_check().await {
                tracing::error!(error = %e, "[HEALTH] PostgreSQL ping failed");
                return Err(ApiError::service_unavailable("unavailable"));
            }
            "postgres"
        }
        None => "memory",
    };

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(HealthResponse {
            status: "UP".to_string(),
            store: store.to_string(),
            timestamp_ms: Utc::now().timestamp_millis(),
        })),
    ))
}
