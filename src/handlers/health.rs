use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::models::{ApiError, ErrorResponse, HealthResponse};
use crate::AppState;

/// Liveness greeting kept for clients that poll `/`
pub async fn root() -> Json<Value> {
    Json(json!({ "Hello": "World" }))
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    debug!("Health check requested");
    Json(HealthResponse::ok("Server is running"))
}

/// Readiness check endpoint, fails while the message store is unreachable
pub async fn ready_check(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<HealthResponse>, ApiError> {
    debug!("Readiness check requested");
    if app_state.store.is_ready().await {
        Ok(Json(HealthResponse::ok("Service is ready")))
    } else {
        warn!("Readiness check failed: message store unavailable");
        Err(ErrorResponse::with_status(
            StatusCode::SERVICE_UNAVAILABLE,
            "Message store unavailable",
        ))
    }
}
