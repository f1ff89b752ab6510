use crate::{
    handlers::{diagnostics, health_check, ready_check},
    AppState,
};
use axum::{routing::get, Router};
use std::sync::Arc;

/// Operational routes, mounted under `/api`
pub fn create_api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
        .route("/v1/diagnostics", get(diagnostics))
}
