use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::{debug, error};

use crate::models::{ApiError, ChatMessage, ErrorResponse};
use crate::AppState;

/// Every stored message of a group, oldest first
pub async fn group_messages(
    State(app_state): State<Arc<AppState>>,
    Path(group_id): Path<String>,
) -> Result<Json<Vec<ChatMessage>>, ApiError> {
    match app_state.store.query_ordered(&group_id).await {
        Ok(messages) => {
            debug!("Returning {} messages for group '{}'", messages.len(), group_id);
            Ok(Json(messages))
        }
        Err(e) => {
            error!("Failed to load history for group '{}': {}", group_id, e);
            Err(ErrorResponse::with_status(
                StatusCode::SERVICE_UNAVAILABLE,
                format!("History for group '{}' is unavailable", group_id),
            ))
        }
    }
}
