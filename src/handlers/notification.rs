use axum::{extract::State, Json};
use std::sync::Arc;
use tracing::info;

use crate::models::{NotificationRequest, NotificationResponse};
use crate::AppState;

/// Broadcast a notification to every connected notification client
pub async fn send_notification(
    State(app_state): State<Arc<AppState>>,
    Json(notification): Json<NotificationRequest>,
) -> Json<NotificationResponse> {
    let report = app_state.hub.broadcast(&notification.message).await;
    info!("Notification sent to {} listeners", report.delivered);

    Json(NotificationResponse {
        status: "Notification sent".to_string(),
        message: notification.message,
    })
}
