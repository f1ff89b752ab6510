use crate::{
    handlers::{group_messages, root, send_notification},
    ws::handler::{chat_handler, notifications_handler},
    AppState,
};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Chat, notification and history routes
pub fn create_relay_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(root))
        .route("/ws/chat/:group_id", get(chat_handler))
        .route("/ws/notifications", get(notifications_handler))
        .route("/send-notification", post(send_notification))
        .route("/groups/:group_id/messages", get(group_messages))
}
