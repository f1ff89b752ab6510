use utoipa::OpenApi;
use crate::models::*;

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
#[allow(dead_code)]
pub async fn health_check_doc() {}

/// Readiness check endpoint
#[utoipa::path(
    get,
    path = "/api/ready",
    responses(
        (status = 200, description = "Service is ready", body = HealthResponse),
        (status = 503, description = "Message store unavailable", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn ready_check_doc() {}

/// Registry and host diagnostics
#[utoipa::path(
    get,
    path = "/api/v1/diagnostics",
    responses(
        (status = 200, description = "Current diagnostics", body = DiagnosticsResponse)
    )
)]
#[allow(dead_code)]
pub async fn diagnostics_doc() {}

/// Broadcast a notification to every notification WebSocket
#[utoipa::path(
    post,
    path = "/send-notification",
    request_body = NotificationRequest,
    responses(
        (status = 200, description = "Notification sent", body = NotificationResponse)
    )
)]
#[allow(dead_code)]
pub async fn send_notification_doc() {}

/// Chat history of a group, oldest first
#[utoipa::path(
    get,
    path = "/groups/{group_id}/messages",
    params(
        ("group_id" = String, Path, description = "Chat group identifier")
    ),
    responses(
        (status = 200, description = "Stored messages", body = [ChatMessage]),
        (status = 503, description = "Message store unavailable", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn group_messages_doc() {}

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check_doc,
        ready_check_doc,
        diagnostics_doc,
        send_notification_doc,
        group_messages_doc,
    ),
    components(
        schemas(
            HealthResponse,
            ErrorResponse,
            DiagnosticsResponse,
            NotificationRequest,
            NotificationResponse,
            ChatMessage,
        )
    ),
    tags(
        (name = "api", description = "API endpoints")
    )
)]
pub struct ApiDoc;
