use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of `POST /send-notification`
#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct NotificationRequest {
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct NotificationResponse {
    pub status: String,
    pub message: String,
}
