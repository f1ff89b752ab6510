use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Status line returned by `/`, `/api/health` and `/api/ready`
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

impl HealthResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            message: message.into(),
        }
    }
}
