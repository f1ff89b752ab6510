use async_trait::async_trait;
use thiserror::Error;

use crate::models::ChatMessage;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("message store unavailable: {0}")]
    Unavailable(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Append-only chat log, keyed by group.
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn append(&self, message: &ChatMessage) -> Result<(), StoreError>;

    /// Every message of `group_id`, oldest first.
    async fn query_ordered(&self, group_id: &str) -> Result<Vec<ChatMessage>, StoreError>;

    /// Whether the store can currently serve requests.
    async fn is_ready(&self) -> bool {
        true
    }
}
