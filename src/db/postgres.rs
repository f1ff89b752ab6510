use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Error as SqlxError;
use tracing::{error, info};

use super::store::{MessageStore, StoreError};
use crate::models::ChatMessage;

const CREATE_TABLE_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS chat_messages (
        id BIGSERIAL PRIMARY KEY,
        group_id TEXT NOT NULL,
        user_name TEXT NOT NULL,
        text TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )
"#;

const CREATE_INDEX_SQL: &str = r#"
    CREATE INDEX IF NOT EXISTS chat_messages_group_created_idx
        ON chat_messages (group_id, created_at, id)
"#;

/// Chat message row from the database
#[derive(Debug, Clone, sqlx::FromRow)]
struct ChatMessageRow {
    group_id: String,
    user_name: String,
    text: String,
    created_at: DateTime<Utc>,
}

impl From<ChatMessageRow> for ChatMessage {
    fn from(row: ChatMessageRow) -> Self {
        ChatMessage {
            group_id: row.group_id,
            user: row.user_name,
            text: row.text,
            timestamp: row.created_at,
        }
    }
}

/// PostgreSQL backed message store
pub struct PgMessageStore {
    pool: PgPool,
}

impl PgMessageStore {
    /// Create the connection pool and make sure the table exists
    ///
    /// # Arguments
    /// * `database_url` - PostgreSQL connection string
    /// * `max_connections` - Upper bound for the pool
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, SqlxError> {
        info!("Connecting to database...");

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(1)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .connect(database_url)
            .await?;

        info!("Database connection pool created successfully");

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<(), SqlxError> {
        sqlx::query(CREATE_TABLE_SQL).execute(&self.pool).await?;
        sqlx::query(CREATE_INDEX_SQL).execute(&self.pool).await?;
        info!("Table chat_messages is ready");
        Ok(())
    }
}

#[async_trait]
impl MessageStore for PgMessageStore {
    async fn append(&self, message: &ChatMessage) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO chat_messages (group_id, user_name, text, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(&message.group_id)
        .bind(&message.user)
        .bind(&message.text)
        .bind(message.timestamp)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to store message for group '{}': {}", message.group_id, e);
            StoreError::from(e)
        })?;
        Ok(())
    }

    async fn query_ordered(&self, group_id: &str) -> Result<Vec<ChatMessage>, StoreError> {
        let rows = sqlx::query_as::<_, ChatMessageRow>(
            r#"
            SELECT group_id, user_name, text, created_at
            FROM chat_messages
            WHERE group_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to load history for group '{}': {}", group_id, e);
            StoreError::from(e)
        })?;

        Ok(rows.into_iter().map(ChatMessage::from).collect())
    }

    async fn is_ready(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}
