use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::store::{MessageStore, StoreError};
use crate::models::ChatMessage;

/// Process-local store used when no database is configured.
#[derive(Debug, Default)]
pub struct InMemoryMessageStore {
    groups: RwLock<HashMap<String, Vec<ChatMessage>>>,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn append(&self, message: &ChatMessage) -> Result<(), StoreError> {
        let mut groups = self.groups.write().await;
        groups
            .entry(message.group_id.clone())
            .or_default()
            .push(message.clone());
        Ok(())
    }

    async fn query_ordered(&self, group_id: &str) -> Result<Vec<ChatMessage>, StoreError> {
        let groups = self.groups.read().await;
        let mut messages = groups.get(group_id).cloned().unwrap_or_default();
        // Stable sort keeps append order for equal stamps.
        messages.sort_by_key(|m| m.timestamp);
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn msg(group: &str, text: &str, offset_ms: i64) -> ChatMessage {
        ChatMessage {
            group_id: group.into(),
            user: "alice".into(),
            text: text.into(),
            timestamp: Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap()
                + Duration::milliseconds(offset_ms),
        }
    }

    #[tokio::test]
    async fn history_is_chronological_and_per_group() {
        let store = InMemoryMessageStore::new();
        store.append(&msg("cs101", "m2", 20)).await.unwrap();
        store.append(&msg("cs101", "m1", 10)).await.unwrap();
        store.append(&msg("math", "other", 15)).await.unwrap();
        store.append(&msg("cs101", "m3", 30)).await.unwrap();

        let texts: Vec<_> = store
            .query_ordered("cs101")
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.text)
            .collect();
        assert_eq!(texts, vec!["m1", "m2", "m3"]);
    }

    #[tokio::test]
    async fn unknown_group_has_empty_history() {
        let store = InMemoryMessageStore::new();
        assert!(store.query_ordered("nobody").await.unwrap().is_empty());
        assert!(store.is_ready().await);
    }
}
