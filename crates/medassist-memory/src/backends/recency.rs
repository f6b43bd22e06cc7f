//! Recency window: the last few turns of each conversation.
//!
//! Held in process memory with a sliding TTL. Search ignores the query text
//! and returns the newest records of the filtered conversation.

use crate::backend::MemoryBackend;
use crate::error::{Error, Result};
use crate::types::{MemoryKind, MemoryQueryResult, MemoryRecord, NewRecord, SearchFilters};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Default number of records kept per conversation.
pub const DEFAULT_WINDOW: usize = 20;

/// Default record lifetime.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Key for a generated conversation message record.
#[must_use]
pub fn message_key(conversation_id: &str) -> String {
    format!("conversation:{conversation_id}:message:{}", Uuid::new_v4())
}

/// In-memory per-conversation recency window.
#[derive(Clone)]
pub struct RecencyWindow {
    // newest first
    conversations: Arc<RwLock<HashMap<String, VecDeque<MemoryRecord>>>>,
    window: usize,
    ttl: chrono::Duration,
}

impl Default for RecencyWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW, DEFAULT_TTL)
    }
}

impl RecencyWindow {
    /// Create a window keeping `window` records per conversation for `ttl`.
    #[must_use]
    pub fn new(window: usize, ttl: Duration) -> Self {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        Self {
            conversations: Arc::new(RwLock::new(HashMap::new())),
            window: window.max(1),
            ttl: chrono::Duration::milliseconds(ttl_ms),
        }
    }

    fn is_expired(&self, record: &MemoryRecord) -> bool {
        Utc::now() - record.updated_at >= self.ttl
    }

    /// Drop expired records and empty conversations.
    pub async fn cleanup_expired(&self) -> usize {
        let mut conversations = self.conversations.write().await;
        let mut removed = 0;
        for records in conversations.values_mut() {
            let before = records.len();
            records.retain(|r| !self.is_expired(r));
            removed += before - records.len();
        }
        conversations.retain(|_, records| !records.is_empty());
        if removed > 0 {
            debug!(removed = removed, "Expired recency records removed");
        }
        removed
    }

    /// Number of live records in a conversation.
    pub async fn len(&self, conversation_id: &str) -> usize {
        self.conversations
            .read()
            .await
            .get(conversation_id)
            .map_or(0, |records| records.iter().filter(|r| !self.is_expired(r)).count())
    }
}

#[async_trait]
impl MemoryBackend for RecencyWindow {
    fn kind(&self) -> MemoryKind {
        MemoryKind::Recency
    }

    fn name(&self) -> &str {
        "recency-window"
    }

    async fn store(&self, key: Option<String>, entry: NewRecord) -> Result<String> {
        let conversation_id = entry
            .conversation_id
            .clone()
            .ok_or_else(|| Error::InvalidRecord("recency records need a conversation id".into()))?;
        let key = key.unwrap_or_else(|| message_key(&conversation_id));

        let mut conversations = self.conversations.write().await;
        let mut record = MemoryRecord::from_new(key.clone(), entry);

        // Keys are unique across conversations, not just within one.
        for records in conversations.values_mut() {
            if let Some(pos) = records.iter().position(|r| r.key == key) {
                if let Some(previous) = records.remove(pos) {
                    record.created_at = previous.created_at;
                }
                break;
            }
        }
        conversations.retain(|_, records| !records.is_empty());

        let records = conversations.entry(conversation_id).or_default();
        records.push_front(record);
        records.truncate(self.window);
        Ok(key)
    }

    async fn retrieve(&self, key: &str) -> Result<Option<MemoryRecord>> {
        let conversations = self.conversations.read().await;
        Ok(conversations
            .values()
            .flat_map(|records| records.iter())
            .find(|r| r.key == key && !self.is_expired(r))
            .cloned())
    }

    async fn search(
        &self,
        _query: &str,
        limit: usize,
        filters: &SearchFilters,
    ) -> Result<Vec<MemoryQueryResult>> {
        let Some(conversation_id) = filters.conversation_id.as_deref() else {
            debug!("Recency search without conversation id, nothing to return");
            return Ok(Vec::new());
        };

        let conversations = self.conversations.read().await;
        let Some(records) = conversations.get(conversation_id) else {
            return Ok(Vec::new());
        };

        Ok(records
            .iter()
            .filter(|r| !self.is_expired(r))
            .take(limit)
            .enumerate()
            .map(|(rank, r)| MemoryQueryResult::new(r.clone(), 1.0 / (1.0 + rank as f32)))
            .collect())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut conversations = self.conversations.write().await;
        for records in conversations.values_mut() {
            if let Some(pos) = records.iter().position(|r| r.key == key) {
                records.remove(pos);
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn health_check(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(conversation: &str, text: &str) -> NewRecord {
        NewRecord::new(text).with_conversation(conversation)
    }

    #[tokio::test]
    async fn test_store_generates_conversation_key() {
        let window = RecencyWindow::default();
        let key = window.store(None, turn("c1", "hello")).await.unwrap();
        assert!(key.starts_with("conversation:c1:message:"));

        let record = window.retrieve(&key).await.unwrap().unwrap();
        assert_eq!(record.content.search_text(), "hello");
    }

    #[tokio::test]
    async fn test_store_requires_conversation() {
        let window = RecencyWindow::default();
        let err = window.store(None, NewRecord::new("orphan")).await.unwrap_err();
        assert!(matches!(err, Error::InvalidRecord(_)));
    }

    #[tokio::test]
    async fn test_search_newest_first() {
        let window = RecencyWindow::default();
        for text in ["first", "second", "third"] {
            window.store(None, turn("c1", text)).await.unwrap();
        }
        window.store(None, turn("c2", "other")).await.unwrap();

        let results = window
            .search("ignored", 2, &SearchFilters::conversation("c1"))
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].record.content.search_text(), "third");
        assert_eq!(results[1].record.content.search_text(), "second");
        assert!(results[0].relevance > results[1].relevance);
    }

    #[tokio::test]
    async fn test_search_without_conversation_is_empty() {
        let window = RecencyWindow::default();
        window.store(None, turn("c1", "hello")).await.unwrap();
        let results = window.search("hello", 5, &SearchFilters::default()).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_window_bounded() {
        let window = RecencyWindow::new(2, DEFAULT_TTL);
        for text in ["a", "b", "c"] {
            window.store(None, turn("c1", text)).await.unwrap();
        }
        assert_eq!(window.len("c1").await, 2);
    }

    #[tokio::test]
    async fn test_overwrite_keeps_created_at() {
        let window = RecencyWindow::default();
        let key = window.store(None, turn("c1", "v1")).await.unwrap();
        let created = window.retrieve(&key).await.unwrap().unwrap().created_at;

        window.store(Some(key.clone()), turn("c1", "v2")).await.unwrap();

        let record = window.retrieve(&key).await.unwrap().unwrap();
        assert_eq!(record.content.search_text(), "v2");
        assert_eq!(record.created_at, created);
        assert_eq!(window.len("c1").await, 1);
    }

    #[tokio::test]
    async fn test_zero_ttl_expires_everything() {
        let window = RecencyWindow::new(5, Duration::ZERO);
        let key = window.store(None, turn("c1", "gone")).await.unwrap();
        assert!(window.retrieve(&key).await.unwrap().is_none());
        assert_eq!(window.cleanup_expired().await, 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let window = RecencyWindow::default();
        let key = window.store(None, turn("c1", "x")).await.unwrap();
        assert!(window.delete(&key).await.unwrap());
        assert!(!window.delete(&key).await.unwrap());
    }

    #[tokio::test]
    async fn test_key_moves_between_conversations() {
        let window = RecencyWindow::default();
        window
            .store(Some("k".into()), turn("c1", "first"))
            .await
            .unwrap();
        window
            .store(Some("k".into()), turn("c2", "second"))
            .await
            .unwrap();

        assert_eq!(window.len("c1").await, 0);
        assert_eq!(window.len("c2").await, 1);
        let record = window.retrieve("k").await.unwrap().unwrap();
        assert_eq!(record.conversation_id.as_deref(), Some("c2"));
        assert_eq!(record.content.search_text(), "second");
    }
}
