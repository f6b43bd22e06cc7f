//! Workflow graph: care procedures linked by `related` edges.
//!
//! A procedure is a structured record such as
//! `{"name": "...", "description": "...", "steps": ["...", "..."]}`.
//! Its metadata may carry `related` (array of procedure keys) and
//! `urgent` (bool). Search scores direct matches by term overlap and medical
//! keywords, then pulls in one hop of related procedures at half score.

use super::{by_relevance, generated_key};
use crate::backend::MemoryBackend;
use crate::error::Result;
use crate::scorer::{keyword_score, term_overlap_score, MEDICAL_KEYWORDS};
use crate::types::{MemoryKind, MemoryQueryResult, MemoryRecord, NewRecord, SearchFilters};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Metadata key holding related procedure keys.
pub const RELATED_KEY: &str = "related";

/// Metadata key flagging an urgent procedure.
pub const URGENT_KEY: &str = "urgent";

const NEIGHBOR_DECAY: f32 = 0.5;
const KEYWORD_SCALE: f32 = 10.0;

/// In-memory procedure graph.
#[derive(Clone, Default)]
pub struct WorkflowGraph {
    procedures: Arc<RwLock<HashMap<String, MemoryRecord>>>,
}

impl WorkflowGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys of procedures directly related to `key`.
    pub async fn neighbors(&self, key: &str) -> Vec<String> {
        self.procedures
            .read()
            .await
            .get(key)
            .map(related_keys)
            .unwrap_or_default()
    }

    fn score(query: &str, record: &MemoryRecord) -> f32 {
        let text = record.content.search_text();
        let overlap = term_overlap_score(query, &text);
        let urgent = record
            .metadata
            .get(URGENT_KEY)
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false);
        let keywords = keyword_score(query, &text, urgent, MEDICAL_KEYWORDS) as f32 / KEYWORD_SCALE;
        overlap.max(keywords.min(1.0))
    }
}

fn related_keys(record: &MemoryRecord) -> Vec<String> {
    record
        .metadata
        .get(RELATED_KEY)
        .and_then(serde_json::Value::as_array)
        .map(|keys| {
            keys.iter()
                .filter_map(serde_json::Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl MemoryBackend for WorkflowGraph {
    fn kind(&self) -> MemoryKind {
        MemoryKind::WorkflowGraph
    }

    fn name(&self) -> &str {
        "workflow-graph"
    }

    async fn store(&self, key: Option<String>, entry: NewRecord) -> Result<String> {
        let key = key.unwrap_or_else(|| generated_key(MemoryKind::WorkflowGraph));
        let mut record = MemoryRecord::from_new(key.clone(), entry);

        let mut procedures = self.procedures.write().await;
        if let Some(previous) = procedures.get(&key) {
            record.created_at = previous.created_at;
            record.updated_at = Utc::now();
        }
        procedures.insert(key.clone(), record);
        Ok(key)
    }

    async fn retrieve(&self, key: &str) -> Result<Option<MemoryRecord>> {
        Ok(self.procedures.read().await.get(key).cloned())
    }

    async fn search(
        &self,
        query: &str,
        limit: usize,
        _filters: &SearchFilters,
    ) -> Result<Vec<MemoryQueryResult>> {
        let procedures = self.procedures.read().await;

        let mut scores: HashMap<&str, f32> = procedures
            .iter()
            .filter_map(|(key, record)| {
                let score = Self::score(query, record);
                (score > 0.0).then_some((key.as_str(), score))
            })
            .collect();

        let direct: Vec<(&str, f32)> = scores.iter().map(|(k, s)| (*k, *s)).collect();
        for (key, score) in direct {
            let Some(record) = procedures.get(key) else {
                continue;
            };
            for neighbor in related_keys(record) {
                if let Some((neighbor_key, _)) = procedures.get_key_value(neighbor.as_str()) {
                    let decayed = score * NEIGHBOR_DECAY;
                    let entry = scores.entry(neighbor_key.as_str()).or_insert(0.0);
                    if decayed > *entry {
                        *entry = decayed;
                    }
                }
            }
        }

        let mut hits: Vec<MemoryQueryResult> = scores
            .into_iter()
            .filter_map(|(key, score)| {
                procedures
                    .get(key)
                    .map(|record| MemoryQueryResult::new(record.clone(), score))
            })
            .collect();
        hits.sort_by(by_relevance);
        hits.truncate(limit);
        Ok(hits)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.procedures.write().await.remove(key).is_some())
    }

    async fn health_check(&self) -> bool {
        true
    }
}
