//! Similarity index over document snippets.
//!
//! Term-frequency cosine similarity; conversation filters are ignored.

use super::{by_relevance, generated_key};
use crate::backend::MemoryBackend;
use crate::error::Result;
use crate::scorer::{cosine_similarity, term_frequencies};
use crate::types::{MemoryKind, MemoryQueryResult, MemoryRecord, NewRecord, SearchFilters};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

struct Indexed {
    record: MemoryRecord,
    terms: HashMap<String, f32>,
}

/// In-memory similarity index.
#[derive(Clone, Default)]
pub struct SimilarityIndex {
    documents: Arc<RwLock<HashMap<String, Indexed>>>,
}

impl SimilarityIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of indexed documents.
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    /// Whether the index is empty.
    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

#[async_trait]
impl MemoryBackend for SimilarityIndex {
    fn kind(&self) -> MemoryKind {
        MemoryKind::Similarity
    }

    fn name(&self) -> &str {
        "similarity-index"
    }

    async fn store(&self, key: Option<String>, entry: NewRecord) -> Result<String> {
        let key = key.unwrap_or_else(|| generated_key(MemoryKind::Similarity));
        let mut record = MemoryRecord::from_new(key.clone(), entry);
        let terms = term_frequencies(&record.content.search_text());

        let mut documents = self.documents.write().await;
        if let Some(previous) = documents.get(&key) {
            record.created_at = previous.record.created_at;
            record.updated_at = Utc::now();
        }
        documents.insert(key.clone(), Indexed { record, terms });
        Ok(key)
    }

    async fn retrieve(&self, key: &str) -> Result<Option<MemoryRecord>> {
        Ok(self.documents.read().await.get(key).map(|d| d.record.clone()))
    }

    async fn search(
        &self,
        query: &str,
        limit: usize,
        _filters: &SearchFilters,
    ) -> Result<Vec<MemoryQueryResult>> {
        let query_terms = term_frequencies(query);
        let documents = self.documents.read().await;

        let mut hits: Vec<MemoryQueryResult> = documents
            .values()
            .filter_map(|doc| {
                let score = cosine_similarity(&query_terms, &doc.terms);
                (score > 0.0).then(|| MemoryQueryResult::new(doc.record.clone(), score))
            })
            .collect();
        hits.sort_by(by_relevance);
        hits.truncate(limit);
        Ok(hits)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.documents.write().await.remove(key).is_some())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_and_retrieve() {
        let index = SimilarityIndex::new();
        let key = index
            .store(None, NewRecord::new("Semaglutide dosing schedule"))
            .await
            .unwrap();
        assert!(key.starts_with("similarity:"));
        let record = index.retrieve(&key).await.unwrap().unwrap();
        assert_eq!(record.content.search_text(), "Semaglutide dosing schedule");
    }

    #[tokio::test]
    async fn test_search_ranks_by_similarity() {
        let index = SimilarityIndex::new();
        index
            .store(Some("doc-a".into()), NewRecord::new("nausea side effects are common early"))
            .await
            .unwrap();
        index
            .store(Some("doc-b".into()), NewRecord::new("nausea can happen"))
            .await
            .unwrap();
        index
            .store(Some("doc-c".into()), NewRecord::new("exercise plan for beginners"))
            .await
            .unwrap();

        let hits = index
            .search("nausea side effects", 10, &SearchFilters::default())
            .await
            .unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].record.key, "doc-a");
        assert!(hits[0].relevance >= hits[1].relevance);
    }

    #[tokio::test]
    async fn test_conversation_filter_ignored() {
        let index = SimilarityIndex::new();
        index.store(None, NewRecord::new("injection technique")).await.unwrap();
        let hits = index
            .search("injection", 5, &SearchFilters::conversation("unrelated"))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let index = SimilarityIndex::new();
        let key = index.store(None, NewRecord::new("x y")).await.unwrap();
        assert!(index.delete(&key).await.unwrap());
        assert!(index.is_empty().await);
    }
}
