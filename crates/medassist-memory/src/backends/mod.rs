//! Reference in-process memory backends, one per [`MemoryKind`].
//!
//! [`MemoryKind`]: crate::types::MemoryKind

pub mod history;
pub mod recency;
pub mod similarity;
pub mod workflow;

pub use history::HistoryStore;
pub use recency::RecencyWindow;
pub use similarity::SimilarityIndex;
pub use workflow::WorkflowGraph;

use crate::types::{MemoryKind, MemoryQueryResult};
use std::cmp::Ordering;
use uuid::Uuid;

/// Generated key of the form `{kind}:{uuid}`.
pub(crate) fn generated_key(kind: MemoryKind) -> String {
    format!("{kind}:{}", Uuid::new_v4())
}

/// Relevance descending, ties broken by key ascending.
pub(crate) fn by_relevance(a: &MemoryQueryResult, b: &MemoryQueryResult) -> Ordering {
    b.relevance
        .total_cmp(&a.relevance)
        .then_with(|| a.record.key.cmp(&b.record.key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MemoryRecord, NewRecord};

    fn hit(key: &str, relevance: f32) -> MemoryQueryResult {
        MemoryQueryResult {
            record: MemoryRecord::from_new(key, NewRecord::new(key)),
            relevance,
        }
    }

    #[test]
    fn test_by_relevance_orders_ties_by_key() {
        let mut hits = vec![hit("b", 0.5), hit("c", 0.9), hit("a", 0.5)];
        hits.sort_by(by_relevance);
        let keys: Vec<_> = hits.iter().map(|h| h.record.key.as_str()).collect();
        assert_eq!(keys, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_by_relevance_total_with_nan() {
        let mut hits: Vec<_> = (0..32)
            .map(|i| {
                let relevance = if i % 3 == 0 { f32::NAN } else { i as f32 / 32.0 };
                hit(&format!("k{i:02}"), relevance)
            })
            .collect();
        hits.sort_by(by_relevance);

        let scored: Vec<f32> = hits
            .iter()
            .map(|h| h.relevance)
            .filter(|r| !r.is_nan())
            .collect();
        assert!(scored.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(hits.len(), 32);
    }
}
