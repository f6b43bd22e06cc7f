//! The uniform contract every memory store implements.

use crate::error::Result;
use crate::types::{MemoryKind, MemoryQueryResult, MemoryRecord, NewRecord, SearchFilters};

/// A memory store reachable by the coordinator.
///
/// Each implementation owns its own connections and fails independently.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MemoryBackend: Send + Sync {
    /// Which kind of store this is.
    fn kind(&self) -> MemoryKind;

    /// Human-readable backend name for logs.
    fn name(&self) -> &str;

    /// Store a record and return the key it can be retrieved by.
    ///
    /// Backends may rewrite `key` (e.g. add a prefix); the returned key is
    /// always resolvable. Without a key one is generated.
    async fn store(&self, key: Option<String>, entry: NewRecord) -> Result<String>;

    /// Fetch a record by key.
    async fn retrieve(&self, key: &str) -> Result<Option<MemoryRecord>>;

    /// Search for records, ordered by relevance descending.
    async fn search(
        &self,
        query: &str,
        limit: usize,
        filters: &SearchFilters,
    ) -> Result<Vec<MemoryQueryResult>>;

    /// Delete a record; `false` when the key was unknown.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Cheap liveness probe.
    async fn health_check(&self) -> bool;
}
