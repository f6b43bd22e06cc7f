//! MedAssist Memory - Multi-Backend Memory Coordinator
//!
//! Fans one query out to several independently failing memory stores and
//! merges what comes back into a single prompt-ready context.
//!
//! # Architecture
//!
//! ```text
//!                     MemoryQuery
//!                          │
//!                  MemoryCoordinator ── budget ──► late/failed = empty
//!          ╱          │            │           ╲
//!  RecencyWindow  SimilarityIndex  HistoryStore  WorkflowGraph
//!          ╲          │            │           ╱
//!               sort + weight + truncate
//!                          │
//!                   UnifiedContext::render
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod backend;
pub mod backends;
pub mod config;
pub mod context;
pub mod coordinator;
pub mod error;
pub mod scorer;
pub mod types;

pub use backend::MemoryBackend;
pub use backends::{HistoryStore, RecencyWindow, SimilarityIndex, WorkflowGraph};
pub use config::CoordinatorConfig;
pub use context::{ContextSection, UnifiedContext};
pub use coordinator::{MemoryCoordinator, MemoryCoordinatorBuilder, MemoryQuery};
pub use error::{Error, Result};
pub use types::{
    HealthSummary, MemoryKind, MemoryQueryResult, MemoryRecord, NewRecord, RecordContent,
    SearchFilters,
};

use std::sync::Arc;

/// Coordinator over the four reference backends.
///
/// The history store opens (or creates) its SQLite file at the configured
/// path.
pub async fn reference_coordinator(config: CoordinatorConfig) -> Result<MemoryCoordinator> {
    let history = HistoryStore::from_path(&config.resolved_history_path()).await?;
    Ok(MemoryCoordinator::builder()
        .register(Arc::new(RecencyWindow::new(
            config.recency_window,
            config.recency_ttl(),
        )))
        .register(Arc::new(SimilarityIndex::new()))
        .register(Arc::new(history))
        .register(Arc::new(WorkflowGraph::new()))
        .with_config(config)
        .build())
}

/// Same as [`reference_coordinator`] with an in-memory history store.
pub async fn in_memory_coordinator(config: CoordinatorConfig) -> Result<MemoryCoordinator> {
    let history = HistoryStore::in_memory().await?;
    Ok(MemoryCoordinator::builder()
        .register(Arc::new(RecencyWindow::new(
            config.recency_window,
            config.recency_ttl(),
        )))
        .register(Arc::new(SimilarityIndex::new()))
        .register(Arc::new(history))
        .register(Arc::new(WorkflowGraph::new()))
        .with_config(config)
        .build())
}
