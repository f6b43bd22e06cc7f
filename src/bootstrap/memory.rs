//! Memory coordinator setup

use anyhow::{Context, Result};
use medassist_memory::{CoordinatorConfig, MemoryCoordinator};
use std::sync::Arc;
use tracing::info;

/// Open the reference memory backends
pub async fn build_memory(config: &CoordinatorConfig) -> Result<Arc<MemoryCoordinator>> {
    let path = config.resolved_history_path();
    let coordinator = medassist_memory::reference_coordinator(config.clone())
        .await
        .with_context(|| format!("Failed to open history store at {}", path.display()))?;
    info!(
        backends = coordinator.registered_kinds().len(),
        history = %path.display(),
        "Memory coordinator initialized"
    );
    Ok(Arc::new(coordinator))
}
