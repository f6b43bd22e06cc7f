//! Startup wiring
//!
//! Loads configuration and builds the gateway, memory coordinator and chat
//! orchestrator once, before any request is served.

pub mod config;
pub mod loader;
pub mod memory;
pub mod providers;

pub use config::AppConfig;
pub use loader::load_config;

use anyhow::{Context, Result};
use medassist_core::ChatOrchestrator;
use medassist_llm::GenerationGateway;
use medassist_memory::MemoryCoordinator;
use std::sync::Arc;

/// Everything a command needs
pub struct Services {
    pub gateway: Arc<GenerationGateway>,
    pub memory: Arc<MemoryCoordinator>,
    pub orchestrator: ChatOrchestrator,
}

/// Build all services from configuration
pub async fn build_services(config: &AppConfig) -> Result<Services> {
    let registry = Arc::new(providers::build_registry(config.enabled_backends())?);
    let gateway = Arc::new(
        GenerationGateway::from_config(registry, &config.gateway)
            .context("Invalid gateway configuration")?,
    );
    let memory = memory::build_memory(&config.memory).await?;
    let orchestrator = ChatOrchestrator::new(gateway.clone(), config.orchestrator.clone())
        .with_memory(memory.clone());

    Ok(Services {
        gateway,
        memory,
        orchestrator,
    })
}
