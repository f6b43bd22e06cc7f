//! Generation backend registration
//!
//! Builds the backend registry from the `[[backends]]` entries. An entry
//! whose API key variable is unset is skipped with a warning.

use anyhow::{Context, Result};
use medassist_llm::{
    AnthropicAdapter, AnthropicConfig, BackendAdapter, BackendConfig, BackendKind,
    BackendRegistry, OpenAiCompatibleAdapter, OpenAiCompatibleConfig,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Build one adapter from its entry and API key
pub fn build_adapter(entry: &BackendConfig, api_key: String) -> Result<Arc<dyn BackendAdapter>> {
    let adapter: Arc<dyn BackendAdapter> = match entry.kind {
        BackendKind::OpenaiCompatible => Arc::new(
            OpenAiCompatibleAdapter::new(OpenAiCompatibleConfig::from_backend(entry, api_key))
                .with_context(|| format!("Failed to create backend '{}'", entry.id))?,
        ),
        BackendKind::Anthropic => Arc::new(
            AnthropicAdapter::new(AnthropicConfig::from_backend(entry, api_key))
                .with_context(|| format!("Failed to create backend '{}'", entry.id))?,
        ),
    };
    Ok(adapter)
}

/// Register every enabled backend whose API key is available
pub fn build_registry<'a>(
    entries: impl IntoIterator<Item = &'a BackendConfig>,
) -> Result<BackendRegistry> {
    let mut registry = BackendRegistry::new();

    for entry in entries {
        let api_key = match std::env::var(&entry.api_key_env) {
            Ok(key) if !key.trim().is_empty() => key,
            _ => {
                warn!(
                    backend = %entry.id,
                    env = %entry.api_key_env,
                    "API key not set, backend skipped"
                );
                continue;
            }
        };

        registry.register(build_adapter(entry, api_key)?);
        info!(backend = %entry.id, model = %entry.model, "Registered generation backend");
    }

    if registry.is_empty() {
        warn!("No generation backend registered; every reply will be the degraded message");
    }
    Ok(registry)
}
