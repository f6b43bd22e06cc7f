//! Configuration loading
//!
//! Handles loading configuration from embedded defaults, files, and environment.

use super::config::AppConfig;
use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use std::path::Path;

/// Embedded default configuration (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../../config/default.toml");

/// Load configuration from files and environment
///
/// `extra` is an explicit file given on the command line; it must exist and
/// overrides every file source.
pub fn load_config(extra: Option<&Path>) -> Result<AppConfig> {
    let env_name = std::env::var("MEDASSIST_ENV").unwrap_or_else(|_| "development".to_string());

    let mut builder = Config::builder()
        // 1. Embedded defaults (always available)
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
        // 2. External overrides (optional)
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{env_name}")).required(false))
        .add_source(File::with_name("config/local").required(false));

    if let Some(path) = extra {
        builder = builder.add_source(File::from(path).required(true));
    }

    let config = builder
        // 3. Environment variables (highest priority)
        // MEDASSIST_GATEWAY__CALL_TIMEOUT_MS: single `_` after the prefix, `__` between keys
        .add_source(
            Environment::with_prefix("MEDASSIST")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    config
        .try_deserialize()
        .context("Failed to deserialize configuration")
}
