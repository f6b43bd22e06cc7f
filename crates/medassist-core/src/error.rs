//! Error types for medassist-core
//!
//! This module provides the unified error type and user-friendly formatting.

use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or inconsistent configuration
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Generation gateway error
    #[error("llm error: {0}")]
    Llm(#[from] medassist_llm::Error),

    /// Memory coordinator error
    #[error("memory error: {0}")]
    Memory(#[from] medassist_memory::Error),

    /// Empty or malformed chat input
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Human-readable messages for errors shown in the CLI
pub trait UserFriendlyError {
    /// Short description of what went wrong
    fn user_message(&self) -> String;

    /// How to fix it, when there is something to do
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for Error {
    fn user_message(&self) -> String {
        match self {
            Error::Configuration(msg) => format!("Configuration error: {msg}"),
            Error::Llm(medassist_llm::Error::NotConfigured(provider)) => {
                format!("{provider} is not configured.")
            }
            Error::Llm(e) => format!("Generation error: {e}"),
            Error::Memory(medassist_memory::Error::NoBackends) => {
                "No memory backends are configured.".to_string()
            }
            Error::Memory(e) => format!("Memory error: {e}"),
            Error::InvalidInput(msg) => format!("Invalid input: {msg}"),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            Error::Configuration(_) => {
                Some("Check config/default.toml, config/local.toml or MEDASSIST_* environment variables.".to_string())
            }
            Error::Llm(medassist_llm::Error::NotConfigured(_))
            | Error::Llm(medassist_llm::Error::Authentication(_)) => Some(
                "Set the API key variable named by `api_key_env` in the backend entry.".to_string(),
            ),
            Error::Memory(medassist_memory::Error::Database(_)) => {
                Some("Check that `memory.history_path` is writable.".to_string())
            }
            _ => None,
        }
    }
}

/// Format an error for display in the CLI
#[must_use]
pub fn format_error_for_cli(error: &Error) -> String {
    let mut output = error.user_message();
    if let Some(suggestion) = error.suggestion() {
        output.push_str("\n\n");
        output.push_str(&suggestion);
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_memory_error() {
        let err: Error = medassist_memory::Error::NoBackends.into();
        assert_eq!(err.user_message(), "No memory backends are configured.");
        assert!(err.suggestion().is_none());
    }

    #[test]
    fn test_not_configured_suggests_api_key() {
        let err: Error = medassist_llm::Error::NotConfigured("openai".into()).into();
        let text = format_error_for_cli(&err);
        assert!(text.starts_with("openai is not configured."));
        assert!(text.contains("api_key_env"));
    }
}
