//! Error types for medassist-llm

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How the gateway should react to a backend failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    /// Worth retrying on the same backend
    Transient,
    /// Retrying the same backend is pointless; fail over immediately
    Fatal,
}

/// Generation error type
#[derive(Debug, Error)]
pub enum Error {
    /// Backend not configured (missing key, disabled, unknown kind)
    #[error("backend not configured: {0}")]
    NotConfigured(String),

    /// Credentials rejected
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Backend rejected the request shape
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Rate limit exceeded
    #[error("rate limit exceeded")]
    RateLimit,

    /// Timeout
    #[error("timeout after {0}ms")]
    Timeout(u64),

    /// Network error
    #[error("network error: {0}")]
    Network(String),

    /// Backend temporarily unavailable (5xx, overloaded)
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// Unclassified API error
    #[error("api error: {0}")]
    Api(String),

    /// Response could not be decoded
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Invalid gateway configuration
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Registry holds no backend at all
    #[error("no generation backend available")]
    NoBackendAvailable,
}

impl Error {
    /// Classify this failure for retry and failover decisions
    #[must_use]
    pub fn class(&self) -> FailureClass {
        match self {
            Self::RateLimit | Self::Timeout(_) | Self::Network(_) | Self::Unavailable(_) => {
                FailureClass::Transient
            }
            Self::NotConfigured(_)
            | Self::Authentication(_)
            | Self::InvalidRequest(_)
            | Self::Api(_)
            | Self::InvalidResponse(_)
            | Self::Configuration(_)
            | Self::NoBackendAvailable => FailureClass::Fatal,
        }
    }

    /// Shorthand for `class() == FailureClass::Transient`
    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.class() == FailureClass::Transient
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
