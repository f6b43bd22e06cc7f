//! Error types for the memory coordinator.

use crate::types::MemoryKind;

/// Errors that can occur in memory operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// SQLite database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization / deserialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No backend could serve the request
    #[error("no memory backends configured")]
    NoBackends,

    /// A specific kind was requested but never registered
    #[error("memory backend not registered: {0}")]
    NotRegistered(MemoryKind),

    /// Record rejected by a backend
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// Backend-specific failure
    #[error("{backend} backend error: {message}")]
    Backend {
        /// Backend name
        backend: String,
        /// Failure description
        message: String,
    },

    /// General internal error
    #[error("{0}")]
    Internal(String),
}

/// Convenience Result type.
pub type Result<T> = std::result::Result<T, Error>;
