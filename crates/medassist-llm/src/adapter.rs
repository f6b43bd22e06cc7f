//! Backend adapter trait
//!
//! Every generation backend implements this contract. Concrete adapters are
//! chosen at registration time and never inspected by type afterwards.

use crate::capability::{BackendDescriptor, Capability};
use crate::error::Result;
use crate::request::{GenerationRequest, GenerationResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One health probe of a backend, produced on demand
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendHealth {
    /// Backend identifier
    pub backend: String,
    /// Backend answered the probe
    pub alive: bool,
    /// Probe error, when not alive
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Model the backend is configured for
    pub model: String,
    /// Reported compliance flag
    pub medical_validated: bool,
    /// Reported compliance flag
    pub hipaa_compliant: bool,
    /// Probe time
    pub checked_at: DateTime<Utc>,
}

impl BackendHealth {
    /// Healthy probe for a descriptor
    #[must_use]
    pub fn alive(descriptor: &BackendDescriptor) -> Self {
        Self {
            backend: descriptor.id.clone(),
            alive: true,
            error: None,
            model: descriptor.model.clone(),
            medical_validated: descriptor.medical_validated,
            hipaa_compliant: descriptor.hipaa_compliant,
            checked_at: Utc::now(),
        }
    }

    /// Failed probe for a descriptor
    #[must_use]
    pub fn dead(descriptor: &BackendDescriptor, error: impl Into<String>) -> Self {
        Self {
            alive: false,
            error: Some(error.into()),
            ..Self::alive(descriptor)
        }
    }
}

/// Trait for generation backends
#[async_trait::async_trait]
pub trait BackendAdapter: Send + Sync {
    /// Backend identifier (registry key)
    fn id(&self) -> &str;

    /// Static descriptor
    fn descriptor(&self) -> BackendDescriptor;

    /// Declared capabilities
    fn capabilities(&self) -> &[Capability];

    /// Generate a reply within `timeout`
    ///
    /// Implementations classify failures through [`crate::Error::class`] and
    /// return results with `validated = false`.
    async fn call(&self, request: &GenerationRequest, timeout: Duration) -> Result<GenerationResult>;

    /// Cheap, side-effect-free liveness probe
    async fn health_check(&self) -> BackendHealth;
}
