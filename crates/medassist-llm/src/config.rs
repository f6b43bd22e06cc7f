//! Gateway and backend configuration

use crate::capability::Capability;
use crate::retry::RetryConfig;
use crate::router::RoutingTable;
use crate::validation::ValidationConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fixed, safety-reviewed reply used when every backend failed
pub const DEFAULT_DEGRADED_MESSAGE: &str = "Lo siento, no puedo procesar su consulta médica en este momento. Por favor consulte con su médico tratante para obtener asistencia personalizada.";

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    8_000
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}

fn default_call_timeout_ms() -> u64 {
    30_000
}

fn default_degraded_message() -> String {
    DEFAULT_DEGRADED_MESSAGE.to_string()
}

/// Retry settings as they appear in configuration files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Attempts per backend, first one included
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// First backoff delay
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    /// Backoff cap
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Backoff growth factor
    #[serde(default = "default_multiplier")]
    pub backoff_multiplier: f64,
    /// Randomize delays
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_multiplier(),
            jitter: true,
        }
    }
}

impl RetrySettings {
    /// Executor configuration with the given per-attempt timeout
    #[must_use]
    pub fn to_retry_config(&self, attempt_timeout: Duration) -> RetryConfig {
        RetryConfig::new()
            .with_max_attempts(self.max_attempts)
            .with_initial_delay(Duration::from_millis(self.initial_delay_ms))
            .with_max_delay(Duration::from_millis(self.max_delay_ms))
            .with_backoff_multiplier(self.backoff_multiplier)
            .with_jitter(self.jitter)
            .with_attempt_timeout(attempt_timeout)
    }
}

/// Gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Capability → preferred backend ids, overlaid on the default table
    #[serde(default)]
    pub routing: Option<RoutingTable>,
    /// Retry policy applied per backend
    #[serde(default)]
    pub retry: RetrySettings,
    /// Per-attempt timeout
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,
    /// Overall deadline for one `generate` call
    #[serde(default)]
    pub deadline_ms: Option<u64>,
    /// Safety phrases and thresholds
    #[serde(default)]
    pub validation: ValidationConfig,
    /// Reply used when every backend failed
    #[serde(default = "default_degraded_message")]
    pub degraded_message: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            routing: None,
            retry: RetrySettings::default(),
            call_timeout_ms: default_call_timeout_ms(),
            deadline_ms: None,
            validation: ValidationConfig::default(),
            degraded_message: default_degraded_message(),
        }
    }
}

impl GatewayConfig {
    /// Default routing table with configured overrides applied
    #[must_use]
    pub fn routing_table(&self) -> RoutingTable {
        match &self.routing {
            Some(overrides) => RoutingTable::default().merged(overrides.clone()),
            None => RoutingTable::default(),
        }
    }

    /// Per-attempt timeout
    #[must_use]
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    /// Overall deadline, if configured
    #[must_use]
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_ms.map(Duration::from_millis)
    }

    /// Retry executor configuration
    #[must_use]
    pub fn retry_config(&self) -> RetryConfig {
        self.retry.to_retry_config(self.call_timeout())
    }
}

/// Wire protocol of a configured backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// OpenAI chat-completions compatible (OpenAI, Groq, local gateways)
    OpenaiCompatible,
    /// Anthropic messages API
    Anthropic,
}

fn default_backend_max_tokens() -> u32 {
    1024
}

fn default_backend_temperature() -> f32 {
    0.3
}

fn default_backend_timeout_ms() -> u64 {
    30_000
}

/// One generation backend entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Registry id, referenced by the routing table
    pub id: String,
    /// Wire protocol
    pub kind: BackendKind,
    /// API base URL
    pub base_url: String,
    /// Model name
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Declared capabilities
    #[serde(default)]
    pub capabilities: Vec<Capability>,
    /// Default output token limit
    #[serde(default = "default_backend_max_tokens")]
    pub max_tokens: u32,
    /// Default temperature
    #[serde(default = "default_backend_temperature")]
    pub temperature: f32,
    /// HTTP client timeout
    #[serde(default = "default_backend_timeout_ms")]
    pub timeout_ms: u64,
    /// Reported in health output
    #[serde(default)]
    pub medical_validated: bool,
    /// Reported in health output
    #[serde(default)]
    pub hipaa_compliant: bool,
    /// Skip registration when false
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl BackendConfig {
    /// HTTP client timeout
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_defaults() {
        let config: GatewayConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.call_timeout(), Duration::from_secs(30));
        assert!(config.deadline().is_none());
        assert_eq!(config.degraded_message, DEFAULT_DEGRADED_MESSAGE);
        assert!((config.validation.max_safe_temperature - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_routing_overrides_merge() {
        let config: GatewayConfig =
            serde_json::from_str(r#"{"routing": {"medical_reasoning": ["anthropic"]}}"#).unwrap();
        let table = config.routing_table();
        assert_eq!(table.preferences(Capability::MedicalReasoning), ["anthropic".to_string()]);
        assert_eq!(
            table.preferences(Capability::ClinicalConversation),
            ["anthropic".to_string(), "openai".to_string()]
        );
    }

    #[test]
    fn test_backend_entry() {
        let backend: BackendConfig = serde_json::from_str(
            r#"{
                "id": "groq",
                "kind": "openai_compatible",
                "base_url": "https://api.groq.com/openai/v1",
                "model": "llama-3.1-8b-instant",
                "api_key_env": "GROQ_API_KEY",
                "capabilities": ["knowledge_retrieval"]
            }"#,
        )
        .unwrap();
        assert_eq!(backend.kind, BackendKind::OpenaiCompatible);
        assert!(backend.enabled);
        assert_eq!(backend.max_tokens, 1024);
        assert_eq!(backend.capabilities, vec![Capability::KnowledgeRetrieval]);
    }
}
