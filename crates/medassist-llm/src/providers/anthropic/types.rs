use crate::capability::Capability;
use crate::config::BackendConfig;
use crate::util::mask_api_key;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Anthropic API version
pub const API_VERSION: &str = "2023-06-01";

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Default model
pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";

/// Anthropic backend configuration
#[derive(Clone)]
pub struct AnthropicConfig {
    /// Registry id
    pub id: String,
    /// API key
    pub api_key: String,
    /// Base URL
    pub base_url: String,
    /// Model name
    pub model: String,
    /// Default max tokens (required by the API)
    pub max_tokens: u32,
    /// Default temperature
    pub temperature: f32,
    /// HTTP client timeout
    pub timeout: Duration,
    /// Declared capabilities
    pub capabilities: Vec<Capability>,
    /// Reported compliance flag
    pub medical_validated: bool,
    /// Reported compliance flag
    pub hipaa_compliant: bool,
}

// SECURITY: Custom Debug implementation to mask API key
impl fmt::Debug for AnthropicConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnthropicConfig")
            .field("id", &self.id)
            .field("api_key", &mask_api_key(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl AnthropicConfig {
    /// Create a configuration with an API key
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            id: "anthropic".to_string(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 1024,
            temperature: 0.3,
            timeout: Duration::from_secs(30),
            capabilities: vec![
                Capability::ClinicalConversation,
                Capability::MedicalReasoning,
                Capability::PatientMonitoring,
            ],
            medical_validated: true,
            hipaa_compliant: true,
        }
    }

    /// Build from a configuration entry and its resolved key
    #[must_use]
    pub fn from_backend(entry: &BackendConfig, api_key: impl Into<String>) -> Self {
        Self {
            id: entry.id.clone(),
            api_key: api_key.into(),
            base_url: entry.base_url.trim_end_matches('/').to_string(),
            model: entry.model.clone(),
            max_tokens: entry.max_tokens,
            temperature: entry.temperature,
            timeout: entry.timeout(),
            capabilities: entry.capabilities.clone(),
            medical_validated: entry.medical_validated,
            hipaa_compliant: entry.hipaa_compliant,
        }
    }

    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct MessagesRequest {
    pub model: String,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub(crate) struct AnthropicMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessagesResponse {
    pub model: String,
    pub content: Vec<ResponseBlock>,
    pub usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub(crate) enum ResponseBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnthropicUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnthropicError {
    pub error: AnthropicErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnthropicErrorDetail {
    pub r#type: String,
    pub message: String,
}
