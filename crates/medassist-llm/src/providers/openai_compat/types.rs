use crate::capability::Capability;
use crate::config::BackendConfig;
use crate::util::mask_api_key;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// OpenAI API base URL
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Groq OpenAI-compatible base URL
pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Default OpenAI model
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default Groq model
pub const GROQ_DEFAULT_MODEL: &str = "llama-3.1-8b-instant";

/// Configuration of an OpenAI-compatible backend
#[derive(Clone)]
pub struct OpenAiCompatibleConfig {
    /// Registry id
    pub id: String,
    /// API key
    pub api_key: String,
    /// Base URL (without `/chat/completions`)
    pub base_url: String,
    /// Model name
    pub model: String,
    /// Default max tokens
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
impl fmt::Debug for OpenAiCompatibleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiCompatibleConfig")
            .field("id", &self.id)
            .field("api_key", &mask_api_key(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl OpenAiCompatibleConfig {
    /// OpenAI preset
    #[must_use]
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self {
            id: "openai".to_string(),
            api_key: api_key.into(),
            base_url: OPENAI_BASE_URL.to_string(),
            model: OPENAI_DEFAULT_MODEL.to_string(),
            max_tokens: 1024,
            temperature: 0.3,
            timeout: Duration::from_secs(30),
            capabilities: Capability::ALL.to_vec(),
            medical_validated: true,
            hipaa_compliant: true,
        }
    }

    /// Groq preset, tuned for fast retrieval answers
    #[must_use]
    pub fn groq(api_key: impl Into<String>) -> Self {
        Self {
            id: "groq".to_string(),
            base_url: GROQ_BASE_URL.to_string(),
            model: GROQ_DEFAULT_MODEL.to_string(),
            capabilities: vec![Capability::KnowledgeRetrieval, Capability::ClinicalConversation],
            medical_validated: false,
            hipaa_compliant: false,
            ..Self::openai(api_key)
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

    /// Set the model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the client timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub(crate) struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    pub model: Option<String>,
    pub choices: Vec<ChatChoice>,
    pub usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoice {
    pub message: ChatChoiceMessage,
    #[allow(dead_code)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoiceMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorDetail {
    pub message: String,
}
