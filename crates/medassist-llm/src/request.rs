//! Generation request and result types

use crate::message::Message;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Safety-context key carrying the requested capability
pub const CAPABILITY_CONTEXT_KEY: &str = "capability";

/// Request handed to the gateway
///
/// The gateway never mutates a caller's request; it works on an augmented
/// copy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Ordered conversation turns
    pub messages: Vec<Message>,
    /// System instruction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Maximum output tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Safety context, e.g. `{"domain": "obesity_treatment", "safety_level": "standard"}`
    #[serde(default)]
    pub safety_context: HashMap<String, String>,
    /// Patient identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,
    /// Chat session identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl GenerationRequest {
    /// Create an empty request
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one turn
    #[must_use]
    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Append several turns
    #[must_use]
    pub fn with_messages(mut self, messages: impl IntoIterator<Item = Message>) -> Self {
        self.messages.extend(messages);
        self
    }

    /// Set system prompt
    #[must_use]
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Set temperature
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set max tokens
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set one safety-context entry
    #[must_use]
    pub fn with_safety_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.safety_context.insert(key.into(), value.into());
        self
    }

    /// Set patient identifier
    #[must_use]
    pub fn with_subject_id(mut self, id: impl Into<String>) -> Self {
        self.subject_id = Some(id.into());
        self
    }

    /// Set session identifier
    #[must_use]
    pub fn with_session_id(mut self, id: impl Into<String>) -> Self {
        self.session_id = Some(id.into());
        self
    }

    /// Last user turn, if any
    #[must_use]
    pub fn last_user_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == crate::message::MessageRole::User)
            .map(|m| m.content.as_str())
    }
}

/// Token usage statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Prompt tokens
    pub prompt_tokens: u32,
    /// Completion tokens
    pub completion_tokens: u32,
    /// Total tokens
    pub total_tokens: u32,
}

impl TokenUsage {
    /// Build usage from prompt and completion counts
    #[must_use]
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Generation outcome, always populated even on total failure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Generated text
    pub content: String,
    /// Backend that produced the text
    pub backend: String,
    /// Model name
    pub model: String,
    /// Token usage, when the backend reports it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
    /// Passed response validation (set by the gateway only)
    pub validated: bool,
    /// Free-form metadata
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl GenerationResult {
    /// New unvalidated result stamped now
    #[must_use]
    pub fn new(content: impl Into<String>, backend: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            backend: backend.into(),
            model: model.into(),
            usage: None,
            validated: false,
            metadata: HashMap::new(),
            created_at: Utc::now(),
        }
    }

    /// Attach token usage
    #[must_use]
    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Insert a metadata entry
    pub fn insert_metadata(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.metadata.insert(key.into(), value.into());
    }

    /// Whether this is the terminal degraded reply
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.metadata
            .get("fallback")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false)
    }
}
