use super::types::{
    AnthropicConfig, AnthropicError, AnthropicMessage, MessagesRequest, MessagesResponse,
    ResponseBlock, API_VERSION,
};
use crate::adapter::{BackendAdapter, BackendHealth};
use crate::capability::{BackendDescriptor, Capability};
use crate::error::{Error, Result};
use crate::message::MessageRole;
use crate::request::{GenerationRequest, GenerationResult, TokenUsage};
use crate::util::{error_for_status, error_for_transport, mask_api_key, sanitize_api_error};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument};

/// Adapter for the Anthropic messages API
pub struct AnthropicAdapter {
    client: Client,
    config: AnthropicConfig,
    descriptor: BackendDescriptor,
}

/// Split turns into the top-level system text and user/assistant messages
///
/// An explicit system prompt wins over system turns.
pub(crate) fn convert_messages(request: &GenerationRequest) -> (Option<String>, Vec<AnthropicMessage>) {
    let mut system_parts = Vec::new();
    let mut messages = Vec::with_capacity(request.messages.len());

    for msg in &request.messages {
        match msg.role {
            MessageRole::System => {
                if !msg.content.is_empty() {
                    system_parts.push(msg.content.clone());
                }
            }
            MessageRole::User | MessageRole::Assistant => messages.push(AnthropicMessage {
                role: msg.role.as_str().to_string(),
                content: msg.content.clone(),
            }),
        }
    }

    let system = match &request.system_prompt {
        Some(prompt) => Some(prompt.clone()),
        None if !system_parts.is_empty() => Some(system_parts.join("\n\n")),
        None => None,
    };
    (system, messages)
}

impl AnthropicAdapter {
    /// Create an adapter
    pub fn new(config: AnthropicConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(Error::NotConfigured(format!("{}: empty API key", config.id)));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        debug!(
            backend = %config.id,
            model = %config.model,
            api_key = %mask_api_key(&config.api_key),
            "Created Anthropic adapter"
        );

        let descriptor = BackendDescriptor {
            id: config.id.clone(),
            model: config.model.clone(),
            capabilities: config.capabilities.clone(),
            medical_validated: config.medical_validated,
            hipaa_compliant: config.hipaa_compliant,
        };
        Ok(Self {
            client,
            config,
            descriptor,
        })
    }
}

#[async_trait::async_trait]
impl BackendAdapter for AnthropicAdapter {
    fn id(&self) -> &str {
        &self.config.id
    }

    fn descriptor(&self) -> BackendDescriptor {
        self.descriptor.clone()
    }

    fn capabilities(&self) -> &[Capability] {
        &self.config.capabilities
    }

    #[instrument(skip(self, request), fields(backend = %self.config.id, model = %self.config.model))]
    async fn call(&self, request: &GenerationRequest, timeout: Duration) -> Result<GenerationResult> {
        let (system, messages) = convert_messages(request);
        if messages.is_empty() {
            return Err(Error::InvalidRequest("no user or assistant turns".to_string()));
        }

        let body = MessagesRequest {
            model: self.config.model.clone(),
            max_tokens: request.max_tokens.unwrap_or(self.config.max_tokens),
            system,
            messages,
            temperature: Some(request.temperature.unwrap_or(self.config.temperature)),
        };
        let timeout_ms = timeout.as_millis() as u64;

        let response = self
            .client
            .post(format!("{}/v1/messages", self.config.base_url))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", API_VERSION)
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| error_for_transport(&e, timeout_ms))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| error_for_transport(&e, timeout_ms))?;

        if !status.is_success() {
            if let Ok(error) = serde_json::from_str::<AnthropicError>(&text) {
                if error.error.r#type == "overloaded_error" {
                    return Err(Error::Unavailable(sanitize_api_error(&error.error.message)));
                }
                return Err(error_for_status(status, sanitize_api_error(&error.error.message)));
            }
            // SECURITY: Don't expose raw HTTP response body
            return Err(error_for_status(status, format!("HTTP {status}")));
        }

        let parsed: MessagesResponse = serde_json::from_str(&text)
            .map_err(|e| Error::InvalidResponse(format!("{}: {e}", self.config.id)))?;
        let content: String = parsed
            .content
            .iter()
            .filter_map(|block| match block {
                ResponseBlock::Text { text } => Some(text.as_str()),
                ResponseBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("");
        if content.is_empty() {
            return Err(Error::InvalidResponse(format!("{}: no text content", self.config.id)));
        }

        let mut result = GenerationResult::new(content, &self.config.id, parsed.model);
        if let Some(usage) = parsed.usage {
            result = result.with_usage(TokenUsage::new(usage.input_tokens, usage.output_tokens));
        }
        Ok(result)
    }

    async fn health_check(&self) -> BackendHealth {
        match self
            .client
            .get(format!("{}/v1/models", self.config.base_url))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", API_VERSION)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => BackendHealth::alive(&self.descriptor),
            Ok(response) => BackendHealth::dead(&self.descriptor, format!("HTTP {}", response.status())),
            Err(e) => BackendHealth::dead(&self.descriptor, sanitize_api_error(&e.to_string())),
        }
    }
}
