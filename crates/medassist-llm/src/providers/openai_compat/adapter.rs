use super::types::{
    ApiErrorBody, ChatMessage, ChatRequest, ChatResponse, OpenAiCompatibleConfig,
};
use crate::adapter::{BackendAdapter, BackendHealth};
use crate::capability::{BackendDescriptor, Capability};
use crate::error::{Error, Result};
use crate::request::{GenerationRequest, GenerationResult, TokenUsage};
use crate::util::{error_for_status, error_for_transport, mask_api_key, sanitize_api_error};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument};

/// Adapter for `/chat/completions` style APIs
pub struct OpenAiCompatibleAdapter {
    client: Client,
    config: OpenAiCompatibleConfig,
    descriptor: BackendDescriptor,
}

impl OpenAiCompatibleAdapter {
    /// Create an adapter
    pub fn new(config: OpenAiCompatibleConfig) -> Result<Self> {
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
            "Created OpenAI-compatible adapter"
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

    /// Configuration in use
    #[must_use]
    pub fn config(&self) -> &OpenAiCompatibleConfig {
        &self.config
    }

    pub(crate) fn build_request(&self, request: &GenerationRequest) -> ChatRequest {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if let Some(system) = &request.system_prompt {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system.clone(),
            });
        }
        messages.extend(request.messages.iter().map(|m| ChatMessage {
            role: m.role.as_str().to_string(),
            content: m.content.clone(),
        }));

        ChatRequest {
            model: self.config.model.clone(),
            messages,
            temperature: Some(request.temperature.unwrap_or(self.config.temperature)),
            max_tokens: Some(request.max_tokens.unwrap_or(self.config.max_tokens)),
            user: request.session_id.clone(),
        }
    }
}

#[async_trait::async_trait]
impl BackendAdapter for OpenAiCompatibleAdapter {
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
        let url = format!("{}/chat/completions", self.config.base_url);
        let body = self.build_request(request);
        let timeout_ms = timeout.as_millis() as u64;

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
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
            // SECURITY: Don't expose raw HTTP response body
            let message = serde_json::from_str::<ApiErrorBody>(&text)
                .map(|b| b.error.message)
                .unwrap_or_else(|_| format!("HTTP {status}"));
            return Err(error_for_status(status, sanitize_api_error(&message)));
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| Error::InvalidResponse(format!("{}: {e}", self.config.id)))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::InvalidResponse(format!("{}: empty choices", self.config.id)))?;

        let model = parsed.model.unwrap_or_else(|| self.config.model.clone());
        let mut result = GenerationResult::new(content, &self.config.id, model);
        if let Some(usage) = parsed.usage {
            result = result.with_usage(TokenUsage::new(usage.prompt_tokens, usage.completion_tokens));
        }
        Ok(result)
    }

    async fn health_check(&self) -> BackendHealth {
        let url = format!("{}/models", self.config.base_url);
        match self
            .client
            .get(&url)
            .bearer_auth(&self.config.api_key)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => BackendHealth::alive(&self.descriptor),
            Ok(response) => BackendHealth::dead(&self.descriptor, format!("HTTP {}", response.status())),
            Err(e) => BackendHealth::dead(&self.descriptor, sanitize_api_error(&e.to_string())),
        }
    }
}
