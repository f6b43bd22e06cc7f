//! Core ChatOrchestrator struct and turn handling

use super::config::OrchestratorConfig;
use super::types::{ChatInput, ChatReply};
use crate::error::{Error, Result};
use crate::prompt::{build_system_prompt, safety_fallback};
use medassist_llm::{GenerationGateway, GenerationRequest, Message, MessageRole};
use medassist_memory::{MemoryCoordinator, MemoryQuery, UnifiedContext};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Answers patient messages using the gateway and memory coordinator
pub struct ChatOrchestrator {
    gateway: Arc<GenerationGateway>,
    memory: Option<Arc<MemoryCoordinator>>,
    config: OrchestratorConfig,
}

impl ChatOrchestrator {
    /// Create an orchestrator without memory
    #[must_use]
    pub fn new(gateway: Arc<GenerationGateway>, config: OrchestratorConfig) -> Self {
        Self {
            gateway,
            memory: None,
            config,
        }
    }

    /// Attach a memory coordinator
    #[must_use]
    pub fn with_memory(mut self, memory: Arc<MemoryCoordinator>) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Get the configuration
    #[must_use]
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Get the generation gateway
    #[must_use]
    pub fn gateway(&self) -> &GenerationGateway {
        &self.gateway
    }

    /// Get the memory coordinator, if any
    #[must_use]
    pub fn memory(&self) -> Option<&MemoryCoordinator> {
        self.memory.as_deref()
    }

    /// Handle one patient turn
    #[instrument(skip(self, input), fields(conversation = ?input.conversation_id))]
    pub async fn handle(&self, input: ChatInput) -> Result<ChatReply> {
        let message = input.message.trim();
        if message.is_empty() {
            return Err(Error::InvalidInput("message is empty".to_string()));
        }

        let conversation_id = input
            .conversation_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let capability = input.capability.unwrap_or(self.config.capability);
        let language = input.language.unwrap_or(self.config.language);

        let context = self.gather_context(message, &conversation_id).await?;
        let context_items = context.item_count();
        let system_prompt = build_system_prompt(language, &context.render());

        let request = self.compose_request(&input, message, &conversation_id, system_prompt);
        let result = self.gateway.generate(capability, &request, None).await;

        let degraded = result.is_degraded();
        let withheld = !result.validated;
        let content = if withheld {
            warn!(
                backend = %result.backend,
                "Reply failed safety validation, showing fallback text"
            );
            safety_fallback(language).to_string()
        } else {
            result.content.clone()
        };

        let persisted = if degraded {
            debug!("Degraded reply not persisted");
            false
        } else {
            self.persist(&conversation_id, message, &content).await
        };

        info!(
            conversation = %conversation_id,
            backend = %result.backend,
            capability = %capability,
            withheld = withheld,
            degraded = degraded,
            context_items = context_items,
            "Chat turn handled"
        );

        Ok(ChatReply {
            conversation_id,
            content,
            withheld,
            degraded,
            backend: result.backend,
            model: result.model,
            capability,
            context_items,
            persisted,
        })
    }

    async fn gather_context(&self, message: &str, conversation_id: &str) -> Result<UnifiedContext> {
        let Some(memory) = &self.memory else {
            return Ok(UnifiedContext::empty());
        };

        let query = MemoryQuery::new(message).with_conversation(conversation_id);
        match memory.build_unified_context(&query).await {
            Ok(context) => Ok(context),
            Err(medassist_memory::Error::NoBackends) => {
                Err(Error::Memory(medassist_memory::Error::NoBackends))
            }
            Err(e) => {
                warn!(error = %e, "Memory context unavailable, continuing without it");
                Ok(UnifiedContext::empty())
            }
        }
    }

    fn compose_request(
        &self,
        input: &ChatInput,
        message: &str,
        conversation_id: &str,
        system_prompt: String,
    ) -> GenerationRequest {
        let history: Vec<Message> = input
            .history
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .cloned()
            .collect();
        let skip = history.len().saturating_sub(self.config.max_history_turns);

        let mut request = GenerationRequest::new()
            .with_system_prompt(system_prompt)
            .with_messages(history.into_iter().skip(skip))
            .with_message(Message::user(message))
            .with_temperature(self.config.temperature)
            .with_safety_context("domain", self.config.domain.clone())
            .with_safety_context("safety_level", self.config.safety_level.clone())
            .with_session_id(conversation_id);

        if let Some(max_tokens) = self.config.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }
        if let Some(subject_id) = &input.subject_id {
            request = request.with_subject_id(subject_id.clone());
        }
        request
    }

    async fn persist(&self, conversation_id: &str, user_message: &str, reply: &str) -> bool {
        let Some(memory) = &self.memory else {
            return false;
        };
        match memory
            .store_conversation_turn(conversation_id, user_message, reply)
            .await
        {
            Ok(stored) => !stored.is_empty(),
            Err(e) => {
                warn!(error = %e, "Failed to persist chat turn");
                false
            }
        }
    }
}
