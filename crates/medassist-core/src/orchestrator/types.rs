//! Orchestrator input and output types

use crate::prompt::Language;
use medassist_llm::{Capability, Message};
use serde::{Deserialize, Serialize};

/// One patient message to answer
#[derive(Debug, Clone)]
pub struct ChatInput {
    /// Conversation the turn belongs to; a new one is started when `None`
    pub conversation_id: Option<String>,
    /// Patient message
    pub message: String,
    /// Earlier turns, oldest first
    pub history: Vec<Message>,
    /// Capability override
    pub capability: Option<Capability>,
    /// Language override
    pub language: Option<Language>,
    /// Patient identifier
    pub subject_id: Option<String>,
}

impl ChatInput {
    /// Create a new input
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            conversation_id: None,
            message: message.into(),
            history: Vec::new(),
            capability: None,
            language: None,
            subject_id: None,
        }
    }

    /// Continue an existing conversation
    #[must_use]
    pub fn with_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    /// Attach earlier turns
    #[must_use]
    pub fn with_history(mut self, history: Vec<Message>) -> Self {
        self.history = history;
        self
    }

    /// Request a specific capability
    #[must_use]
    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capability = Some(capability);
        self
    }

    /// Reply in a specific language
    #[must_use]
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = Some(language);
        self
    }

    /// Attach the patient identifier
    #[must_use]
    pub fn with_subject(mut self, subject_id: impl Into<String>) -> Self {
        self.subject_id = Some(subject_id.into());
        self
    }
}

/// What the patient gets back
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    /// Conversation the turn was recorded under
    pub conversation_id: String,
    /// Text to display
    pub content: String,
    /// Generated text was replaced by the safety fallback
    pub withheld: bool,
    /// Every backend failed and the degraded reply was used
    pub degraded: bool,
    /// Backend that produced the reply
    pub backend: String,
    /// Model that produced the reply
    pub model: String,
    /// Capability the turn was routed with
    pub capability: Capability,
    /// Memory items that went into the prompt
    pub context_items: usize,
    /// Whether the exchange reached at least one memory store
    pub persisted: bool,
}
