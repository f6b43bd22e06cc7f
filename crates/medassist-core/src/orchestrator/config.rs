//! Orchestrator configuration

use crate::prompt::Language;
use medassist_llm::Capability;
use serde::{Deserialize, Serialize};

fn default_capability() -> Capability {
    Capability::ClinicalConversation
}

fn default_temperature() -> f32 {
    0.3
}

fn default_domain() -> String {
    "obesity_treatment".to_string()
}

fn default_safety_level() -> String {
    "standard".to_string()
}

fn default_max_history_turns() -> usize {
    10
}

/// Configuration for the chat orchestrator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Capability requested when the input names none
    #[serde(default = "default_capability")]
    pub capability: Capability,
    /// Sampling temperature sent with every request
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Optional output token cap
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// `domain` safety-context value
    #[serde(default = "default_domain")]
    pub domain: String,
    /// `safety_level` safety-context value
    #[serde(default = "default_safety_level")]
    pub safety_level: String,
    /// Reply language when the input names none
    #[serde(default)]
    pub language: Language,
    /// Most recent caller-supplied history turns forwarded to the backend
    #[serde(default = "default_max_history_turns")]
    pub max_history_turns: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            capability: default_capability(),
            temperature: default_temperature(),
            max_tokens: None,
            domain: default_domain(),
            safety_level: default_safety_level(),
            language: Language::default(),
            max_history_turns: default_max_history_turns(),
        }
    }
}
