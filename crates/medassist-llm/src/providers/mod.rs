//! HTTP generation backends

/// Anthropic messages API adapter
pub mod anthropic;
/// OpenAI chat-completions compatible adapter (OpenAI, Groq)
pub mod openai_compat;

pub use anthropic::{AnthropicAdapter, AnthropicConfig};
pub use openai_compat::{OpenAiCompatibleAdapter, OpenAiCompatibleConfig};
