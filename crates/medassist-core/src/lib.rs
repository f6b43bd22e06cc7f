//! MedAssist Core - Chat Orchestration
//!
//! This crate ties the generation gateway and the memory coordinator into
//! one patient-facing chat turn:
//! - Orchestrator: context gathering, request composition, safety
//!   withholding and turn persistence
//! - Prompt: bilingual system prompts and fixed fallback texts
//! - Error: unified error type over the gateway and memory crates

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod orchestrator;
pub mod prompt;

pub use error::{format_error_for_cli, Error, Result, UserFriendlyError};
pub use orchestrator::{ChatInput, ChatOrchestrator, ChatReply, OrchestratorConfig};
pub use prompt::{build_system_prompt, safety_fallback, Language};
