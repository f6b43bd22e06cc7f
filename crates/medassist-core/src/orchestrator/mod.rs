//! Chat orchestrator - one patient turn end to end
//!
//! Per turn the orchestrator gathers memory context, composes the request,
//! asks the generation gateway for a reply, withholds replies that failed
//! safety validation and persists the exchange.
//!
//! # Module Structure
//!
//! - `config`: `OrchestratorConfig`
//! - `types`: `ChatInput`, `ChatReply`
//! - `core`: `ChatOrchestrator` and its turn handling

mod config;
mod core;
mod types;


pub use config::OrchestratorConfig;
pub use core::ChatOrchestrator;
pub use types::{ChatInput, ChatReply};
