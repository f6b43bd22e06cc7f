//! MedAssist LLM - Capability-Routed Generation Gateway
//!
//! This crate turns a set of interchangeable generation backends into one
//! always-answering medical generation service:
//! - Adapter: the uniform `BackendAdapter` contract every backend implements
//! - Validation: request warnings and response denylist/disclaimer checks
//! - Retry: bounded exponential backoff with per-attempt timeouts
//! - Router: capability-aware primary and fallback selection
//! - Gateway: sequential failover ending in a safe degraded reply
//! - Providers: OpenAI-compatible (OpenAI, Groq) and Anthropic HTTP adapters

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod adapter;
pub mod capability;
pub mod config;
pub mod error;
pub mod gateway;
pub mod message;
pub mod mock;
pub mod providers;
pub mod request;
pub mod retry;
pub mod router;
pub mod util;
pub mod validation;

pub use adapter::{BackendAdapter, BackendHealth};
pub use capability::{BackendDescriptor, Capability};
pub use config::{BackendConfig, BackendKind, GatewayConfig, RetrySettings};
pub use error::{Error, FailureClass, Result};
pub use gateway::{GatewayStats, GatewayStatsSnapshot, GenerationGateway};
pub use message::{Message, MessageRole};
pub use mock::{ScriptedAdapter, ScriptedOutcome};
pub use providers::{AnthropicAdapter, AnthropicConfig, OpenAiCompatibleAdapter, OpenAiCompatibleConfig};
pub use request::{GenerationRequest, GenerationResult, TokenUsage};
pub use retry::{RetryCause, RetryConfig, RetryError, RetryExecutor};
pub use router::{BackendRegistry, CapabilityRouter, RoutingTable};
pub use validation::{ResponseReport, ValidationConfig, ValidationPipeline, ValidationWarning};
