//! Scripted backend adapter for testing
//!
//! Plays back queued outcomes, then repeats a default outcome.

use crate::adapter::{BackendAdapter, BackendHealth};
use crate::capability::{BackendDescriptor, Capability};
use crate::error::{Error, Result};
use crate::request::{GenerationRequest, GenerationResult, TokenUsage};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// One scripted call outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedOutcome {
    /// Succeed with this text
    Reply(String),
    /// Fail with a transient error (backend unavailable)
    Transient,
    /// Fail with a rate limit (transient)
    RateLimited,
    /// Fail with a fatal error (authentication)
    Fatal,
    /// Never answer
    Hang,
}

impl ScriptedOutcome {
    /// Shorthand for [`ScriptedOutcome::Reply`]
    #[must_use]
    pub fn reply(text: impl Into<String>) -> Self {
        Self::Reply(text.into())
    }
}

/// A backend adapter that returns queued outcomes
pub struct ScriptedAdapter {
    descriptor: BackendDescriptor,
    script: Mutex<VecDeque<ScriptedOutcome>>,
    default_outcome: ScriptedOutcome,
    latency: Option<Duration>,
    alive: bool,
    calls: AtomicU32,
    last_request: Mutex<Option<GenerationRequest>>,
}

impl ScriptedAdapter {
    /// Adapter answering "scripted reply from {id}" until scripted otherwise
    #[must_use]
    pub fn new(id: impl Into<String>, capabilities: Vec<Capability>) -> Self {
        let id = id.into();
        let default_outcome = ScriptedOutcome::Reply(format!("scripted reply from {id}"));
        Self {
            descriptor: BackendDescriptor::new(id, "scripted-model", capabilities),
            script: Mutex::new(VecDeque::new()),
            default_outcome,
            latency: None,
            alive: true,
            calls: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Adapter declaring every capability
    #[must_use]
    pub fn universal(id: impl Into<String>) -> Self {
        Self::new(id, Capability::ALL.to_vec())
    }

    /// Outcome used once the script is empty
    #[must_use]
    pub fn with_default(mut self, outcome: ScriptedOutcome) -> Self {
        self.default_outcome = outcome;
        self
    }

    /// Queue outcomes ahead of the default
    #[must_use]
    pub fn with_script(self, outcomes: impl IntoIterator<Item = ScriptedOutcome>) -> Self {
        for outcome in outcomes {
            self.push(outcome);
        }
        self
    }

    /// Delay every call
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Health probe result
    #[must_use]
    pub fn with_alive(mut self, alive: bool) -> Self {
        self.alive = alive;
        self
    }

    /// Append one outcome to the script
    pub fn push(&self, outcome: ScriptedOutcome) {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(outcome);
    }

    /// Number of `call` invocations so far
    #[must_use]
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// The request seen by the most recent `call`
    #[must_use]
    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.last_request
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn next_outcome(&self) -> ScriptedOutcome {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_else(|| self.default_outcome.clone())
    }
}

#[async_trait::async_trait]
impl BackendAdapter for ScriptedAdapter {
    fn id(&self) -> &str {
        &self.descriptor.id
    }

    fn descriptor(&self) -> BackendDescriptor {
        self.descriptor.clone()
    }

    fn capabilities(&self) -> &[Capability] {
        &self.descriptor.capabilities
    }

    async fn call(&self, request: &GenerationRequest, _timeout: Duration) -> Result<GenerationResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap_or_else(|e| e.into_inner()) = Some(request.clone());
        let outcome = self.next_outcome();
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        match outcome {
            ScriptedOutcome::Reply(text) => {
                let prompt_tokens = request.messages.len() as u32;
                let completion_tokens = text.split_whitespace().count() as u32;
                Ok(GenerationResult::new(text, self.id(), &self.descriptor.model)
                    .with_usage(TokenUsage::new(prompt_tokens, completion_tokens)))
            }
            ScriptedOutcome::Transient => Err(Error::Unavailable(format!("{} is overloaded", self.id()))),
            ScriptedOutcome::RateLimited => Err(Error::RateLimit),
            ScriptedOutcome::Fatal => Err(Error::Authentication(format!("{} rejected credentials", self.id()))),
            ScriptedOutcome::Hang => futures::future::pending().await,
        }
    }

    async fn health_check(&self) -> BackendHealth {
        if self.alive {
            BackendHealth::alive(&self.descriptor)
        } else {
            BackendHealth::dead(&self.descriptor, "scripted as down")
        }
    }
}
