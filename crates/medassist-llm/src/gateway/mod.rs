//! Generation gateway
//!
//! Per `generate` call the gateway moves through
//! `Routing → Validating-Request → Calling(backend_i)` and ends in either
//! `Done` or `Degraded-Fallback`. Backends are tried strictly one after
//! another; a reply that fails response validation ends the walk.

mod stats;

#[cfg(test)]
mod tests;

pub use stats::{GatewayStats, GatewayStatsSnapshot};

use crate::adapter::{BackendAdapter, BackendHealth};
use crate::capability::{BackendDescriptor, Capability};
use crate::config::{GatewayConfig, DEFAULT_DEGRADED_MESSAGE};
use crate::error::{Error, Result};
use crate::request::{GenerationRequest, GenerationResult, CAPABILITY_CONTEXT_KEY};
use crate::retry::{RetryCause, RetryError, RetryExecutor};
use crate::router::{BackendRegistry, CapabilityRouter};
use crate::validation::ValidationPipeline;
use futures::future::join_all;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout, Instant};
use tracing::{debug, info, instrument, warn};

/// Backend id reported on degraded results
pub const DEGRADED_BACKEND: &str = "degraded";

/// Model name reported on degraded results
pub const DEGRADED_MODEL: &str = "error_fallback";

/// Always-answering generation entry point
pub struct GenerationGateway {
    router: CapabilityRouter,
    validation: ValidationPipeline,
    retry: RetryExecutor,
    deadline: Option<Duration>,
    degraded_message: String,
    stats: GatewayStats,
}

impl GenerationGateway {
    /// Assemble a gateway from its parts
    #[must_use]
    pub fn new(router: CapabilityRouter, validation: ValidationPipeline, retry: RetryExecutor) -> Self {
        Self {
            router,
            validation,
            retry,
            deadline: None,
            degraded_message: DEFAULT_DEGRADED_MESSAGE.to_string(),
            stats: GatewayStats::default(),
        }
    }

    /// Build a gateway over `registry` from configuration
    pub fn from_config(registry: Arc<BackendRegistry>, config: &GatewayConfig) -> Result<Self> {
        let router = CapabilityRouter::new(registry, config.routing_table());
        let validation = ValidationPipeline::new(config.validation.clone())?;
        let retry = RetryExecutor::new(config.retry_config());
        let mut gateway = Self::new(router, validation, retry)
            .with_degraded_message(config.degraded_message.clone());
        gateway.deadline = config.deadline();
        Ok(gateway)
    }

    /// Bound every `generate` call by an overall deadline
    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Replace the degraded reply text
    #[must_use]
    pub fn with_degraded_message(mut self, message: impl Into<String>) -> Self {
        self.degraded_message = message.into();
        self
    }

    /// Router in use
    #[must_use]
    pub fn router(&self) -> &CapabilityRouter {
        &self.router
    }

    /// Validation pipeline in use
    #[must_use]
    pub fn validation(&self) -> &ValidationPipeline {
        &self.validation
    }

    /// Descriptors of all registered backends
    #[must_use]
    pub fn descriptors(&self) -> Vec<BackendDescriptor> {
        self.router.registry().descriptors()
    }

    /// Counter snapshot
    #[must_use]
    pub fn stats(&self) -> GatewayStatsSnapshot {
        self.stats.snapshot()
    }

    /// Generate a reply for `capability`; never fails
    ///
    /// `explicit_fallbacks` replaces the routing table's preference list for
    /// the fallback walk.
    #[instrument(skip(self, request, explicit_fallbacks), fields(capability = %capability))]
    pub async fn generate(
        &self,
        capability: Capability,
        request: &GenerationRequest,
        explicit_fallbacks: Option<&[String]>,
    ) -> GenerationResult {
        self.stats.record_request();
        let deadline = self.deadline.map(|d| Instant::now() + d);

        let request_warnings: Vec<String> = self
            .validation
            .validate_request(request)
            .iter()
            .map(ToString::to_string)
            .collect();

        let mut request = request.clone();
        request
            .safety_context
            .insert(CAPABILITY_CONTEXT_KEY.to_string(), capability.as_str().to_string());

        let plan = match self.router.plan(capability, explicit_fallbacks) {
            Ok(plan) => plan,
            Err(e) => {
                warn!(error = %e, "Routing failed");
                return self.degraded(capability, Some(e.to_string()), Vec::new());
            }
        };

        let req = &request;
        let mut tried: Vec<String> = Vec::with_capacity(plan.len());
        let mut last_error: Option<String> = None;

        for (position, adapter) in plan.iter().enumerate() {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                warn!(backend = %adapter.id(), "Deadline reached before backend could be tried");
                last_error.get_or_insert_with(|| "deadline exceeded".to_string());
                break;
            }
            if position > 0 {
                info!(backend = %adapter.id(), position = position, "Falling back to next backend");
            }
            tried.push(adapter.id().to_string());

            let backend: &dyn BackendAdapter = adapter.as_ref();
            let attempts = AtomicU32::new(0);
            let counter = &attempts;
            let outcome = self
                .retry
                .run(
                    move |budget| {
                        counter.fetch_add(1, Ordering::Relaxed);
                        backend.call(req, budget)
                    },
                    |e: &Error| e.is_transient(),
                    deadline,
                )
                .await;

            match outcome {
                Ok(result) => {
                    let attempts = attempts.load(Ordering::Relaxed);
                    return self.finish(result, req, position > 0, attempts, &tried, request_warnings);
                }
                Err(e) => {
                    let description = describe_failure(&e);
                    warn!(
                        backend = %adapter.id(),
                        attempts = e.attempts,
                        error = %description,
                        "Backend exhausted"
                    );
                    last_error = Some(description);
                }
            }
        }

        self.degraded(capability, last_error, tried)
    }

    /// Probe every registered backend concurrently
    pub async fn health_check_all(&self) -> Vec<BackendHealth> {
        let budget = self.retry.config().attempt_timeout;
        let probes = self.router.registry().iter().map(|adapter| {
            let adapter = adapter.clone();
            async move {
                match timeout(budget, adapter.health_check()).await {
                    Ok(health) => health,
                    Err(_) => BackendHealth::dead(&adapter.descriptor(), "health check timed out"),
                }
            }
        });
        join_all(probes).await
    }

    fn finish(
        &self,
        mut result: GenerationResult,
        request: &GenerationRequest,
        via_fallback: bool,
        attempts: u32,
        tried: &[String],
        mut warnings: Vec<String>,
    ) -> GenerationResult {
        let report = self.validation.inspect_response(&result.content, request);
        warnings.extend(report.warnings.iter().map(ToString::to_string));

        result.validated = report.safe;
        result.insert_metadata("attempts", attempts);
        result.insert_metadata("backends_tried", tried.to_vec());
        result.insert_metadata("fallback_used", via_fallback);
        if let Some(capability) = request.safety_context.get(CAPABILITY_CONTEXT_KEY) {
            result.insert_metadata("capability", capability.as_str());
        }
        if !warnings.is_empty() {
            result.insert_metadata("validation_warnings", warnings);
        }

        if report.safe {
            self.stats.record_success(via_fallback);
            info!(
                backend = %result.backend,
                attempts = attempts,
                fallback_used = via_fallback,
                "Generation succeeded"
            );
        } else {
            self.stats.record_safety_rejection();
            result.insert_metadata("safety_rejected", true);
            result.insert_metadata("denylist_matches", report.denylist_matches);
            warn!(backend = %result.backend, "Generated reply failed safety validation");
        }
        result
    }

    fn degraded(
        &self,
        capability: Capability,
        last_error: Option<String>,
        tried: Vec<String>,
    ) -> GenerationResult {
        self.stats.record_degraded();
        warn!(
            capability = %capability,
            backends_tried = ?tried,
            "All generation backends failed, returning degraded reply"
        );

        let mut result = GenerationResult::new(self.degraded_message.clone(), DEGRADED_BACKEND, DEGRADED_MODEL);
        result.validated = true;
        result.insert_metadata("fallback", true);
        result.insert_metadata(
            "error",
            last_error.unwrap_or_else(|| "no backend attempted".to_string()),
        );
        result.insert_metadata("backends_tried", tried);
        result.insert_metadata("capability", capability.as_str());
        debug!("Degraded reply prepared");
        result
    }
}

fn describe_failure(error: &RetryError<Error>) -> String {
    match &error.cause {
        RetryCause::Failed(e) => e.to_string(),
        RetryCause::TimedOut(budget) => Error::Timeout(budget.as_millis() as u64).to_string(),
    }
}

impl std::fmt::Debug for GenerationGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationGateway")
            .field("router", &self.router)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}
