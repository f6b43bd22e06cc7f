//! Memory coordinator: fan-out, weighting and merging across backends.
//!
//! The registry is fixed once [`MemoryCoordinatorBuilder::build`] returns.
//! A search queries every selected backend concurrently, bounds each call by
//! the fan-out budget measured from its start, and keeps per-kind results in
//! a deterministic order. A backend that fails or runs late contributes an
//! empty entry; only an empty backend set is an error.

#[cfg(test)]
mod tests;

use crate::backend::MemoryBackend;
use crate::config::CoordinatorConfig;
use crate::context::{ContextSection, UnifiedContext};
use crate::error::{Error, Result};
use crate::types::{
    HealthSummary, MemoryKind, MemoryQueryResult, MemoryRecord, NewRecord, SearchFilters,
};
use futures::future::join_all;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::time::{timeout, Instant};
use tracing::{debug, info, instrument, warn};

/// A query against the memory coordinator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryQuery {
    /// Free text to search for
    pub text: String,
    /// Conversation scope, passed to backends as a filter hint
    pub conversation_id: Option<String>,
    /// Backends to query; all registered when `None`
    pub kinds: Option<Vec<MemoryKind>>,
    /// Per-kind weights overriding the configured defaults
    pub weights: BTreeMap<MemoryKind, f32>,
    /// Results requested per backend; configured default when `None`
    pub limit_per_backend: Option<usize>,
}

impl MemoryQuery {
    /// Query for `text` across all registered backends.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Scope the query to one conversation.
    #[must_use]
    pub fn with_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    /// Restrict the query to the given kinds.
    #[must_use]
    pub fn with_kinds(mut self, kinds: impl IntoIterator<Item = MemoryKind>) -> Self {
        self.kinds = Some(kinds.into_iter().collect());
        self
    }

    /// Override the weight of one kind.
    #[must_use]
    pub fn with_weight(mut self, kind: MemoryKind, weight: f32) -> Self {
        self.weights.insert(kind, weight);
        self
    }

    /// Override the per-backend limit.
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit_per_backend = Some(limit);
        self
    }

    fn filters(&self) -> SearchFilters {
        SearchFilters {
            conversation_id: self.conversation_id.clone(),
        }
    }
}

/// Builder for [`MemoryCoordinator`].
#[derive(Default)]
pub struct MemoryCoordinatorBuilder {
    backends: BTreeMap<MemoryKind, Arc<dyn MemoryBackend>>,
    config: CoordinatorConfig,
}

impl MemoryCoordinatorBuilder {
    /// Register a backend under its own kind, replacing any previous one.
    #[must_use]
    pub fn register(mut self, backend: Arc<dyn MemoryBackend>) -> Self {
        let kind = backend.kind();
        if let Some(previous) = self.backends.insert(kind, backend) {
            warn!(kind = %kind, replaced = previous.name(), "Memory backend replaced");
        }
        self
    }

    /// Use the given configuration.
    #[must_use]
    pub fn with_config(mut self, config: CoordinatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Freeze the registry.
    #[must_use]
    pub fn build(self) -> MemoryCoordinator {
        info!(
            backends = ?self.backends.keys().collect::<Vec<_>>(),
            "Memory coordinator ready"
        );
        MemoryCoordinator {
            backends: self.backends,
            config: self.config,
        }
    }
}

struct Planned {
    kind: MemoryKind,
    backend: Arc<dyn MemoryBackend>,
    weight: f32,
    keep: usize,
}

/// Fans queries out to the registered memory backends.
pub struct MemoryCoordinator {
    backends: BTreeMap<MemoryKind, Arc<dyn MemoryBackend>>,
    config: CoordinatorConfig,
}

impl MemoryCoordinator {
    /// Start building a coordinator.
    #[must_use]
    pub fn builder() -> MemoryCoordinatorBuilder {
        MemoryCoordinatorBuilder::default()
    }

    /// Registered kinds, in section order.
    #[must_use]
    pub fn registered_kinds(&self) -> Vec<MemoryKind> {
        self.backends.keys().copied().collect()
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    fn backend(&self, kind: MemoryKind) -> Result<&Arc<dyn MemoryBackend>> {
        self.backends.get(&kind).ok_or(Error::NotRegistered(kind))
    }

    fn weight_for(&self, query: &MemoryQuery, kind: MemoryKind) -> f32 {
        query
            .weights
            .get(&kind)
            .or_else(|| self.config.default_weights.get(&kind))
            .copied()
            .unwrap_or(1.0)
    }

    /// Items kept for a kind: `ceil(limit * weight)` within `[1, limit]`.
    fn kept_count(limit: usize, weight: f32) -> usize {
        let scaled = (limit as f32 * weight).ceil();
        (scaled as usize).clamp(1, limit.max(1))
    }

    fn plan(&self, query: &MemoryQuery, limit: usize) -> Result<Vec<Planned>> {
        let kinds: Vec<MemoryKind> = match &query.kinds {
            Some(requested) => {
                let mut kinds = Vec::new();
                for kind in requested {
                    if !self.backends.contains_key(kind) {
                        warn!(kind = %kind, "Requested memory backend not registered, skipping");
                    } else if !kinds.contains(kind) {
                        kinds.push(*kind);
                    }
                }
                kinds
            }
            None => self.registered_kinds(),
        };

        if kinds.is_empty() {
            return Err(Error::NoBackends);
        }

        Ok(kinds
            .into_iter()
            .filter_map(|kind| {
                let weight = self.weight_for(query, kind);
                if weight <= 0.0 {
                    debug!(kind = %kind, weight = weight, "Memory backend weighted out");
                    return None;
                }
                let backend = self.backends.get(&kind)?.clone();
                Some(Planned {
                    kind,
                    backend,
                    weight,
                    keep: Self::kept_count(limit, weight),
                })
            })
            .collect())
    }

    async fn fan_out(
        &self,
        query: &MemoryQuery,
    ) -> Result<Vec<(MemoryKind, f32, Vec<MemoryQueryResult>)>> {
        let limit = query
            .limit_per_backend
            .unwrap_or(self.config.limit_per_backend);
        let plan = self.plan(query, limit)?;
        let filters = query.filters();
        let budget = self.config.per_backend_timeout().min(self.config.fanout_budget());
        let started = Instant::now();

        let calls = plan.into_iter().map(|planned| {
            let filters = &filters;
            async move {
                let outcome = timeout(
                    budget,
                    planned.backend.search(&query.text, limit, filters),
                )
                .await;

                let mut results = match outcome {
                    Ok(Ok(results)) => results,
                    Ok(Err(e)) => {
                        warn!(
                            kind = %planned.kind,
                            backend = planned.backend.name(),
                            error = %e,
                            "Memory backend search failed, continuing without it"
                        );
                        Vec::new()
                    }
                    Err(_) => {
                        warn!(
                            kind = %planned.kind,
                            backend = planned.backend.name(),
                            budget_ms = budget.as_millis() as u64,
                            "Memory backend search timed out, continuing without it"
                        );
                        Vec::new()
                    }
                };

                results.sort_by(crate::backends::by_relevance);
                results.truncate(planned.keep);
                (planned.kind, planned.weight, results)
            }
        });

        let entries = join_all(calls).await;
        debug!(
            backends = entries.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Memory fan-out complete"
        );
        Ok(entries)
    }

    /// Search the selected backends concurrently.
    ///
    /// Every queried kind has an entry, empty when its backend failed or
    /// missed the budget.
    #[instrument(skip(self, query), fields(conversation = ?query.conversation_id))]
    pub async fn search(
        &self,
        query: &MemoryQuery,
    ) -> Result<BTreeMap<MemoryKind, Vec<MemoryQueryResult>>> {
        let entries = self.fan_out(query).await?;
        Ok(entries
            .into_iter()
            .map(|(kind, _, results)| (kind, results))
            .collect())
    }

    /// Search and merge the results into one unified context.
    #[instrument(skip(self, query), fields(conversation = ?query.conversation_id))]
    pub async fn build_unified_context(&self, query: &MemoryQuery) -> Result<UnifiedContext> {
        let entries = self.fan_out(query).await?;
        let sections = entries
            .into_iter()
            .map(|(kind, weight, results)| ContextSection::new(kind, weight, results))
            .collect();
        let context = UnifiedContext::new(sections, self.config.char_budget);
        debug!(
            sections = context.sections().len(),
            items = context.item_count(),
            "Unified context built"
        );
        Ok(context)
    }

    /// Probe every backend concurrently.
    pub async fn health_summary(&self) -> HealthSummary {
        let budget = self.config.per_backend_timeout();
        let probes = self.backends.iter().map(|(kind, backend)| async move {
            let alive = timeout(budget, backend.health_check()).await.unwrap_or(false);
            if !alive {
                warn!(kind = %kind, backend = backend.name(), "Memory backend unhealthy");
            }
            (*kind, alive)
        });

        let backends: BTreeMap<MemoryKind, bool> = join_all(probes).await.into_iter().collect();
        let overall = backends.values().any(|alive| *alive);
        HealthSummary { backends, overall }
    }

    /// Store a record in one backend.
    pub async fn store(
        &self,
        kind: MemoryKind,
        key: Option<String>,
        entry: NewRecord,
    ) -> Result<String> {
        self.backend(kind)?.store(key, entry).await
    }

    /// Fetch a record from one backend.
    pub async fn retrieve(&self, kind: MemoryKind, key: &str) -> Result<Option<MemoryRecord>> {
        self.backend(kind)?.retrieve(key).await
    }

    /// Delete a record from one backend.
    pub async fn delete(&self, kind: MemoryKind, key: &str) -> Result<bool> {
        self.backend(kind)?.delete(key).await
    }

    /// Persist one user/assistant exchange to the recency and history stores.
    ///
    /// Returns the keys written per kind. Fails only when no store took it.
    #[instrument(skip(self, user_message, assistant_message))]
    pub async fn store_conversation_turn(
        &self,
        conversation_id: &str,
        user_message: &str,
        assistant_message: &str,
    ) -> Result<Vec<(MemoryKind, String)>> {
        let targets: Vec<(MemoryKind, &Arc<dyn MemoryBackend>)> =
            [MemoryKind::Recency, MemoryKind::LongTermHistory]
                .into_iter()
                .filter_map(|kind| self.backends.get(&kind).map(|b| (kind, b)))
                .collect();
        if targets.is_empty() {
            return Err(Error::NoBackends);
        }

        let entry = NewRecord::structured(json!({
            "user_message": user_message,
            "assistant_message": assistant_message,
        }))
        .with_conversation(conversation_id)
        .with_metadata("turn_type", "exchange");

        let writes = targets.iter().map(|(kind, backend)| {
            let entry = entry.clone();
            async move { (*kind, backend.store(None, entry).await) }
        });

        let mut stored = Vec::new();
        let mut last_error = None;
        for (kind, outcome) in join_all(writes).await {
            match outcome {
                Ok(key) => stored.push((kind, key)),
                Err(e) => {
                    warn!(kind = %kind, error = %e, "Failed to persist conversation turn");
                    last_error = Some(e);
                }
            }
        }

        match (stored.is_empty(), last_error) {
            (true, Some(e)) => Err(e),
            _ => Ok(stored),
        }
    }
}
