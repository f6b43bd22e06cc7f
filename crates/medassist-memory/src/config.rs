//! Memory coordinator configuration.

use crate::types::MemoryKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

fn default_weights() -> BTreeMap<MemoryKind, f32> {
    BTreeMap::from([
        (MemoryKind::Recency, 1.0),
        (MemoryKind::Similarity, 1.0),
        (MemoryKind::LongTermHistory, 0.5),
        (MemoryKind::WorkflowGraph, 0.8),
    ])
}

fn default_limit_per_backend() -> usize {
    5
}

fn default_per_backend_timeout_ms() -> u64 {
    2_000
}

fn default_fanout_budget_ms() -> u64 {
    3_000
}

fn default_char_budget() -> usize {
    4_000
}

fn default_recency_window() -> usize {
    crate::backends::recency::DEFAULT_WINDOW
}

fn default_recency_ttl_secs() -> u64 {
    crate::backends::recency::DEFAULT_TTL.as_secs()
}

/// Configuration for the memory coordinator and its reference backends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Section weight per kind when the caller gives none.
    #[serde(default = "default_weights")]
    pub default_weights: BTreeMap<MemoryKind, f32>,
    /// Results requested from each backend.
    #[serde(default = "default_limit_per_backend")]
    pub limit_per_backend: usize,
    /// Upper bound on a single backend call.
    #[serde(default = "default_per_backend_timeout_ms")]
    pub per_backend_timeout_ms: u64,
    /// Upper bound on a whole fan-out, measured from its start.
    #[serde(default = "default_fanout_budget_ms")]
    pub fanout_budget_ms: u64,
    /// Maximum rendered context length in characters.
    #[serde(default = "default_char_budget")]
    pub char_budget: usize,
    /// Records kept per conversation by the recency window.
    #[serde(default = "default_recency_window")]
    pub recency_window: usize,
    /// Lifetime of a recency record.
    #[serde(default = "default_recency_ttl_secs")]
    pub recency_ttl_secs: u64,
    /// SQLite file of the history store. Defaults to the user data dir.
    #[serde(default)]
    pub history_path: Option<PathBuf>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            default_weights: default_weights(),
            limit_per_backend: default_limit_per_backend(),
            per_backend_timeout_ms: default_per_backend_timeout_ms(),
            fanout_budget_ms: default_fanout_budget_ms(),
            char_budget: default_char_budget(),
            recency_window: default_recency_window(),
            recency_ttl_secs: default_recency_ttl_secs(),
            history_path: None,
        }
    }
}

impl CoordinatorConfig {
    /// Per-backend call timeout.
    #[must_use]
    pub fn per_backend_timeout(&self) -> Duration {
        Duration::from_millis(self.per_backend_timeout_ms)
    }

    /// Whole fan-out budget.
    #[must_use]
    pub fn fanout_budget(&self) -> Duration {
        Duration::from_millis(self.fanout_budget_ms)
    }

    /// Recency record lifetime.
    #[must_use]
    pub fn recency_ttl(&self) -> Duration {
        Duration::from_secs(self.recency_ttl_secs)
    }

    /// Configured history path, or `<data dir>/medassist/history.db`.
    #[must_use]
    pub fn resolved_history_path(&self) -> PathBuf {
        self.history_path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("medassist")
                .join("history.db")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let config: CoordinatorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.limit_per_backend, 5);
        assert_eq!(config.default_weights[&MemoryKind::LongTermHistory], 0.5);
        assert_eq!(config.recency_window, 20);
        assert_eq!(config.recency_ttl(), Duration::from_secs(3600));
    }

    #[test]
    fn test_weights_keyed_by_kind_name() {
        let config: CoordinatorConfig =
            serde_json::from_str(r#"{"default_weights": {"similarity": 0.3}}"#).unwrap();
        assert_eq!(config.default_weights.len(), 1);
        assert_eq!(config.default_weights[&MemoryKind::Similarity], 0.3);
    }

    #[test]
    fn test_history_path_override() {
        let config = CoordinatorConfig {
            history_path: Some(PathBuf::from("/tmp/h.db")),
            ..CoordinatorConfig::default()
        };
        assert_eq!(config.resolved_history_path(), PathBuf::from("/tmp/h.db"));
        assert!(CoordinatorConfig::default()
            .resolved_history_path()
            .ends_with("medassist/history.db"));
    }
}
