//! Advisory gateway counters

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Append-only counters; values are advisory, not transactional
#[derive(Debug, Default)]
pub struct GatewayStats {
    requests: AtomicU64,
    primary_successes: AtomicU64,
    fallback_successes: AtomicU64,
    safety_rejections: AtomicU64,
    degraded: AtomicU64,
}

/// Point-in-time copy of [`GatewayStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayStatsSnapshot {
    /// `generate` calls
    pub requests: u64,
    /// Answered by the primary backend
    pub primary_successes: u64,
    /// Answered by a fallback backend
    pub fallback_successes: u64,
    /// Replies that failed response validation
    pub safety_rejections: u64,
    /// Degraded replies after total exhaustion
    pub degraded: u64,
}

impl GatewayStats {
    pub(crate) fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_success(&self, via_fallback: bool) {
        let counter = if via_fallback {
            &self.fallback_successes
        } else {
            &self.primary_successes
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_safety_rejection(&self) {
        self.safety_rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_degraded(&self) {
        self.degraded.fetch_add(1, Ordering::Relaxed);
    }

    /// Read all counters
    #[must_use]
    pub fn snapshot(&self) -> GatewayStatsSnapshot {
        GatewayStatsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            primary_successes: self.primary_successes.load(Ordering::Relaxed),
            fallback_successes: self.fallback_successes.load(Ordering::Relaxed),
            safety_rejections: self.safety_rejections.load(Ordering::Relaxed),
            degraded: self.degraded.load(Ordering::Relaxed),
        }
    }
}
