//! Request metrics
//!
//! Process-wide counters shared by every orchestrator built from the same context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Atomic metrics accumulator
#[derive(Debug)]
pub struct Metrics {
    enabled: bool,
    started_at: DateTime<Utc>,
    requests: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
    retries: AtomicU64,
    rate_limit_waits: AtomicU64,
    batch_fallbacks: AtomicU64,
    total_latency_ms: AtomicU64,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub started_at: DateTime<Utc>,
    pub requests: u64,
    pub successes: u64,
    pub failures: u64,
    pub retries: u64,
    pub rate_limit_waits: u64,
    pub batch_fallbacks: u64,
    pub average_latency_ms: u64,
}

impl Metrics {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            started_at: Utc::now(),
            requests: AtomicU64::new(0),
            successes: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            retries: AtomicU64::new(0),
            rate_limit_waits: AtomicU64::new(0),
            batch_fallbacks: AtomicU64::new(0),
            total_latency_ms: AtomicU64::new(0),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn bump(&self, counter: &AtomicU64, by: u64) {
        if self.enabled {
            counter.fetch_add(by, Ordering::Relaxed);
        }
    }

    pub fn record_request(&self) {
        self.bump(&self.requests, 1);
    }

    pub fn record_success(&self, latency: Duration) {
        self.bump(&self.successes, 1);
        self.bump(&self.total_latency_ms, latency.as_millis() as u64);
    }

    pub fn record_failure(&self) {
        self.bump(&self.failures, 1);
    }

    pub fn record_retry(&self) {
        self.bump(&self.retries, 1);
    }

    pub fn record_rate_limit(&self) {
        self.bump(&self.rate_limit_waits, 1);
    }

    pub fn record_batch_fallback(&self, items: usize) {
        self.bump(&self.batch_fallbacks, items as u64);
    }

    /// Take a consistent-enough copy of the counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        let successes = self.successes.load(Ordering::Relaxed);
        let total_latency = self.total_latency_ms.load(Ordering::Relaxed);
        MetricsSnapshot {
            started_at: self.started_at,
            requests: self.requests.load(Ordering::Relaxed),
            successes,
            failures: self.failures.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            rate_limit_waits: self.rate_limit_waits.load(Ordering::Relaxed),
            batch_fallbacks: self.batch_fallbacks.load(Ordering::Relaxed),
            average_latency_ms: if successes == 0 { 0 } else { total_latency / successes },
        }
    }

    pub fn reset(&self) {
        for counter in [
            &self.requests,
            &self.successes,
            &self.failures,
            &self.retries,
            &self.rate_limit_waits,
            &self.batch_fallbacks,
            &self.total_latency_ms,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new(true)
    }
}
