//! Global atomic counters for summarizer and gate observability.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. at the end of a CLI invocation).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Atomic counters shared by the summarizer and the gate.
pub struct Metrics {
    observations_scanned: AtomicU64,
    observations_skipped: AtomicU64,
    rules_evaluated: AtomicU64,
    rules_failed: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            observations_scanned: AtomicU64::new(0),
            observations_skipped: AtomicU64::new(0),
            rules_evaluated: AtomicU64::new(0),
            rules_failed: AtomicU64::new(0),
        }
    }

    /// Add to the observations-scanned counter.
    pub fn add_observations_scanned(&self, count: u64) {
        self.observations_scanned.fetch_add(count, Ordering::Relaxed);
        tracing::trace!(metric = "observations_scanned", count, "counter incremented");
    }

    /// Add to the observations-skipped counter (missing metric or group field).
    pub fn add_observations_skipped(&self, count: u64) {
        self.observations_skipped.fetch_add(count, Ordering::Relaxed);
        tracing::trace!(metric = "observations_skipped", count, "counter incremented");
    }

    /// Record one evaluated rule and whether it failed.
    pub fn record_rule(&self, passed: bool) {
        self.rules_evaluated.fetch_add(1, Ordering::Relaxed);
        if !passed {
            self.rules_failed.fetch_add(1, Ordering::Relaxed);
        }
        tracing::trace!(metric = "rules_evaluated", passed, "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            observations_scanned = self.observations_scanned(),
            observations_skipped = self.observations_skipped(),
            rules_evaluated = self.rules_evaluated(),
            rules_failed = self.rules_failed(),
        );
    }

    pub fn observations_scanned(&self) -> u64 {
        self.observations_scanned.load(Ordering::Relaxed)
    }

    pub fn observations_skipped(&self) -> u64 {
        self.observations_skipped.load(Ordering::Relaxed)
    }

    pub fn rules_evaluated(&self) -> u64 {
        self.rules_evaluated.load(Ordering::Relaxed)
    }

    pub fn rules_failed(&self) -> u64 {
        self.rules_failed.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.observations_scanned.store(0, Ordering::Relaxed);
        self.observations_skipped.store(0, Ordering::Relaxed);
        self.rules_evaluated.store(0, Ordering::Relaxed);
        self.rules_failed.store(0, Ordering::Relaxed);
    }
}
