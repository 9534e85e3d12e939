//! Translation gateway metrics.
//!
//! Counters for cache hits and misses, batch translations, model calls,
//! cache writes and failures. Each gateway owns its own instance so that
//! independent pipelines (and tests) never share counts.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counters for one translation gateway.
#[derive(Debug, Default)]
pub struct GatewayMetrics {
    /// Batches served from an existing cache file
    cache_hits: AtomicUsize,

    /// Batches with no cache file
    cache_misses: AtomicUsize,

    /// Full-batch translations started after a miss
    translations: AtomicUsize,

    /// Sub-batch calls sent to the translation model
    model_calls: AtomicUsize,

    /// Sub-batch calls that failed or timed out
    model_failures: AtomicUsize,

    /// Cache files written
    cache_writes: AtomicUsize,
}

impl GatewayMetrics {
    /// Create a zeroed set of counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a batch served from its cache file.
    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a batch with no cache file.
    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the start of a full-batch translation.
    pub fn record_translation(&self) {
        self.translations.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one sub-batch call to the translation model.
    pub fn record_model_call(&self) {
        self.model_calls.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a sub-batch call that failed or timed out.
    pub fn record_model_failure(&self) {
        self.model_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a cache file written.
    pub fn record_cache_write(&self) {
        self.cache_writes.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current cache hit count.
    pub fn cache_hits(&self) -> usize {
        self.cache_hits.load(Ordering::Relaxed)
    }

    /// Get the current cache miss count.
    pub fn cache_misses(&self) -> usize {
        self.cache_misses.load(Ordering::Relaxed)
    }

    /// Get the number of full-batch translations started.
    pub fn translations(&self) -> usize {
        self.translations.load(Ordering::Relaxed)
    }

    /// Get the current model call count.
    pub fn model_calls(&self) -> usize {
        self.model_calls.load(Ordering::Relaxed)
    }

    /// Get the current model failure count.
    pub fn model_failures(&self) -> usize {
        self.model_failures.load(Ordering::Relaxed)
    }

    /// Get the number of cache files written.
    pub fn cache_writes(&self) -> usize {
        self.cache_writes.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    ///
    /// Rates are percentages (0-100) and are 0 when nothing was counted.
    pub fn report(&self) -> MetricsReport {
        let hits = self.cache_hits();
        let misses = self.cache_misses();
        let lookups = hits + misses;
        let cache_hit_rate = if lookups > 0 {
            (hits as f64 / lookups as f64) * 100.0
        } else {
            0.0
        };

        let calls = self.model_calls();
        let failures = self.model_failures();
        let model_success_rate = if calls > 0 {
            (calls.saturating_sub(failures) as f64 / calls as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            cache_hits: hits,
            cache_misses: misses,
            cache_hit_rate,
            translations: self.translations(),
            model_calls: calls,
            model_failures: failures,
            model_success_rate,
            cache_writes: self.cache_writes(),
        }
    }
}

/// Snapshot of gateway counters.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub cache_hits: usize,
    pub cache_misses: usize,

    /// Cache hit rate as a percentage (0-100)
    pub cache_hit_rate: f64,

    pub translations: usize,
    pub model_calls: usize,
    pub model_failures: usize,

    /// Model call success rate as a percentage (0-100)
    pub model_success_rate: f64,

    pub cache_writes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Counter Tests ====================

    #[test]
    fn test_counters_start_at_zero() {
        let metrics = GatewayMetrics::new();
        assert_eq!(metrics.cache_hits(), 0);
        assert_eq!(metrics.cache_misses(), 0);
        assert_eq!(metrics.translations(), 0);
        assert_eq!(metrics.model_calls(), 0);
        assert_eq!(metrics.model_failures(), 0);
        assert_eq!(metrics.cache_writes(), 0);
    }

    #[test]
    fn test_record_cache_hit() {
        let metrics = GatewayMetrics::new();
        metrics.record_cache_hit();
        metrics.record_cache_hit();
        assert_eq!(metrics.cache_hits(), 2);
    }

    #[test]
    fn test_instances_are_independent() {
        let first = GatewayMetrics::new();
        let second = GatewayMetrics::new();
        first.record_cache_write();
        assert_eq!(first.cache_writes(), 1);
        assert_eq!(second.cache_writes(), 0);
    }

    // ==================== Report Tests ====================

    #[test]
    fn test_report_empty() {
        let report = GatewayMetrics::new().report();
        assert_eq!(report.cache_hit_rate, 0.0);
        assert_eq!(report.model_success_rate, 0.0);
    }

    #[test]
    fn test_report_cache_hit_rate() {
        let metrics = GatewayMetrics::new();

        // 3 hits, 1 miss = 75% hit rate
        metrics.record_cache_hit();
        metrics.record_cache_hit();
        metrics.record_cache_hit();
        metrics.record_cache_miss();

        let report = metrics.report();
        assert_eq!(report.cache_hits, 3);
        assert_eq!(report.cache_misses, 1);
        assert_eq!(report.cache_hit_rate, 75.0);
    }

    #[test]
    fn test_report_model_success_rate() {
        let metrics = GatewayMetrics::new();

        // 4 calls, 1 failure = 75% success rate
        for _ in 0..4 {
            metrics.record_model_call();
        }
        metrics.record_model_failure();

        let report = metrics.report();
        assert_eq!(report.model_calls, 4);
        assert_eq!(report.model_failures, 1);
        assert_eq!(report.model_success_rate, 75.0);
    }
}
