//! Metrics hooks for cache operations.

use std::time::Duration;

/// Receives one event per resolve call.
///
/// All methods default to no-ops, so implementors only override what they
/// record.
pub trait CacheMetrics: Send + Sync {
    /// Data was served from the store.
    fn record_hit(&self, _key: &str, _duration: Duration) {}

    /// The producer ran and its result was stored.
    fn record_miss(&self, _key: &str, _duration: Duration) {}

    /// Caching was disabled; the producer ran without touching the store.
    fn record_bypass(&self, _identifier: &str, _duration: Duration) {}

    fn record_error(&self, _key: &str, _error: &str) {}
}

/// Metrics sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpMetrics;

impl CacheMetrics for NoOpMetrics {}
