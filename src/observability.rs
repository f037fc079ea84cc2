//! Observability hooks for fetch runs.
//!
//! Implement [`FetchMetrics`] to feed your monitoring system:
//!
//! ```ignore
//! use fetch_kit::observability::FetchMetrics;
//! use fetch_kit::FetchBuilder;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! struct PrometheusMetrics;
//!
//! impl FetchMetrics for PrometheusMetrics {
//!     fn record_fetch(&self, _key: &str, _duration: Duration) {
//!         // histogram!("fetch_latency").record(duration);
//!     }
//!     // ... implement other methods
//! }
//!
//! let orchestrator = FetchBuilder::new(key, fetch_fn)
//!     .metrics(Arc::new(PrometheusMetrics))
//!     .build();
//! ```
//!
//! The default methods log through the `log` crate. Orchestrators install
//! [`NoOpMetrics`] unless told otherwise.

use std::time::Duration;

/// Trait for fetch metrics collection.
///
/// All methods receive the canonical key of the run.
pub trait FetchMetrics: Send + Sync {
    /// A run was served from the cache.
    fn record_hit(&self, key: &str) {
        debug!("Fetch HIT: {}", key);
    }

    /// A run found no live cache entry (or caching is off for it).
    fn record_miss(&self, key: &str) {
        debug!("Fetch MISS: {}", key);
    }

    /// A fetch and transform completed successfully.
    fn record_fetch(&self, key: &str, duration: Duration) {
        debug!("Fetch OK: {} took {:?}", key, duration);
    }

    /// A fetch or transform failed.
    fn record_error(&self, key: &str, error: &str) {
        warn!("Fetch ERROR for {}: {}", key, error);
    }
}

/// Default metrics implementation (no-op).
#[derive(Clone, Default)]
pub struct NoOpMetrics;

impl FetchMetrics for NoOpMetrics {
    fn record_hit(&self, _key: &str) {}
    fn record_miss(&self, _key: &str) {}
    fn record_fetch(&self, _key: &str, _duration: Duration) {}
    fn record_error(&self, _key: &str, _error: &str) {}
}
