//! Observability hooks for cart persistence.
//!
//! Implement [`CartMetrics`] to feed persistence timings into your monitoring
//! system:
//!
//! ```ignore
//! use cart_kit::observability::CartMetrics;
//! use std::time::Duration;
//!
//! struct PrometheusMetrics;
//!
//! impl CartMetrics for PrometheusMetrics {
//!     fn record_persist(&self, operation: &str, _duration: Duration) {
//!         // counter!("cart_writes", "op" => operation).inc();
//!     }
//! }
//!
//! // let store = CartStore::new(repository)
//! //     .with_metrics(Box::new(PrometheusMetrics));
//! ```
//!
//! Every method has a default body that logs via the `log` crate, so an
//! implementation only overrides what it cares about. Stores start with
//! [`NoOpMetrics`].

use std::time::Duration;

/// Trait for cart metrics collection.
pub trait CartMetrics: Send + Sync {
    /// Record a completed load from persistence.
    fn record_load(&self, rows: usize, duration: Duration) {
        debug!("Cart LOAD: {} rows took {:?}", rows, duration);
    }

    /// Record a confirmed write for one operation (`add`, `remove`, ...).
    fn record_persist(&self, operation: &str, duration: Duration) {
        debug!("Cart PERSIST {}: took {:?}", operation, duration);
    }

    /// Record a failed persistence call.
    fn record_error(&self, operation: &str, error: &str) {
        warn!("Cart ERROR during {}: {}", operation, error);
    }
}

/// Default metrics implementation (no-op).
#[derive(Clone, Default)]
pub struct NoOpMetrics;

impl CartMetrics for NoOpMetrics {
    fn record_load(&self, _rows: usize, _duration: Duration) {}
    fn record_persist(&self, _operation: &str, _duration: Duration) {}
    fn record_error(&self, _operation: &str, _error: &str) {}
}

/// Metrics implementation that only logs (uses the trait defaults).
#[derive(Clone, Default)]
pub struct LogMetrics;

impl CartMetrics for LogMetrics {}
