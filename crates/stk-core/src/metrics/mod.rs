//! Metrics collection abstraction for stack operations.
//!
//! Backends (prometheus, statsd, etc) implement [`DeployMetrics`] and are handed to the
//! orchestrator as a [`MetricsHandle`].
mod backend;
pub use backend::{DeployMetrics, MetricsHandle, OperationOutcome};

mod noop;
pub use noop::NoOpMetrics;

use std::sync::Arc;

/// Create a no-op metrics handle.
#[inline]
pub fn noop_metrics() -> MetricsHandle {
    Arc::new(NoOpMetrics)
}
