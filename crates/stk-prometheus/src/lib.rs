//! Prometheus backend for stack deployment metrics.
//!
//! [`PrometheusMetrics`] implements [`stk_core::metrics::DeployMetrics`] and is handed to the
//! orchestrator as a metrics handle:
//!
//! ```rust
//! use std::sync::Arc;
//! use stk_core::deploy::DeploymentOrchestrator;
//! use stk_local::SimulatedStackClient;
//! use stk_prometheus::PrometheusMetrics;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let metrics = PrometheusMetrics::new()?;
//! let orchestrator = DeploymentOrchestrator::new(Arc::new(SimulatedStackClient::new()))
//!     .with_metrics(Arc::new(metrics.clone()));
//! # drop(orchestrator);
//! println!("{}", metrics.encode_text()?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Metrics
//! - `stk_submissions_total{operation}` - Counter
//! - `stk_polls_total{operation}` - Counter
//! - `stk_outcomes_total{operation, outcome}` - Counter
//! - `stk_client_errors_total{operation, error_kind}` - Counter
//! - `stk_operation_duration_seconds{operation}` - Histogram
//!
//! No `/metrics` endpoint is served here; expose [`PrometheusMetrics::gather`] through
//! whatever HTTP stack the host application already runs.
mod backend;
pub use backend::PrometheusMetrics;

pub use prometheus::{Encoder, Registry, TextEncoder};
