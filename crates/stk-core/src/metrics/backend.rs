use std::sync::Arc;

use crate::deploy::OperationKind;

/// How a stack operation ended, for metrics classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationOutcome {
    /// The stack reached a success-terminal status.
    Succeeded,
    /// The stack reached a failure-terminal status.
    Failed,
    /// Polling gave up before any terminal status was seen.
    Exhausted,
    /// Submission or a status call failed.
    Error,
}

impl OperationOutcome {
    /// Return label value for metrics.
    #[inline]
    pub fn as_label(&self) -> &'static str {
        match self {
            OperationOutcome::Succeeded => "succeeded",
            OperationOutcome::Failed => "failed",
            OperationOutcome::Exhausted => "exhausted",
            OperationOutcome::Error => "error",
        }
    }
}

/// Backend metrics collection interface.
///
/// Implementations are injected into the orchestrator with
/// [`DeploymentOrchestrator::with_metrics`](crate::deploy::DeploymentOrchestrator::with_metrics).
pub trait DeployMetrics: Send + Sync + 'static {
    /// Record a create, update or delete request accepted by the remote side.
    fn record_submission(&self, kind: OperationKind);
    /// Record one status check.
    fn record_poll(&self, kind: OperationKind);
    /// Record how an operation ended and how long it took from submission.
    fn record_outcome(&self, kind: OperationKind, outcome: OperationOutcome, duration_ms: u64);
    /// Record a failed client call.
    ///
    /// `error_kind` is a low-cardinality category such as `"submit"` or `"describe"`.
    fn record_client_error(&self, kind: OperationKind, error_kind: &str);
}

/// Shared handle to metrics backend.
pub type MetricsHandle = Arc<dyn DeployMetrics>;
