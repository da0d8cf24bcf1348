use crate::{
    deploy::OperationKind,
    metrics::backend::{DeployMetrics, OperationOutcome},
};

/// Metrics backend that records nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpMetrics;

impl DeployMetrics for NoOpMetrics {
    #[inline(always)]
    fn record_submission(&self, _: OperationKind) {}

    #[inline(always)]
    fn record_poll(&self, _: OperationKind) {}

    #[inline(always)]
    fn record_outcome(&self, _: OperationKind, _: OperationOutcome, _: u64) {}

    #[inline(always)]
    fn record_client_error(&self, _: OperationKind, _: &str) {}
}
