use std::sync::Arc;

use prometheus::{
    CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
    proto::MetricFamily,
};

use stk_core::{
    deploy::OperationKind,
    metrics::{DeployMetrics, OperationOutcome},
};

const NAMESPACE: &str = "stk";

/// Operation durations range from seconds to the better part of an hour.
const DURATION_BUCKETS: [f64; 11] = [
    1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1200.0, 2400.0, 3600.0,
];

/// Prometheus metrics backend for the deployment orchestrator.
///
/// ## Label cardinality
/// - `operation`: "create", "update", "delete"
/// - `outcome`: "succeeded", "failed", "exhausted", "error"
/// - `error_kind`: "submit", "describe"
#[derive(Clone)]
pub struct PrometheusMetrics {
    submissions: CounterVec,
    polls: CounterVec,
    outcomes: CounterVec,
    client_errors: CounterVec,
    duration: HistogramVec,
    registry: Arc<Registry>,
}

impl PrometheusMetrics {
    /// Register the stk metrics in `registry`.
    pub fn new_with_registry(registry: Arc<Registry>) -> Result<Self, prometheus::Error> {
        let submissions = counter(
            &registry,
            "submissions_total",
            "Stack submissions accepted by the remote service",
            &["operation"],
        )?;
        let polls = counter(
            &registry,
            "polls_total",
            "Stack status checks",
            &["operation"],
        )?;
        let outcomes = counter(
            &registry,
            "outcomes_total",
            "Finished stack operations by outcome",
            &["operation", "outcome"],
        )?;
        let client_errors = counter(
            &registry,
            "client_errors_total",
            "Failed calls to the stack service",
            &["operation", "error_kind"],
        )?;

        let duration = HistogramVec::new(
            HistogramOpts::new(
                "operation_duration_seconds",
                "Time from submission until the operation settled",
            )
            .namespace(NAMESPACE)
            .buckets(DURATION_BUCKETS.to_vec()),
            &["operation"],
        )?;
        registry.register(Box::new(duration.clone()))?;

        Ok(Self {
            submissions,
            polls,
            outcomes,
            client_errors,
            duration,
            registry,
        })
    }

    /// Backend with a private registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        Self::new_with_registry(Arc::new(Registry::new()))
    }

    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Current metrics in the prometheus text exposition format.
    pub fn encode_text(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }
}

fn counter(
    registry: &Registry,
    name: &str,
    help: &str,
    labels: &[&str],
) -> Result<CounterVec, prometheus::Error> {
    let c = CounterVec::new(Opts::new(name, help).namespace(NAMESPACE), labels)?;
    registry.register(Box::new(c.clone()))?;
    Ok(c)
}

impl DeployMetrics for PrometheusMetrics {
    fn record_submission(&self, kind: OperationKind) {
        self.submissions.with_label_values(&[kind.as_label()]).inc();
    }

    fn record_poll(&self, kind: OperationKind) {
        self.polls.with_label_values(&[kind.as_label()]).inc();
    }

    fn record_outcome(&self, kind: OperationKind, outcome: OperationOutcome, duration_ms: u64) {
        self.outcomes
            .with_label_values(&[kind.as_label(), outcome.as_label()])
            .inc();
        self.duration
            .with_label_values(&[kind.as_label()])
            .observe(duration_ms as f64 / 1000.0);
    }

    fn record_client_error(&self, kind: OperationKind, error_kind: &str) {
        self.client_errors
            .with_label_values(&[kind.as_label(), error_kind])
            .inc();
    }
}
