pub mod backoff;
pub mod deploy;
pub mod metrics;

pub mod prelude {
    pub use crate::backoff::{
        AttemptContext, BackoffError, BackoffPlan, BackoffScheduler, Clock, ClockHandle, Probe,
        TokioClock, probe_fn,
    };
    pub use crate::deploy::{
        ClientError, DeployError, DeployOptions, DeploymentOrchestrator, OperationKind,
        StackClient, StackClientHandle, StackReport, TemplateParameterSource,
    };
    pub use crate::metrics::{DeployMetrics, MetricsHandle, noop_metrics};
}
