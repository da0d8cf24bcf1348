use std::{path::Path, time::Instant};

use tracing::{debug, info, instrument, warn};

use stk_model::{
    Capability, DeleteRequest, PollingConfig, StackDescription, StackParameter, StackRequest,
    StackStatus, StatusClassification, SubmissionResponse, Tag,
};

use super::{
    ClientError, DeployError, FailureDetails, OperationKind, StackClientHandle, StackOperation,
    StackOutcome,
};
use crate::{
    backoff::{AttemptContext, BackoffError, BackoffScheduler, ClockHandle, Probe, ms_to_time},
    metrics::{MetricsHandle, OperationOutcome, noop_metrics},
};

/// Per-deploy settings passed alongside the template.
#[derive(Clone, Debug, Default)]
pub struct DeployOptions {
    pub capabilities: Vec<Capability>,
    pub tags: Vec<Tag>,
    /// Which statuses end polling, and on which side.
    pub classification: StatusClassification,
}

impl DeployOptions {
    pub fn with_capability(mut self, capability: impl Into<Capability>) -> Self {
        self.capabilities.push(capability.into());
        self
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }

    pub fn with_classification(mut self, classification: StatusClassification) -> Self {
        self.classification = classification;
        self
    }
}

/// Successful end of a deploy or teardown.
#[derive(Clone, Debug)]
pub struct StackReport {
    pub kind: OperationKind,
    /// Identifier that was polled (the id returned by the submission when there is one).
    pub stack_id: String,
    pub submission: SubmissionResponse,
    pub last_status: StackDescription,
}

/// Submits stack changes and waits for them to settle.
///
/// Holds its collaborators by handle: the remote client, the clock driving the backoff
/// timer, and a metrics backend. Independent operations on different stacks can run
/// concurrently on one orchestrator; it keeps no per-operation state of its own.
pub struct DeploymentOrchestrator {
    client: StackClientHandle,
    scheduler: BackoffScheduler,
    polling: PollingConfig,
    metrics: MetricsHandle,
}

impl DeploymentOrchestrator {
    /// Orchestrator with the tokio clock, default polling and no-op metrics.
    pub fn new(client: StackClientHandle) -> Self {
        Self {
            client,
            scheduler: BackoffScheduler::default(),
            polling: PollingConfig::default(),
            metrics: noop_metrics(),
        }
    }

    /// Replace the clock used between status checks.
    pub fn with_clock(mut self, clock: ClockHandle) -> Self {
        self.scheduler = BackoffScheduler::new(clock);
        self
    }

    /// Replace the polling plan.
    pub fn with_polling(mut self, polling: PollingConfig) -> Self {
        self.polling = polling;
        self
    }

    /// Replace the metrics backend.
    pub fn with_metrics(mut self, metrics: MetricsHandle) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn polling(&self) -> &PollingConfig {
        &self.polling
    }

    pub fn client(&self) -> &StackClientHandle {
        &self.client
    }

    /// Create `stack_name`, or update it if it already exists, and wait for it to settle.
    ///
    /// Only an "already exists" rejection of the create falls back to an update; any other
    /// submission error is returned as is. Polling uses the id returned by the submission.
    #[instrument(level = "debug", skip(self, template_body, parameters, opts), fields(stack = %stack_name, client = self.client.name()))]
    pub async fn deploy(
        &self,
        stack_name: &str,
        template_body: &str,
        parameters: Vec<StackParameter>,
        opts: &DeployOptions,
    ) -> Result<StackReport, DeployError> {
        opts.classification.validate()?;
        self.polling.backoff.validate()?;

        let request = StackRequest {
            stack_name: stack_name.to_string(),
            template_body: template_body.to_string(),
            parameters,
            capabilities: opts.capabilities.clone(),
            tags: opts.tags.clone(),
        };

        let started = Instant::now();
        let (kind, submission) = match self.client.submit_create(&request).await {
            Ok(resp) => (OperationKind::Create, resp),
            Err(e) if e.is_already_exists() => {
                debug!("stack already exists, submitting update instead");
                let resp = self
                    .client
                    .submit_update(&request)
                    .await
                    .map_err(|e| self.submission_failed(stack_name, OperationKind::Update, e))?;
                (OperationKind::Update, resp)
            }
            Err(e) => return Err(self.submission_failed(stack_name, OperationKind::Create, e)),
        };
        self.metrics.record_submission(kind);

        let identifier = match submission.stack_id.as_deref() {
            Some(id) => id.to_string(),
            None => {
                warn!("submission returned no stack id, polling by name");
                stack_name.to_string()
            }
        };
        info!(stack_id = %identifier, operation = %kind, "submitted, waiting for stack to settle");

        let mut operation = StackOperation::submitted(
            identifier,
            kind,
            opts.classification.clone(),
            submission,
        );
        let result = self.settle(&mut operation, false).await;
        self.finish(operation, result, started)
    }

    /// Read a template from disk and [`deploy`](Self::deploy) it.
    pub async fn deploy_template_file(
        &self,
        path: impl AsRef<Path>,
        stack_name: &str,
        parameters: Vec<StackParameter>,
        opts: &DeployOptions,
    ) -> Result<StackReport, DeployError> {
        let path = path.as_ref();
        let template_body =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| DeployError::Template {
                    path: path.to_path_buf(),
                    source,
                })?;
        self.deploy(stack_name, &template_body, parameters, opts)
            .await
    }

    /// Delete a stack and wait until it is gone.
    ///
    /// A stack that stops showing up in describe output counts as deleted.
    #[instrument(level = "debug", skip(self), fields(stack = %name_or_id, client = self.client.name()))]
    pub async fn teardown(&self, name_or_id: &str) -> Result<StackReport, DeployError> {
        self.polling.backoff.validate()?;

        let started = Instant::now();
        let submission = self
            .client
            .submit_delete(&DeleteRequest::new(name_or_id))
            .await
            .map_err(|e| self.submission_failed(name_or_id, OperationKind::Delete, e))?;
        self.metrics.record_submission(OperationKind::Delete);
        info!("delete submitted, waiting for stack to disappear");

        let mut operation = StackOperation::submitted(
            name_or_id,
            OperationKind::Delete,
            StatusClassification::teardown(),
            submission,
        );
        let result = self.settle(&mut operation, true).await;
        self.finish(operation, result, started)
    }

    /// Poll `identifier` until `classification` reports a terminal status, and return it.
    ///
    /// Resolves on either side of the classification; the caller decides what a
    /// failure-terminal status means.
    pub async fn await_stack_status(
        &self,
        identifier: &str,
        kind: OperationKind,
        classification: &StatusClassification,
    ) -> Result<StackDescription, DeployError> {
        classification.validate()?;
        let mut operation = StackOperation::submitted(
            identifier,
            kind,
            classification.clone(),
            SubmissionResponse::default(),
        );
        self.settle(&mut operation, false).await
    }

    /// Describe `name_or_id` and pick the entry whose id or name matches.
    pub async fn retrieve_stack_status(
        &self,
        name_or_id: &str,
    ) -> Result<Option<StackDescription>, ClientError> {
        let stacks = self.client.describe_stacks(name_or_id).await?;
        Ok(stacks.into_iter().find(|s| s.matches(name_or_id)))
    }

    /// Run the poll loop for `operation` until it settles or the plan runs out.
    async fn settle(
        &self,
        operation: &mut StackOperation,
        missing_means_deleted: bool,
    ) -> Result<StackDescription, DeployError> {
        let algorithm = self.polling.algorithm;
        let mut probe = StatusProbe {
            orchestrator: self,
            operation: &mut *operation,
            missing_means_deleted,
        };

        match self
            .scheduler
            .run(algorithm, &self.polling.backoff, &mut probe)
            .await
        {
            Ok(status) => Ok(status),
            Err(BackoffError::Probe(e)) => Err(e),
            Err(BackoffError::Invalid(e)) => Err(DeployError::InvalidConfig(e)),
            Err(BackoffError::Exhausted {
                algorithm,
                attempts,
            }) => {
                operation.exhaust();
                Err(DeployError::Exhausted {
                    stack: operation.identifier().to_string(),
                    algorithm,
                    attempts,
                    last_status: operation.last_status().cloned(),
                })
            }
        }
    }

    /// Turn a settled operation into the caller-facing result and record its outcome.
    fn finish(
        &self,
        operation: StackOperation,
        result: Result<StackDescription, DeployError>,
        started: Instant,
    ) -> Result<StackReport, DeployError> {
        let kind = operation.kind();
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let result = result.and_then(|last_status| match operation.outcome() {
            StackOutcome::Succeeded => {
                info!(status = %last_status.stack_status, polls = operation.polls(), "stack settled");
                Ok(StackReport {
                    kind,
                    stack_id: operation.identifier().to_string(),
                    submission: operation.submission().clone(),
                    last_status,
                })
            }
            _ => {
                warn!(status = %last_status.stack_status, polls = operation.polls(), "stack settled in a failure state");
                Err(DeployError::TerminalFailure(Box::new(FailureDetails {
                    kind,
                    stack_id: operation.identifier().to_string(),
                    submission: operation.submission().clone(),
                    last_status,
                })))
            }
        });

        let outcome = match &result {
            Ok(_) => OperationOutcome::Succeeded,
            Err(DeployError::TerminalFailure(_)) => OperationOutcome::Failed,
            Err(DeployError::Exhausted { .. }) => OperationOutcome::Exhausted,
            Err(_) => OperationOutcome::Error,
        };
        self.metrics.record_outcome(kind, outcome, elapsed_ms);
        result
    }

    fn submission_failed(&self, stack: &str, kind: OperationKind, source: ClientError) -> DeployError {
        self.metrics.record_client_error(kind, "submit");
        self.metrics
            .record_outcome(kind, OperationOutcome::Error, 0);
        DeployError::Submission {
            stack: stack.to_string(),
            kind,
            source,
        }
    }
}

/// Probe that fetches the current status and feeds it to the operation.
struct StatusProbe<'a> {
    orchestrator: &'a DeploymentOrchestrator,
    operation: &'a mut StackOperation,
    missing_means_deleted: bool,
}

impl Probe for StatusProbe<'_> {
    type Output = StackDescription;
    type Error = DeployError;

    async fn attempt(&mut self, ctx: AttemptContext) -> Result<Option<StackDescription>, DeployError> {
        let kind = self.operation.kind();
        let identifier = self.operation.identifier().to_string();
        debug!(
            stack = %identifier,
            attempt = ctx.attempt,
            waited = %ms_to_time(ctx.delay_ms()),
            "retrieving stack status"
        );
        self.orchestrator.metrics.record_poll(kind);

        let status = match self.orchestrator.retrieve_stack_status(&identifier).await {
            Ok(Some(status)) => status,
            Ok(None) if self.missing_means_deleted => {
                debug!(stack = %identifier, "stack no longer listed, treating as deleted");
                StackDescription::new(identifier.clone(), identifier.clone(), StackStatus::DeleteComplete)
            }
            Ok(None) => return Err(DeployError::StackNotFound(identifier)),
            Err(source) => {
                self.orchestrator
                    .metrics
                    .record_client_error(kind, "describe");
                return Err(DeployError::PollProbe {
                    stack: identifier,
                    source,
                });
            }
        };

        debug!(stack = %identifier, status = %status.stack_status, "observed stack status");
        match self.operation.observe(status.clone()) {
            Some(_) => Ok(Some(status)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        backoff::RecordingClock,
        deploy::StackClient,
        metrics::DeployMetrics,
    };

    use std::{
        collections::VecDeque,
        sync::{Arc, Mutex},
        time::Duration,
    };

    use async_trait::async_trait;
    use stk_model::{BackoffAlgorithm, BackoffOptions, ModelError, TerminalKind};

    /// Client replaying scripted responses and recording which calls were made.
    #[derive(Default)]
    struct ScriptedClient {
        create: Mutex<VecDeque<Result<SubmissionResponse, ClientError>>>,
        update: Mutex<VecDeque<Result<SubmissionResponse, ClientError>>>,
        delete: Mutex<VecDeque<Result<SubmissionResponse, ClientError>>>,
        describe: Mutex<VecDeque<Result<Vec<StackDescription>, ClientError>>>,
        calls: Mutex<Vec<String>>,
        updates: Mutex<Vec<StackRequest>>,
    }

    impl ScriptedClient {
        fn log(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn describe_calls(&self) -> usize {
            self.calls()
                .iter()
                .filter(|c| c.starts_with("describe"))
                .count()
        }

        fn on_create(self, r: Result<SubmissionResponse, ClientError>) -> Self {
            self.create.lock().unwrap().push_back(r);
            self
        }

        fn on_update(self, r: Result<SubmissionResponse, ClientError>) -> Self {
            self.update.lock().unwrap().push_back(r);
            self
        }

        fn on_delete(self, r: Result<SubmissionResponse, ClientError>) -> Self {
            self.delete.lock().unwrap().push_back(r);
            self
        }

        fn on_describe(self, r: Result<Vec<StackDescription>, ClientError>) -> Self {
            self.describe.lock().unwrap().push_back(r);
            self
        }

        fn statuses(mut self, id: &str, statuses: &[StackStatus]) -> Self {
            for s in statuses {
                self = self.on_describe(Ok(vec![StackDescription::new(id, "app", s.clone())]));
            }
            self
        }
    }

    fn next<T>(queue: &Mutex<VecDeque<Result<T, ClientError>>>) -> Result<T, ClientError> {
        queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ClientError::new("unscripted call")))
    }

    #[async_trait]
    impl StackClient for ScriptedClient {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn submit_create(&self, req: &StackRequest) -> Result<SubmissionResponse, ClientError> {
            self.log(format!("create {}", req.stack_name));
            next(&self.create)
        }

        async fn submit_update(&self, req: &StackRequest) -> Result<SubmissionResponse, ClientError> {
            self.log(format!("update {}", req.stack_name));
            self.updates.lock().unwrap().push(req.clone());
            next(&self.update)
        }

        async fn submit_delete(&self, req: &DeleteRequest) -> Result<SubmissionResponse, ClientError> {
            self.log(format!("delete {}", req.stack_name));
            next(&self.delete)
        }

        async fn describe_stacks(&self, name_or_id: &str) -> Result<Vec<StackDescription>, ClientError> {
            self.log(format!("describe {name_or_id}"));
            next(&self.describe)
        }
    }

    #[derive(Default)]
    struct CountingMetrics {
        events: Mutex<Vec<String>>,
    }

    impl DeployMetrics for CountingMetrics {
        fn record_submission(&self, kind: OperationKind) {
            self.events.lock().unwrap().push(format!("submit:{kind}"));
        }

        fn record_poll(&self, kind: OperationKind) {
            self.events.lock().unwrap().push(format!("poll:{kind}"));
        }

        fn record_outcome(&self, kind: OperationKind, outcome: OperationOutcome, _: u64) {
            self.events
                .lock()
                .unwrap()
                .push(format!("outcome:{kind}:{}", outcome.as_label()));
        }

        fn record_client_error(&self, kind: OperationKind, error_kind: &str) {
            self.events
                .lock()
                .unwrap()
                .push(format!("error:{kind}:{error_kind}"));
        }
    }

    const ID: &str = "arn:stack/app/1";

    fn orchestrator(client: Arc<ScriptedClient>) -> (DeploymentOrchestrator, Arc<RecordingClock>) {
        let clock = Arc::new(RecordingClock::new());
        let orch = DeploymentOrchestrator::new(client).with_clock(clock.clone());
        (orch, clock)
    }

    #[tokio::test]
    async fn deploy_polls_until_create_complete() {
        let client = Arc::new(
            ScriptedClient::default()
                .on_create(Ok(SubmissionResponse::with_stack_id(ID)))
                .statuses(
                    ID,
                    &[
                        StackStatus::CreateInProgress,
                        StackStatus::CreateInProgress,
                        StackStatus::CreateComplete,
                    ],
                ),
        );
        let (orch, clock) = orchestrator(client.clone());

        let report = orch
            .deploy("app", "Resources: {}", vec![], &DeployOptions::default())
            .await
            .unwrap();

        assert_eq!(report.kind, OperationKind::Create);
        assert_eq!(report.stack_id, ID);
        assert_eq!(report.last_status.stack_status, StackStatus::CreateComplete);
        assert_eq!(client.describe_calls(), 3);
        assert_eq!(
            clock.slept(),
            [3_000, 9_000, 21_000].map(Duration::from_millis).to_vec()
        );
    }

    #[tokio::test]
    async fn deploy_polls_by_returned_id_not_name() {
        let client = Arc::new(
            ScriptedClient::default()
                .on_create(Ok(SubmissionResponse::with_stack_id(ID)))
                .statuses(ID, &[StackStatus::CreateComplete]),
        );
        let (orch, _clock) = orchestrator(client.clone());

        orch.deploy("app", "{}", vec![], &DeployOptions::default())
            .await
            .unwrap();

        assert_eq!(client.calls(), vec!["create app".to_string(), format!("describe {ID}")]);
    }

    #[tokio::test]
    async fn deploy_without_stack_id_polls_by_name() {
        let client = Arc::new(
            ScriptedClient::default()
                .on_create(Ok(SubmissionResponse::default()))
                .statuses("app", &[StackStatus::CreateInProgress, StackStatus::CreateComplete]),
        );
        let (orch, _clock) = orchestrator(client.clone());

        let report = orch
            .deploy("app", "{}", vec![], &DeployOptions::default())
            .await
            .unwrap();

        assert_eq!(report.stack_id, "app");
        assert_eq!(report.submission.stack_id, None);
        assert_eq!(
            client.calls(),
            vec!["create app", "describe app", "describe app"]
        );
    }

    #[tokio::test]
    async fn already_exists_falls_back_to_update() {
        let client = Arc::new(
            ScriptedClient::default()
                .on_create(Err(ClientError::already_exists("app")))
                .on_update(Ok(SubmissionResponse::with_stack_id(ID)))
                .statuses(
                    ID,
                    &[StackStatus::UpdateInProgress, StackStatus::UpdateComplete],
                ),
        );
        let (orch, _clock) = orchestrator(client.clone());

        let params = StackParameter::from_pairs([("Env", "prod")]);
        let opts = DeployOptions::default()
            .with_capability("CAPABILITY_IAM")
            .with_tag(Tag::new("team", "platform"));
        let report = orch.deploy("app", "{}", params.clone(), &opts).await.unwrap();

        assert_eq!(report.kind, OperationKind::Update);
        assert_eq!(report.last_status.stack_status, StackStatus::UpdateComplete);
        assert_eq!(&client.calls()[..2], &["create app", "update app"]);

        let updates = client.updates.lock().unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].parameters, params);
        assert_eq!(updates[0].capabilities, vec!["CAPABILITY_IAM".to_string()]);
        assert_eq!(updates[0].tags, vec![Tag::new("team", "platform")]);
    }

    #[tokio::test]
    async fn other_create_errors_are_fatal() {
        let client = Arc::new(
            ScriptedClient::default()
                .on_create(Err(ClientError::with_code("ValidationError", "bad template"))),
        );
        let (orch, clock) = orchestrator(client.clone());

        let err = orch
            .deploy("app", "{}", vec![], &DeployOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DeployError::Submission { kind: OperationKind::Create, .. }
        ));
        assert_eq!(err.client_error().and_then(|e| e.code()), Some("ValidationError"));
        assert_eq!(client.calls(), vec!["create app".to_string()]);
        assert!(clock.slept().is_empty());
    }

    #[tokio::test]
    async fn failed_update_after_fallback_is_a_submission_error() {
        let client = Arc::new(
            ScriptedClient::default()
                .on_create(Err(ClientError::already_exists("app")))
                .on_update(Err(ClientError::with_code(
                    "ValidationError",
                    "No updates are to be performed.",
                ))),
        );
        let (orch, _clock) = orchestrator(client);

        let err = orch
            .deploy("app", "{}", vec![], &DeployOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DeployError::Submission { kind: OperationKind::Update, .. }
        ));
    }

    #[tokio::test]
    async fn create_failed_rejects_with_details() {
        let client = Arc::new(
            ScriptedClient::default()
                .on_create(Ok(SubmissionResponse::with_stack_id(ID)))
                .statuses(
                    ID,
                    &[StackStatus::CreateInProgress, StackStatus::CreateFailed],
                ),
        );
        let (orch, _clock) = orchestrator(client);

        let err = orch
            .deploy("app", "{}", vec![], &DeployOptions::default())
            .await
            .unwrap_err();

        assert!(err.is_terminal_failure());
        let details = err.details().expect("terminal failure carries details");
        assert_eq!(details.last_status.stack_status, StackStatus::CreateFailed);
        assert_eq!(details.submission.stack_id.as_deref(), Some(ID));
        assert_eq!(details.kind, OperationKind::Create);
        assert!(err.to_string().contains("CREATE_FAILED"));
    }

    #[tokio::test]
    async fn rollback_complete_is_a_failure() {
        let client = Arc::new(
            ScriptedClient::default()
                .on_create(Ok(SubmissionResponse::with_stack_id(ID)))
                .statuses(
                    ID,
                    &[StackStatus::RollbackInProgress, StackStatus::RollbackComplete],
                ),
        );
        let (orch, _clock) = orchestrator(client);

        let err = orch
            .deploy("app", "{}", vec![], &DeployOptions::default())
            .await
            .unwrap_err();
        assert_eq!(
            err.details().map(|d| d.last_status.stack_status.clone()),
            Some(StackStatus::RollbackComplete)
        );
    }

    #[tokio::test]
    async fn describe_error_aborts_polling() {
        let client = Arc::new(
            ScriptedClient::default()
                .on_create(Ok(SubmissionResponse::with_stack_id(ID)))
                .statuses(ID, &[StackStatus::CreateInProgress])
                .on_describe(Err(ClientError::with_code("AccessDenied", "nope"))),
        );
        let (orch, _clock) = orchestrator(client.clone());

        let err = orch
            .deploy("app", "{}", vec![], &DeployOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::PollProbe { .. }));
        assert_eq!(client.describe_calls(), 2);
    }

    #[tokio::test]
    async fn missing_stack_during_deploy_is_an_error() {
        let client = Arc::new(
            ScriptedClient::default()
                .on_create(Ok(SubmissionResponse::with_stack_id(ID)))
                .on_describe(Ok(vec![StackDescription::new(
                    "other-id",
                    "other",
                    StackStatus::CreateComplete,
                )])),
        );
        let (orch, _clock) = orchestrator(client);

        let err = orch
            .deploy("app", "{}", vec![], &DeployOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::StackNotFound(ref s) if s == ID));
    }

    #[tokio::test]
    async fn exhaustion_is_distinct_from_terminal_failure() {
        let client = Arc::new(
            ScriptedClient::default()
                .on_create(Ok(SubmissionResponse::with_stack_id(ID)))
                .statuses(
                    ID,
                    &[
                        StackStatus::CreateInProgress,
                        StackStatus::CreateInProgress,
                        StackStatus::CreateInProgress,
                    ],
                ),
        );

        let metrics = Arc::new(CountingMetrics::default());
        let (orch, clock) = orchestrator(client.clone());
        let orch = orch
            .with_polling(PollingConfig {
                algorithm: BackoffAlgorithm::Linear,
                backoff: BackoffOptions::new(10, 3, None),
            })
            .with_metrics(metrics.clone());

        let err = orch
            .deploy("app", "{}", vec![], &DeployOptions::default())
            .await
            .unwrap_err();

        match &err {
            DeployError::Exhausted {
                stack,
                algorithm,
                attempts,
                last_status,
            } => {
                assert_eq!(stack, ID);
                assert_eq!(*algorithm, BackoffAlgorithm::Linear);
                assert_eq!(*attempts, 3);
                assert_eq!(
                    last_status.as_ref().map(|s| s.stack_status.clone()),
                    Some(StackStatus::CreateInProgress)
                );
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }
        assert!(!err.is_terminal_failure());
        assert!(err.details().is_none());
        assert_eq!(client.describe_calls(), 3);
        assert_eq!(clock.total(), Duration::from_millis(60));

        let events = metrics.events.lock().unwrap();
        assert_eq!(events.first().map(String::as_str), Some("submit:create"));
        assert_eq!(events.iter().filter(|e| e.starts_with("poll:")).count(), 3);
        assert_eq!(events.last().map(String::as_str), Some("outcome:create:exhausted"));
    }

    #[tokio::test]
    async fn custom_classification_controls_terminal_states() {
        let client = Arc::new(
            ScriptedClient::default()
                .on_create(Ok(SubmissionResponse::with_stack_id(ID)))
                .statuses(
                    ID,
                    &[StackStatus::CreateComplete, StackStatus::ReviewInProgress],
                ),
        );
        let (orch, _clock) = orchestrator(client.clone());

        let opts = DeployOptions::default().with_classification(StatusClassification::new(
            [StackStatus::ReviewInProgress],
            [StackStatus::CreateFailed],
        ));
        let report = orch.deploy("app", "{}", vec![], &opts).await.unwrap();

        assert_eq!(report.last_status.stack_status, StackStatus::ReviewInProgress);
        assert_eq!(client.describe_calls(), 2);
    }

    #[tokio::test]
    async fn ambiguous_classification_is_rejected_before_submission() {
        let client = Arc::new(ScriptedClient::default());
        let (orch, _clock) = orchestrator(client.clone());

        let opts = DeployOptions::default().with_classification(StatusClassification::new(
            [StackStatus::CreateComplete],
            [StackStatus::CreateComplete],
        ));
        let err = orch.deploy("app", "{}", vec![], &opts).await.unwrap_err();

        assert!(matches!(
            err,
            DeployError::InvalidConfig(ModelError::AmbiguousStatus(_))
        ));
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn teardown_resolves_on_delete_complete() {
        let client = Arc::new(
            ScriptedClient::default()
                .on_delete(Ok(SubmissionResponse::default()))
                .statuses(
                    "app",
                    &[StackStatus::DeleteInProgress, StackStatus::DeleteComplete],
                ),
        );
        let (orch, _clock) = orchestrator(client.clone());

        let report = orch.teardown("app").await.unwrap();
        assert_eq!(report.kind, OperationKind::Delete);
        assert_eq!(report.last_status.stack_status, StackStatus::DeleteComplete);
        assert_eq!(&client.calls()[..2], &["delete app", "describe app"]);
    }

    #[tokio::test]
    async fn teardown_delete_failed_rejects() {
        let client = Arc::new(
            ScriptedClient::default()
                .on_delete(Ok(SubmissionResponse::default()))
                .statuses("app", &[StackStatus::DeleteFailed]),
        );
        let (orch, _clock) = orchestrator(client);

        let err = orch.teardown("app").await.unwrap_err();
        let details = err.details().unwrap();
        assert_eq!(details.kind, OperationKind::Delete);
        assert_eq!(details.last_status.stack_status, StackStatus::DeleteFailed);
    }

    #[tokio::test]
    async fn teardown_treats_vanished_stack_as_deleted() {
        let client = Arc::new(
            ScriptedClient::default()
                .on_delete(Ok(SubmissionResponse::default()))
                .statuses("app", &[StackStatus::DeleteInProgress])
                .on_describe(Ok(vec![])),
        );
        let (orch, _clock) = orchestrator(client);

        let report = orch.teardown("app").await.unwrap();
        assert_eq!(report.last_status.stack_status, StackStatus::DeleteComplete);
    }

    #[tokio::test]
    async fn teardown_submission_error_skips_polling() {
        let metrics = Arc::new(CountingMetrics::default());
        let client = Arc::new(
            ScriptedClient::default()
                .on_delete(Err(ClientError::with_code("AccessDenied", "nope"))),
        );
        let (orch, clock) = orchestrator(client.clone());
        let orch = orch.with_metrics(metrics.clone());

        let err = orch.teardown("app").await.unwrap_err();
        assert!(matches!(
            err,
            DeployError::Submission { kind: OperationKind::Delete, .. }
        ));
        assert!(clock.slept().is_empty());
        assert_eq!(
            *metrics.events.lock().unwrap(),
            vec!["error:delete:submit".to_string(), "outcome:delete:error".to_string()]
        );
    }

    #[tokio::test]
    async fn await_stack_status_returns_failure_side_too() {
        let client = Arc::new(ScriptedClient::default().statuses(
            ID,
            &[StackStatus::UpdateRollbackInProgress, StackStatus::UpdateRollbackFailed],
        ));
        let (orch, _clock) = orchestrator(client);

        let classification = StatusClassification::deploy();
        let status = orch
            .await_stack_status(ID, OperationKind::Update, &classification)
            .await
            .unwrap();

        assert_eq!(status.stack_status, StackStatus::UpdateRollbackFailed);
        assert_eq!(
            classification.classify(&status.stack_status),
            Some(TerminalKind::Failure)
        );
    }

    #[tokio::test]
    async fn template_file_errors_are_reported_with_path() {
        let client = Arc::new(ScriptedClient::default());
        let (orch, _clock) = orchestrator(client.clone());

        let err = orch
            .deploy_template_file("/nonexistent/stk/template.yaml", "app", vec![], &DeployOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::Template { ref path, .. } if path.ends_with("template.yaml")));
        assert!(client.calls().is_empty());
    }
}
