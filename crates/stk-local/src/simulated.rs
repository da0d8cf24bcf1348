use std::{
    collections::{BTreeMap, VecDeque},
    fmt,
    sync::{Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use tracing::{debug, trace};
use uuid::Uuid;

use stk_core::deploy::{ClientError, OperationKind, StackClient};
use stk_model::{DeleteRequest, StackDescription, StackRequest, StackStatus, SubmissionResponse};

use crate::error::VALIDATION_ERROR_CODE;

/// Statuses a stack walks through after a submission, one per status call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimScript {
    steps: Vec<StackStatus>,
    reason: Option<String>,
}

impl SimScript {
    pub fn new(steps: impl IntoIterator<Item = StackStatus>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            reason: None,
        }
    }

    /// Status reason reported once the script reaches its last step.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn steps(&self) -> &[StackStatus] {
        &self.steps
    }

    /// Path ending in the success status of `kind`.
    pub fn succeeding(kind: OperationKind) -> Self {
        match kind {
            OperationKind::Create => Self::new([
                StackStatus::CreateInProgress,
                StackStatus::CreateInProgress,
                StackStatus::CreateComplete,
            ]),
            OperationKind::Update => Self::new([
                StackStatus::UpdateInProgress,
                StackStatus::UpdateCompleteCleanupInProgress,
                StackStatus::UpdateComplete,
            ]),
            OperationKind::Delete => {
                Self::new([StackStatus::DeleteInProgress, StackStatus::DeleteComplete])
            }
        }
    }

    /// Path ending in a failure status of `kind`.
    pub fn failing(kind: OperationKind) -> Self {
        match kind {
            OperationKind::Create => Self::new([
                StackStatus::CreateInProgress,
                StackStatus::CreateFailed,
            ])
            .with_reason("The following resource(s) failed to create"),
            OperationKind::Update => Self::new([
                StackStatus::UpdateInProgress,
                StackStatus::UpdateRollbackInProgress,
                StackStatus::UpdateRollbackComplete,
            ])
            .with_reason("The following resource(s) failed to update"),
            OperationKind::Delete => {
                Self::new([StackStatus::DeleteInProgress, StackStatus::DeleteFailed])
                    .with_reason("The following resource(s) failed to delete")
            }
        }
    }

    /// Path that never leaves `status`.
    pub fn stuck(status: StackStatus) -> Self {
        Self::new([status])
    }
}

/// One call received by a [`SimulatedStackClient`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SimCall {
    Create(StackRequest),
    Update(StackRequest),
    Delete(String),
    Describe(String),
}

impl SimCall {
    pub fn is_describe(&self) -> bool {
        matches!(self, SimCall::Describe(_))
    }
}

impl fmt::Display for SimCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimCall::Create(req) => write!(f, "create {}", req.stack_name),
            SimCall::Update(req) => write!(f, "update {}", req.stack_name),
            SimCall::Delete(name) => write!(f, "delete {name}"),
            SimCall::Describe(name) => write!(f, "describe {name}"),
        }
    }
}

#[derive(Debug)]
struct SimStack {
    id: String,
    name: String,
    current: StackStatus,
    pending: VecDeque<StackStatus>,
    /// Reason to attach once `pending` runs dry.
    final_reason: Option<String>,
    reason: Option<String>,
}

impl SimStack {
    fn start(&mut self, script: &SimScript) {
        self.pending = script.steps.iter().cloned().collect();
        self.final_reason = script.reason.clone();
        self.reason = None;
        if let Some(first) = self.pending.front() {
            self.current = first.clone();
        }
    }

    fn advance(&mut self) {
        if let Some(next) = self.pending.pop_front() {
            self.current = next;
            if self.pending.is_empty() {
                self.reason = self.final_reason.take();
            }
        }
    }

    fn is_deleted(&self) -> bool {
        self.current == StackStatus::DeleteComplete
    }

    fn is_busy(&self) -> bool {
        self.current.is_in_progress()
    }

    fn describe(&self) -> StackDescription {
        let desc = StackDescription::new(self.id.clone(), self.name.clone(), self.current.clone());
        match &self.reason {
            Some(reason) => desc.with_reason(reason.clone()),
            None => desc,
        }
    }
}

#[derive(Debug)]
struct Fault {
    remaining: u32,
    code: String,
    message: String,
}

#[derive(Debug)]
struct SimState {
    stacks: BTreeMap<String, SimStack>,
    scripts: BTreeMap<OperationKind, SimScript>,
    describe_fault: Option<Fault>,
    calls: Vec<SimCall>,
}

impl SimState {
    fn script(&self, kind: OperationKind) -> SimScript {
        self.scripts
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| SimScript::succeeding(kind))
    }

    fn find_mut(&mut self, name_or_id: &str) -> Option<&mut SimStack> {
        self.stacks
            .values_mut()
            .find(|s| s.name == name_or_id || s.id == name_or_id)
    }

    /// Stack addressed by `name_or_id` that has not been deleted.
    fn live_mut(&mut self, name_or_id: &str) -> Result<&mut SimStack, ClientError> {
        match self.find_mut(name_or_id) {
            Some(stack) if !stack.is_deleted() => Ok(stack),
            _ => Err(ClientError::with_code(
                VALIDATION_ERROR_CODE,
                format!("Stack with id {name_or_id} does not exist"),
            )),
        }
    }
}

/// In-memory [`StackClient`] with scripted status paths.
///
/// Each submission starts the stack on the script registered for its operation kind, and
/// every status call moves it one step further. Stacks deleted by name are no longer
/// listed under their name; the status call by id keeps reporting `DELETE_COMPLETE`.
pub struct SimulatedStackClient {
    state: Mutex<SimState>,
}

impl SimulatedStackClient {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SimState {
                stacks: BTreeMap::new(),
                scripts: BTreeMap::new(),
                describe_fault: None,
                calls: Vec::new(),
            }),
        }
    }

    /// Builder form of [`set_script`](Self::set_script).
    pub fn with_script(self, kind: OperationKind, script: SimScript) -> Self {
        self.set_script(kind, script);
        self
    }

    /// Use `script` for every later submission of `kind`.
    pub fn set_script(&self, kind: OperationKind, script: SimScript) {
        self.lock().scripts.insert(kind, script);
    }

    /// Make the next `count` status calls fail with `code`.
    pub fn fail_next_describes(&self, count: u32, code: impl Into<String>) {
        let code = code.into();
        self.lock().describe_fault = Some(Fault {
            remaining: count,
            message: format!("injected {code} failure"),
            code,
        });
    }

    /// Every call received so far, oldest first.
    pub fn calls(&self) -> Vec<SimCall> {
        self.lock().calls.clone()
    }

    /// Current state of a stack, without advancing it.
    pub fn peek(&self, name_or_id: &str) -> Option<StackDescription> {
        self.lock().find_mut(name_or_id).map(|s| s.describe())
    }

    /// Number of stacks that have not been deleted.
    pub fn live_stacks(&self) -> usize {
        self.lock()
            .stacks
            .values()
            .filter(|s| !s.is_deleted())
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SimulatedStackClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StackClient for SimulatedStackClient {
    fn name(&self) -> &'static str {
        "simulated"
    }

    async fn submit_create(&self, req: &StackRequest) -> Result<SubmissionResponse, ClientError> {
        let mut state = self.lock();
        state.calls.push(SimCall::Create(req.clone()));

        if state
            .stacks
            .get(&req.stack_name)
            .is_some_and(|s| !s.is_deleted())
        {
            debug!(stack = %req.stack_name, "create rejected, stack exists");
            return Err(ClientError::already_exists(&req.stack_name));
        }

        let script = state.script(OperationKind::Create);
        let id = format!(
            "arn:stk:cloudformation:local:stack/{}/{}",
            req.stack_name,
            Uuid::new_v4()
        );
        let mut stack = SimStack {
            id: id.clone(),
            name: req.stack_name.clone(),
            current: StackStatus::ReviewInProgress,
            pending: VecDeque::new(),
            final_reason: None,
            reason: None,
        };
        stack.start(&script);
        state.stacks.insert(req.stack_name.clone(), stack);

        debug!(stack = %req.stack_name, stack_id = %id, "stack created");
        Ok(SubmissionResponse::with_stack_id(id))
    }

    async fn submit_update(&self, req: &StackRequest) -> Result<SubmissionResponse, ClientError> {
        let mut state = self.lock();
        state.calls.push(SimCall::Update(req.clone()));

        let script = state.script(OperationKind::Update);
        let stack = state.live_mut(&req.stack_name)?;
        if stack.is_busy() {
            return Err(ClientError::with_code(
                VALIDATION_ERROR_CODE,
                format!(
                    "Stack:{} is in {} state and can not be updated.",
                    stack.id, stack.current
                ),
            ));
        }
        stack.start(&script);

        debug!(stack = %req.stack_name, stack_id = %stack.id, "stack update started");
        Ok(SubmissionResponse::with_stack_id(stack.id.clone()))
    }

    async fn submit_delete(&self, req: &DeleteRequest) -> Result<SubmissionResponse, ClientError> {
        let mut state = self.lock();
        state.calls.push(SimCall::Delete(req.stack_name.clone()));

        let script = state.script(OperationKind::Delete);
        let stack = state.live_mut(&req.stack_name)?;
        stack.start(&script);

        debug!(stack = %req.stack_name, stack_id = %stack.id, "stack delete started");
        Ok(SubmissionResponse::default())
    }

    async fn describe_stacks(&self, name_or_id: &str) -> Result<Vec<StackDescription>, ClientError> {
        let mut state = self.lock();
        state.calls.push(SimCall::Describe(name_or_id.to_string()));

        if let Some(fault) = state.describe_fault.as_mut() {
            if fault.remaining > 0 {
                fault.remaining -= 1;
                let err = ClientError::with_code(fault.code.clone(), fault.message.clone());
                if fault.remaining == 0 {
                    state.describe_fault = None;
                }
                return Err(err);
            }
        }

        let Some(stack) = state.find_mut(name_or_id) else {
            return Ok(Vec::new());
        };
        stack.advance();

        // Deleted stacks are only reachable by id.
        if stack.is_deleted() && stack.id != name_or_id {
            trace!(stack = %name_or_id, "stack deleted, not listed by name");
            return Ok(Vec::new());
        }
        trace!(stack = %name_or_id, status = %stack.current, "describe");
        Ok(vec![stack.describe()])
    }
}
