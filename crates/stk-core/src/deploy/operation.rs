use std::fmt;

use tracing::trace;

use stk_model::{StackDescription, StatusClassification, SubmissionResponse, TerminalKind};

/// Kind of submission that started an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OperationKind {
    Create,
    Update,
    Delete,
}

impl OperationKind {
    /// Return label value for metrics.
    #[inline]
    pub fn as_label(&self) -> &'static str {
        match self {
            OperationKind::Create => "create",
            OperationKind::Update => "update",
            OperationKind::Delete => "delete",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Where an operation stands.
///
/// Moves only from `Pending` to one of the terminal values, never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackOutcome {
    Pending,
    Succeeded,
    Failed,
}

impl StackOutcome {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StackOutcome::Pending)
    }
}

/// One submitted deploy or teardown being tracked until it settles.
#[derive(Debug, Clone)]
pub struct StackOperation {
    identifier: String,
    kind: OperationKind,
    classification: StatusClassification,
    submission: SubmissionResponse,
    last_status: Option<StackDescription>,
    outcome: StackOutcome,
    exhausted: bool,
    polls: u32,
}

impl StackOperation {
    /// Start tracking an operation whose submission was accepted.
    pub fn submitted(
        identifier: impl Into<String>,
        kind: OperationKind,
        classification: StatusClassification,
        submission: SubmissionResponse,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            kind,
            classification,
            submission,
            last_status: None,
            outcome: StackOutcome::Pending,
            exhausted: false,
            polls: 0,
        }
    }

    /// Name or id used for status checks.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn classification(&self) -> &StatusClassification {
        &self.classification
    }

    pub fn submission(&self) -> &SubmissionResponse {
        &self.submission
    }

    pub fn last_status(&self) -> Option<&StackDescription> {
        self.last_status.as_ref()
    }

    pub fn outcome(&self) -> StackOutcome {
        self.outcome
    }

    /// `true` when the operation failed because polling ran out of attempts.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Number of statuses observed so far.
    pub fn polls(&self) -> u32 {
        self.polls
    }

    /// Record a freshly polled status.
    ///
    /// Returns the terminal classification when this status ends the operation.
    /// Once the operation is terminal, further observations are ignored.
    pub fn observe(&mut self, status: StackDescription) -> Option<TerminalKind> {
        if self.outcome.is_terminal() {
            trace!(stack = %self.identifier, status = %status.stack_status, "operation already settled, ignoring status");
            return None;
        }

        self.polls += 1;
        let terminal = self.classification.classify(&status.stack_status);
        self.last_status = Some(status);

        match terminal {
            Some(TerminalKind::Success) => self.outcome = StackOutcome::Succeeded,
            Some(TerminalKind::Failure) => self.outcome = StackOutcome::Failed,
            None => {}
        }
        terminal
    }

    /// Mark the operation failed because no terminal status was seen in time.
    ///
    /// Returns `false` if the operation had already settled.
    pub fn exhaust(&mut self) -> bool {
        if self.outcome.is_terminal() {
            return false;
        }
        self.outcome = StackOutcome::Failed;
        self.exhausted = true;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stk_model::StackStatus;

    fn op() -> StackOperation {
        StackOperation::submitted(
            "id-1",
            OperationKind::Create,
            StatusClassification::deploy(),
            SubmissionResponse::with_stack_id("id-1"),
        )
    }

    fn desc(status: StackStatus) -> StackDescription {
        StackDescription::new("id-1", "app", status)
    }

    #[test]
    fn transient_status_keeps_pending() {
        let mut op = op();
        assert_eq!(op.observe(desc(StackStatus::CreateInProgress)), None);
        assert_eq!(op.outcome(), StackOutcome::Pending);
        assert_eq!(op.polls(), 1);
        assert_eq!(
            op.last_status().map(|s| &s.stack_status),
            Some(&StackStatus::CreateInProgress)
        );
    }

    #[test]
    fn success_and_failure_are_final() {
        let mut op = op();
        assert_eq!(
            op.observe(desc(StackStatus::CreateComplete)),
            Some(TerminalKind::Success)
        );
        assert_eq!(op.outcome(), StackOutcome::Succeeded);

        assert_eq!(op.observe(desc(StackStatus::CreateFailed)), None);
        assert_eq!(op.outcome(), StackOutcome::Succeeded);
        assert_eq!(
            op.last_status().map(|s| &s.stack_status),
            Some(&StackStatus::CreateComplete)
        );
        assert!(!op.exhaust());
        assert!(!op.is_exhausted());
    }

    #[test]
    fn failure_terminal_status() {
        let mut op = op();
        assert_eq!(
            op.observe(desc(StackStatus::RollbackComplete)),
            Some(TerminalKind::Failure)
        );
        assert_eq!(op.outcome(), StackOutcome::Failed);
        assert!(!op.is_exhausted());
    }

    #[test]
    fn exhaust_fails_pending_operation() {
        let mut op = op();
        op.observe(desc(StackStatus::CreateInProgress));
        assert!(op.exhaust());
        assert_eq!(op.outcome(), StackOutcome::Failed);
        assert!(op.is_exhausted());
        assert_eq!(op.observe(desc(StackStatus::CreateComplete)), None);
    }
}
