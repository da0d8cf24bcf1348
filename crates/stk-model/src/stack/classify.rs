use std::collections::BTreeSet;

use crate::error::{ModelError, ModelResult};

use super::StackStatus;

/// Which side of the outcome a terminal status lands on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerminalKind {
    Success,
    Failure,
}

/// Caller-supplied split of terminal statuses into success and failure.
///
/// Any status in neither set is transient: polling continues.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusClassification {
    success: BTreeSet<StackStatus>,
    failure: BTreeSet<StackStatus>,
}

impl StatusClassification {
    pub fn new<S, F>(success: S, failure: F) -> Self
    where
        S: IntoIterator<Item = StackStatus>,
        F: IntoIterator<Item = StackStatus>,
    {
        Self {
            success: success.into_iter().collect(),
            failure: failure.into_iter().collect(),
        }
    }

    /// Terminal states of a create-or-update.
    pub fn deploy() -> Self {
        Self::new(
            [StackStatus::CreateComplete, StackStatus::UpdateComplete],
            [
                StackStatus::CreateFailed,
                StackStatus::RollbackComplete,
                StackStatus::RollbackFailed,
                StackStatus::UpdateFailed,
                StackStatus::UpdateRollbackComplete,
                StackStatus::UpdateRollbackFailed,
            ],
        )
    }

    /// Terminal states of a delete.
    pub fn teardown() -> Self {
        Self::new([StackStatus::DeleteComplete], [StackStatus::DeleteFailed])
    }

    /// Ensure no status is both a success and a failure.
    pub fn validate(&self) -> ModelResult<()> {
        match self.success.intersection(&self.failure).next() {
            Some(status) => Err(ModelError::AmbiguousStatus(status.to_string())),
            None => Ok(()),
        }
    }

    /// `None` for transient statuses.
    pub fn classify(&self, status: &StackStatus) -> Option<TerminalKind> {
        if self.failure.contains(status) {
            Some(TerminalKind::Failure)
        } else if self.success.contains(status) {
            Some(TerminalKind::Success)
        } else {
            None
        }
    }

    pub fn is_terminal(&self, status: &StackStatus) -> bool {
        self.classify(status).is_some()
    }

    /// All statuses that end polling.
    pub fn terminal_states(&self) -> impl Iterator<Item = &StackStatus> {
        self.success.iter().chain(self.failure.iter())
    }
}

impl Default for StatusClassification {
    fn default() -> Self {
        Self::deploy()
    }
}
