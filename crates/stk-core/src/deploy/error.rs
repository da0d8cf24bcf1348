use std::path::PathBuf;

use thiserror::Error;

use stk_model::{BackoffAlgorithm, ModelError, StackDescription, SubmissionResponse};

use super::{ClientError, OperationKind};

/// Context attached to an operation that reached a failure-terminal status.
#[derive(Debug, Clone)]
pub struct FailureDetails {
    pub kind: OperationKind,
    pub stack_id: String,
    /// Response of the submission that started the operation.
    pub submission: SubmissionResponse,
    /// Terminal status that ended polling.
    pub last_status: StackDescription,
}

#[derive(Debug, Error)]
pub enum DeployError {
    /// The create/update/delete call itself was rejected.
    #[error("failed to submit {kind} for stack '{stack}': {source}")]
    Submission {
        stack: String,
        kind: OperationKind,
        #[source]
        source: ClientError,
    },

    /// A status check failed; polling stopped.
    #[error("failed to retrieve status of stack '{stack}': {source}")]
    PollProbe {
        stack: String,
        #[source]
        source: ClientError,
    },

    #[error("stack '{0}' is not visible to the status call")]
    StackNotFound(String),

    /// The stack settled in a failure-terminal status.
    #[error(
        "{} of stack '{}' ended in {}",
        .0.kind,
        .0.stack_id,
        .0.last_status.stack_status
    )]
    TerminalFailure(Box<FailureDetails>),

    /// Polling ran out of attempts before any terminal status was seen.
    #[error("gave up waiting on stack '{stack}': {algorithm} backoff used all {attempts} attempts")]
    Exhausted {
        stack: String,
        algorithm: BackoffAlgorithm,
        attempts: u32,
        last_status: Option<StackDescription>,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ModelError),

    #[error("failed to read template {path}: {source}")]
    Template {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read template parameters: {0}")]
    Parameters(#[source] ClientError),
}

impl DeployError {
    /// Submission response and final status, when the stack reached a failure-terminal status.
    pub fn details(&self) -> Option<&FailureDetails> {
        match self {
            DeployError::TerminalFailure(details) => Some(details.as_ref()),
            _ => None,
        }
    }

    #[inline]
    pub fn is_terminal_failure(&self) -> bool {
        matches!(self, DeployError::TerminalFailure(_))
    }

    #[inline]
    pub fn is_exhausted(&self) -> bool {
        matches!(self, DeployError::Exhausted { .. })
    }

    /// Underlying client error, for submission and status-call failures.
    pub fn client_error(&self) -> Option<&ClientError> {
        match self {
            DeployError::Submission { source, .. } | DeployError::PollProbe { source, .. } => {
                Some(source)
            }
            DeployError::Parameters(source) => Some(source),
            _ => None,
        }
    }
}
