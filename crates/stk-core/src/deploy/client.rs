use std::{fmt, sync::Arc};

use async_trait::async_trait;

use stk_model::{
    ALREADY_EXISTS_CODE, DeleteRequest, ParameterDescriptor, StackDescription, StackRequest,
    SubmissionResponse,
};

/// Failure reported by a remote collaborator.
///
/// `code` is the machine-readable error code when the remote side sent one
/// (e.g. `"AlreadyExistsException"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientError {
    code: Option<String>,
    message: String,
}

impl ClientError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }

    /// Error returned when creating a stack whose name is taken.
    pub fn already_exists(stack_name: &str) -> Self {
        Self::with_code(
            ALREADY_EXISTS_CODE,
            format!("Stack [{stack_name}] already exists"),
        )
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    #[inline]
    pub fn is_already_exists(&self) -> bool {
        self.code() == Some(ALREADY_EXISTS_CODE)
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{code}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for ClientError {}

/// Remote stack API used by the orchestrator.
///
/// Implementations own their transport and credentials; the orchestrator only holds a handle.
#[async_trait]
pub trait StackClient: Send + Sync {
    /// Client name used in logs and diagnostics.
    fn name(&self) -> &'static str;

    async fn submit_create(&self, req: &StackRequest) -> Result<SubmissionResponse, ClientError>;

    async fn submit_update(&self, req: &StackRequest) -> Result<SubmissionResponse, ClientError>;

    async fn submit_delete(&self, req: &DeleteRequest) -> Result<SubmissionResponse, ClientError>;

    /// Describe stacks matching `name_or_id`.
    ///
    /// A stack that does not exist yields an empty list rather than an error.
    async fn describe_stacks(&self, name_or_id: &str)
    -> Result<Vec<StackDescription>, ClientError>;
}

/// Shared handle to a stack client.
pub type StackClientHandle = Arc<dyn StackClient>;

/// Reads the parameters a template declares.
#[async_trait]
pub trait TemplateParameterSource: Send + Sync {
    /// Declared parameters, in template order.
    async fn template_parameters(
        &self,
        template_body: &str,
    ) -> Result<Vec<ParameterDescriptor>, ClientError>;
}
