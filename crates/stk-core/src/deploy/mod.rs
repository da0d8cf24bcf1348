//! Stack deployment orchestration.
//!
//! Submits a create/update/delete through a [`StackClient`], then polls the stack's status
//! under a backoff plan until the [`StatusClassification`](stk_model::StatusClassification)
//! reports a terminal state.
//!
//! ```text
//! SUBMITTED --(transient)--> SUBMITTED
//! SUBMITTED --(success-terminal)--> SUCCEEDED
//! SUBMITTED --(failure-terminal)--> FAILED
//! SUBMITTED --(backoff exhausted)--> FAILED(exhausted)
//! ```
//!
//! A failed submission never enters this machine.
mod client;
pub use client::{ClientError, StackClient, StackClientHandle, TemplateParameterSource};

mod error;
pub use error::{DeployError, FailureDetails};

mod operation;
pub use operation::{OperationKind, StackOperation, StackOutcome};

mod orchestrator;
pub use orchestrator::{DeployOptions, DeploymentOrchestrator, StackReport};

mod template;
pub use template::{load_parameters, retrieve_parameters_from_file};
