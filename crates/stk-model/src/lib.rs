mod error;
pub use error::{ModelError, ModelResult};

mod stack;
pub use stack::{
    ALREADY_EXISTS_CODE, Capability, DeleteRequest, ParameterDescriptor, StackDescription,
    StackParameter, StackRequest, StackStatus, StatusClassification, SubmissionResponse, Tag,
    TerminalKind,
};

mod strategy;
pub use strategy::{BackoffAlgorithm, BackoffOptions, PollingConfig};
