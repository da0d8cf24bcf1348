mod classify;
pub use classify::{StatusClassification, TerminalKind};

mod description;
pub use description::StackDescription;

mod parameter;
pub use parameter::{ParameterDescriptor, StackParameter};

mod request;
pub use request::{
    ALREADY_EXISTS_CODE, Capability, DeleteRequest, StackRequest, SubmissionResponse, Tag,
};

mod status;
pub use status::StackStatus;
