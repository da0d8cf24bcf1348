use serde::{Deserialize, Serialize};

use super::StackParameter;

/// Error code a create call fails with when the stack name is already taken.
pub const ALREADY_EXISTS_CODE: &str = "AlreadyExistsException";

/// Acknowledgement of a capability the template requires (e.g. `CAPABILITY_IAM`).
pub type Capability = String;

/// Key/value tag propagated to the stack and its resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    key: String,
    value: String,
}

impl Tag {
    pub fn new<K, V>(key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl From<(&str, &str)> for Tag {
    fn from((key, value): (&str, &str)) -> Self {
        Self::new(key, value)
    }
}

/// Payload shared by the create and update submissions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackRequest {
    pub stack_name: String,
    pub template_body: String,
    #[serde(default)]
    pub parameters: Vec<StackParameter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capabilities: Vec<Capability>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

/// Payload of a delete submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRequest {
    /// Name or id of the stack to remove.
    pub stack_name: String,
}

impl DeleteRequest {
    pub fn new(stack_name: impl Into<String>) -> Self {
        Self {
            stack_name: stack_name.into(),
        }
    }
}

/// Response of a create, update or delete submission.
///
/// Create and update return the stack id; delete returns nothing beyond the request id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SubmissionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl SubmissionResponse {
    pub fn with_stack_id(stack_id: impl Into<String>) -> Self {
        Self {
            stack_id: Some(stack_id.into()),
            request_id: None,
        }
    }
}
