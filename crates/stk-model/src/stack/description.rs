use serde::{Deserialize, Serialize};

use super::StackStatus;

/// One entry of a describe call: what the remote side currently reports for a stack.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StackDescription {
    pub stack_id: String,
    pub stack_name: String,
    pub stack_status: StackStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_status_reason: Option<String>,
}

impl StackDescription {
    pub fn new(
        stack_id: impl Into<String>,
        stack_name: impl Into<String>,
        stack_status: StackStatus,
    ) -> Self {
        Self {
            stack_id: stack_id.into(),
            stack_name: stack_name.into(),
            stack_status,
            stack_status_reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.stack_status_reason = Some(reason.into());
        self
    }

    /// Returns `true` if `name_or_id` names this stack by either its id or its name.
    pub fn matches(&self, name_or_id: &str) -> bool {
        self.stack_id == name_or_id || self.stack_name == name_or_id
    }
}
