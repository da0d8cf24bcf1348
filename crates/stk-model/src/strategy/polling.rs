use serde::{Deserialize, Serialize};

#[cfg(feature = "schema")]
use schemars::JsonSchema;

use super::{BackoffAlgorithm, BackoffOptions};

/// How the orchestrator waits for a stack to settle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct PollingConfig {
    pub algorithm: BackoffAlgorithm,
    pub backoff: BackoffOptions,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            algorithm: BackoffAlgorithm::Exponential,
            backoff: BackoffOptions::stack_polling(),
        }
    }
}
