use serde::{Deserialize, Serialize};

#[cfg(feature = "schema")]
use schemars::JsonSchema;

use crate::error::{ModelError, ModelResult};

/// Base delay used when none is configured.
pub const DEFAULT_BASE_DELAY_MS: u64 = 50;

/// Attempt ceiling used when none is configured.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 16;

/// Parameters of a backoff plan.
///
/// `max_attempts` bounds the number of probe invocations, and
/// `max_delay_ms` (when set and non-zero) clamps every individual delay.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct BackoffOptions {
    pub base_delay_ms: u64,
    pub max_attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_delay_ms: Option<u64>,
}

impl BackoffOptions {
    pub fn new(base_delay_ms: u64, max_attempts: u32, max_delay_ms: Option<u64>) -> Self {
        Self {
            base_delay_ms,
            max_attempts,
            max_delay_ms,
        }
    }

    /// Schedule used while waiting on a stack: 3s base, 45 attempts, 60s cap.
    ///
    /// With the exponential formula the delays alone add up to about 42 minutes;
    /// per-call latency of the 45 status checks comes on top.
    pub fn stack_polling() -> Self {
        Self::new(3_000, 45, Some(60_000))
    }

    /// Rejects options that cannot produce a single attempt.
    pub fn validate(&self) -> ModelResult<()> {
        if self.base_delay_ms == 0 {
            return Err(ModelError::Invalid("baseDelayMs must be positive".into()));
        }
        if self.max_attempts == 0 {
            return Err(ModelError::Invalid("maxAttempts must be positive".into()));
        }
        Ok(())
    }
}

impl Default for BackoffOptions {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_DELAY_MS, DEFAULT_MAX_ATTEMPTS, None)
    }
}
