use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[cfg(feature = "schema")]
use schemars::JsonSchema;

use crate::error::{ModelError, ModelResult};

/// Selects how the delay before each retry attempt grows.
///
/// For attempt `n` (1-based) and base delay `b`:
/// - `Linear`: `b * n`.
/// - `Exponential`: `b * (2^n - 1)`.
/// - `RandomLinear`: uniform draw from `[b, b * n]`.
/// - `RandomExponential`: uniform draw from `[b, b * (2^n - 1)]`.
///
/// Randomized variants spread out callers that started retrying at the same moment.
/// The arithmetic itself lives in the core backoff engine; this enum only names the policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BackoffAlgorithm {
    RandomLinear,
    Linear,
    RandomExponential,
    Exponential,
}

impl BackoffAlgorithm {
    /// Every algorithm, in declaration order.
    pub const ALL: [BackoffAlgorithm; 4] = [
        BackoffAlgorithm::RandomLinear,
        BackoffAlgorithm::Linear,
        BackoffAlgorithm::RandomExponential,
        BackoffAlgorithm::Exponential,
    ];

    /// Returns `true` when delays are sampled rather than fixed.
    #[inline]
    pub fn is_randomized(&self) -> bool {
        matches!(
            self,
            BackoffAlgorithm::RandomLinear | BackoffAlgorithm::RandomExponential
        )
    }

    /// Canonical wire name (e.g. `"RANDOM_LINEAR"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            BackoffAlgorithm::RandomLinear => "RANDOM_LINEAR",
            BackoffAlgorithm::Linear => "LINEAR",
            BackoffAlgorithm::RandomExponential => "RANDOM_EXPONENTIAL",
            BackoffAlgorithm::Exponential => "EXPONENTIAL",
        }
    }
}

impl Default for BackoffAlgorithm {
    fn default() -> Self {
        BackoffAlgorithm::Exponential
    }
}

impl fmt::Display for BackoffAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackoffAlgorithm {
    type Err = ModelError;
    fn from_str(s: &str) -> ModelResult<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "random_linear" => Ok(BackoffAlgorithm::RandomLinear),
            "linear" => Ok(BackoffAlgorithm::Linear),
            "random_exponential" => Ok(BackoffAlgorithm::RandomExponential),
            "exponential" => Ok(BackoffAlgorithm::Exponential),
            other => Err(ModelError::UnknownAlgorithm(other.to_string())),
        }
    }
}
