use thiserror::Error;

use stk_model::{BackoffAlgorithm, ModelError};

/// Why a backoff run ended without a result.
///
/// `E` is the probe's own error type, passed through untouched.
#[derive(Debug, Error)]
pub enum BackoffError<E> {
    /// Every planned attempt ran and none reported success.
    #[error("{algorithm} backoff failed, max attempts ({attempts}) reached")]
    Exhausted {
        algorithm: BackoffAlgorithm,
        attempts: u32,
    },

    /// The probe returned an error; no further attempts were made.
    #[error("probe failed: {0}")]
    Probe(E),

    #[error("invalid backoff plan: {0}")]
    Invalid(#[from] ModelError),
}

impl<E> BackoffError<E> {
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        matches!(self, BackoffError::Exhausted { .. })
    }

    /// The probe's error, if that is what stopped the run.
    pub fn into_probe_error(self) -> Option<E> {
        match self {
            BackoffError::Probe(e) => Some(e),
            _ => None,
        }
    }
}
