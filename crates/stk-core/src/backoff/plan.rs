use std::time::Duration;

use stk_model::{BackoffAlgorithm, BackoffOptions, ModelError, ModelResult};

use super::compute_schedule;

/// Delay schedule computed once for one retried operation.
///
/// Randomized algorithms are sampled at construction time only, so resuming a run
/// from a saved index replays exactly the same delays.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackoffPlan {
    algorithm: BackoffAlgorithm,
    options: BackoffOptions,
    schedule: Vec<u64>,
}

impl BackoffPlan {
    /// Validate `options` and compute the schedule.
    pub fn compute(algorithm: BackoffAlgorithm, options: &BackoffOptions) -> ModelResult<Self> {
        options.validate()?;
        Ok(Self {
            algorithm,
            options: options.clone(),
            schedule: compute_schedule(algorithm, options),
        })
    }

    /// Rebuild a plan from a previously captured schedule.
    ///
    /// The schedule must hold exactly `options.max_attempts` entries.
    pub fn from_schedule(
        algorithm: BackoffAlgorithm,
        options: &BackoffOptions,
        schedule: Vec<u64>,
    ) -> ModelResult<Self> {
        options.validate()?;
        if schedule.len() != options.max_attempts as usize {
            return Err(ModelError::Invalid(format!(
                "schedule has {} entries, expected {}",
                schedule.len(),
                options.max_attempts
            )));
        }
        Ok(Self {
            algorithm,
            options: options.clone(),
            schedule,
        })
    }

    #[inline]
    pub fn algorithm(&self) -> BackoffAlgorithm {
        self.algorithm
    }

    #[inline]
    pub fn options(&self) -> &BackoffOptions {
        &self.options
    }

    /// Planned delays in milliseconds.
    #[inline]
    pub fn schedule(&self) -> &[u64] {
        &self.schedule
    }

    #[inline]
    pub fn max_attempts(&self) -> u32 {
        self.options.max_attempts
    }

    /// Delay before the attempt at 0-based `index`, or `None` past the end of the plan.
    pub fn delay_at(&self, index: usize) -> Option<Duration> {
        self.schedule.get(index).copied().map(Duration::from_millis)
    }

    /// Sum of every planned delay.
    pub fn total_delay(&self) -> Duration {
        let ms = self
            .schedule
            .iter()
            .fold(0u64, |acc, d| acc.saturating_add(*d));
        Duration::from_millis(ms)
    }
}
