use std::{future::Future, time::Duration};

use stk_model::BackoffAlgorithm;

/// Information handed to the probe on every attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttemptContext {
    pub algorithm: BackoffAlgorithm,
    /// 0-based position in the plan.
    pub index: usize,
    /// 1-based attempt number.
    pub attempt: u32,
    /// Delay waited right before this attempt.
    pub delay: Duration,
    pub max_attempts: u32,
}

impl AttemptContext {
    #[inline]
    pub fn delay_ms(&self) -> u64 {
        u64::try_from(self.delay.as_millis()).unwrap_or(u64::MAX)
    }

    /// Returns `true` on the final planned attempt.
    #[inline]
    pub fn is_last(&self) -> bool {
        self.attempt >= self.max_attempts
    }
}

/// One unit of retried work.
///
/// - `Ok(Some(v))`: done, the run resolves with `v`.
/// - `Ok(None)`: not ready yet, try again after the next delay.
/// - `Err(e)`: stop now, the run fails with `e`.
pub trait Probe: Send {
    type Output;
    type Error;

    fn attempt(
        &mut self,
        ctx: AttemptContext,
    ) -> impl Future<Output = Result<Option<Self::Output>, Self::Error>> + Send;
}

/// [`Probe`] backed by an async closure.
pub struct FnProbe<F>(F);

/// Wrap an async closure as a [`Probe`].
///
/// ```rust
/// use stk_core::backoff::{AttemptContext, probe_fn};
///
/// let probe = probe_fn(|ctx: AttemptContext| async move {
///     Ok::<_, std::io::Error>((ctx.attempt >= 3).then_some(ctx.attempt))
/// });
/// # drop(probe);
/// ```
pub fn probe_fn<F, Fut, T, E>(f: F) -> FnProbe<F>
where
    F: FnMut(AttemptContext) -> Fut + Send,
    Fut: Future<Output = Result<Option<T>, E>> + Send,
{
    FnProbe(f)
}

impl<F, Fut, T, E> Probe for FnProbe<F>
where
    F: FnMut(AttemptContext) -> Fut + Send,
    Fut: Future<Output = Result<Option<T>, E>> + Send,
{
    type Output = T;
    type Error = E;

    fn attempt(&mut self, ctx: AttemptContext) -> impl Future<Output = Result<Option<T>, E>> + Send {
        (self.0)(ctx)
    }
}
