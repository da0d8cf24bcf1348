use std::sync::Arc;

use tracing::{debug, instrument, trace};

use stk_model::{BackoffAlgorithm, BackoffOptions};

use super::{
    AttemptContext, BackoffError, BackoffPlan, ClockHandle, Probe, TokioClock, format::ms_to_time,
};

/// Drives a [`Probe`] through a [`BackoffPlan`].
///
/// Attempts run strictly one after another: the next delay starts only once the
/// previous probe call has settled. There is no cancellation handle; dropping the
/// returned future is the only way to stop waiting.
#[derive(Clone)]
pub struct BackoffScheduler {
    clock: ClockHandle,
}

impl BackoffScheduler {
    pub fn new(clock: ClockHandle) -> Self {
        Self { clock }
    }

    pub fn clock(&self) -> &ClockHandle {
        &self.clock
    }

    /// Compute a fresh plan and run `probe` through it from the first attempt.
    pub async fn run<P: Probe>(
        &self,
        algorithm: BackoffAlgorithm,
        opts: &BackoffOptions,
        probe: &mut P,
    ) -> Result<P::Output, BackoffError<P::Error>> {
        let plan = BackoffPlan::compute(algorithm, opts)?;
        self.run_plan(&plan, 0, probe).await
    }

    /// Run `probe` through an existing plan, starting at 0-based `start_index`.
    ///
    /// Resuming with a saved plan and index replays the same delays.
    #[instrument(level = "debug", skip(self, plan, probe), fields(algorithm = %plan.algorithm(), attempts = plan.max_attempts()))]
    pub async fn run_plan<P: Probe>(
        &self,
        plan: &BackoffPlan,
        start_index: usize,
        probe: &mut P,
    ) -> Result<P::Output, BackoffError<P::Error>> {
        let mut index = start_index;

        while let Some(delay) = plan.delay_at(index) {
            let ctx = AttemptContext {
                algorithm: plan.algorithm(),
                index,
                attempt: index as u32 + 1,
                delay,
                max_attempts: plan.max_attempts(),
            };

            trace!(attempt = ctx.attempt, delay = %ms_to_time(ctx.delay_ms()), "waiting before attempt");
            self.clock.sleep(delay).await;

            match probe.attempt(ctx).await {
                Ok(Some(out)) => {
                    debug!(attempt = ctx.attempt, "probe reported success");
                    return Ok(out);
                }
                Ok(None) => {
                    trace!(attempt = ctx.attempt, "probe not ready");
                    index += 1;
                }
                Err(e) => {
                    debug!(attempt = ctx.attempt, "probe failed, stopping");
                    return Err(BackoffError::Probe(e));
                }
            }
        }

        debug!("backoff exhausted");
        Err(BackoffError::Exhausted {
            algorithm: plan.algorithm(),
            attempts: plan.max_attempts(),
        })
    }

    pub async fn linear<P: Probe>(
        &self,
        probe: &mut P,
        base_delay_ms: u64,
        max_attempts: u32,
        max_delay_ms: Option<u64>,
    ) -> Result<P::Output, BackoffError<P::Error>> {
        let opts = BackoffOptions::new(base_delay_ms, max_attempts, max_delay_ms);
        self.run(BackoffAlgorithm::Linear, &opts, probe).await
    }

    pub async fn random_linear<P: Probe>(
        &self,
        probe: &mut P,
        base_delay_ms: u64,
        max_attempts: u32,
        max_delay_ms: Option<u64>,
    ) -> Result<P::Output, BackoffError<P::Error>> {
        let opts = BackoffOptions::new(base_delay_ms, max_attempts, max_delay_ms);
        self.run(BackoffAlgorithm::RandomLinear, &opts, probe).await
    }

    pub async fn exponential<P: Probe>(
        &self,
        probe: &mut P,
        base_delay_ms: u64,
        max_attempts: u32,
        max_delay_ms: Option<u64>,
    ) -> Result<P::Output, BackoffError<P::Error>> {
        let opts = BackoffOptions::new(base_delay_ms, max_attempts, max_delay_ms);
        self.run(BackoffAlgorithm::Exponential, &opts, probe).await
    }

    pub async fn random_exponential<P: Probe>(
        &self,
        probe: &mut P,
        base_delay_ms: u64,
        max_attempts: u32,
        max_delay_ms: Option<u64>,
    ) -> Result<P::Output, BackoffError<P::Error>> {
        let opts = BackoffOptions::new(base_delay_ms, max_attempts, max_delay_ms);
        self.run(BackoffAlgorithm::RandomExponential, &opts, probe).await
    }
}

impl Default for BackoffScheduler {
    fn default() -> Self {
        Self::new(Arc::new(TokioClock))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backoff::{RecordingClock, probe_fn};

    use std::{
        sync::{
            Arc,
            atomic::{AtomicU32, Ordering},
        },
        time::Duration,
    };

    #[derive(Debug, PartialEq, Eq, thiserror::Error)]
    #[error("fatal at attempt {0}")]
    struct Fatal(u32);

    fn scheduler() -> (BackoffScheduler, Arc<RecordingClock>) {
        let clock = Arc::new(RecordingClock::new());
        (BackoffScheduler::new(clock.clone()), clock)
    }

    #[tokio::test]
    async fn resolves_on_first_success() {
        let (sched, clock) = scheduler();
        let calls = Arc::new(AtomicU32::new(0));

        let counter = calls.clone();
        let mut probe = probe_fn(move |ctx: AttemptContext| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, Fatal>((ctx.attempt == 3).then_some("ready"))
            }
        });

        let out = sched
            .run(BackoffAlgorithm::Linear, &BackoffOptions::new(10, 10, None), &mut probe)
            .await
            .unwrap();

        assert_eq!(out, "ready");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            clock.slept(),
            vec![
                Duration::from_millis(10),
                Duration::from_millis(20),
                Duration::from_millis(30)
            ]
        );
    }

    #[tokio::test]
    async fn exhausts_after_max_attempts() {
        let (sched, clock) = scheduler();
        let calls = Arc::new(AtomicU32::new(0));

        let counter = calls.clone();
        let mut probe = probe_fn(move |_ctx: AttemptContext| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<Option<()>, Fatal>(None)
            }
        });

        let err = sched
            .run(BackoffAlgorithm::Exponential, &BackoffOptions::new(5, 4, None), &mut probe)
            .await
            .unwrap_err();

        assert!(err.is_exhausted());
        assert!(matches!(
            err,
            BackoffError::Exhausted { algorithm: BackoffAlgorithm::Exponential, attempts: 4 }
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(clock.slept().len(), 4);
        assert!(err.to_string().contains("EXPONENTIAL"));
    }

    #[tokio::test]
    async fn probe_error_stops_immediately() {
        let (sched, _clock) = scheduler();
        let calls = Arc::new(AtomicU32::new(0));

        let counter = calls.clone();
        let mut probe = probe_fn(move |ctx: AttemptContext| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                if ctx.attempt == 2 {
                    Err(Fatal(ctx.attempt))
                } else {
                    Ok::<Option<()>, Fatal>(None)
                }
            }
        });

        let err = sched
            .run(BackoffAlgorithm::Linear, &BackoffOptions::new(1, 10, None), &mut probe)
            .await
            .unwrap_err();

        assert!(!err.is_exhausted());
        assert_eq!(err.into_probe_error(), Some(Fatal(2)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn resumes_from_saved_index_with_same_delays() {
        let (sched, clock) = scheduler();
        let opts = BackoffOptions::new(10, 6, Some(100));
        let plan = BackoffPlan::compute(BackoffAlgorithm::RandomExponential, &opts).unwrap();

        let mut probe = probe_fn(|ctx: AttemptContext| async move {
            Ok::<_, Fatal>(ctx.is_last().then_some(ctx.index))
        });

        let last = sched.run_plan(&plan, 3, &mut probe).await.unwrap();
        assert_eq!(last, 5);

        let expected: Vec<Duration> = plan.schedule()[3..]
            .iter()
            .map(|ms| Duration::from_millis(*ms))
            .collect();
        assert_eq!(clock.slept(), expected);
    }

    #[tokio::test]
    async fn start_index_past_plan_is_exhausted_without_probing() {
        let (sched, clock) = scheduler();
        let plan =
            BackoffPlan::compute(BackoffAlgorithm::Linear, &BackoffOptions::new(1, 2, None))
                .unwrap();

        let mut probe = probe_fn(|_ctx: AttemptContext| async move {
            Err::<Option<()>, Fatal>(Fatal(0))
        });

        let err = sched.run_plan(&plan, 2, &mut probe).await.unwrap_err();
        assert!(err.is_exhausted());
        assert!(clock.slept().is_empty());
    }

    #[tokio::test]
    async fn invalid_options_never_probe() {
        let (sched, _clock) = scheduler();
        let mut probe = probe_fn(|_ctx: AttemptContext| async move {
            Err::<Option<()>, Fatal>(Fatal(0))
        });

        let err = sched.linear(&mut probe, 10, 0, None).await.unwrap_err();
        assert!(matches!(err, BackoffError::Invalid(_)));
    }

    #[tokio::test]
    async fn convenience_wrappers_use_their_algorithm() {
        let (sched, clock) = scheduler();
        let mut probe = probe_fn(|ctx: AttemptContext| async move {
            Ok::<_, Fatal>(ctx.is_last().then_some(ctx.algorithm))
        });

        let algo = sched.exponential(&mut probe, 50, 4, None).await.unwrap();
        assert_eq!(algo, BackoffAlgorithm::Exponential);
        assert_eq!(
            clock.slept(),
            [50, 150, 350, 750].map(Duration::from_millis).to_vec()
        );

        let algo = sched.random_linear(&mut probe, 5, 2, None).await.unwrap();
        assert_eq!(algo, BackoffAlgorithm::RandomLinear);
    }
}
