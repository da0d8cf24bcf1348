use rand::Rng;

use stk_model::{BackoffAlgorithm, BackoffOptions};

/// `2^attempt - 1`, saturating at `u64::MAX`.
fn exponential_factor(attempt: u32) -> u64 {
    1u64.checked_shl(attempt).map_or(u64::MAX, |p| p - 1)
}

/// Deterministic upper end of the delay for `attempt`, before clamping.
fn unclamped_upper(algorithm: BackoffAlgorithm, base_ms: u64, attempt: u32) -> u64 {
    match algorithm {
        BackoffAlgorithm::Linear | BackoffAlgorithm::RandomLinear => {
            base_ms.saturating_mul(u64::from(attempt))
        }
        BackoffAlgorithm::Exponential | BackoffAlgorithm::RandomExponential => {
            base_ms.saturating_mul(exponential_factor(attempt))
        }
    }
}

/// A cap of zero counts as no cap.
fn clamp(delay_ms: u64, max_delay_ms: Option<u64>) -> u64 {
    match max_delay_ms {
        Some(max) if max > 0 => delay_ms.min(max),
        _ => delay_ms,
    }
}

/// Largest delay `compute_delay` can return for this attempt.
pub fn upper_bound_delay(
    algorithm: BackoffAlgorithm,
    base_ms: u64,
    attempt: u32,
    max_delay_ms: Option<u64>,
) -> u64 {
    let upper = unclamped_upper(algorithm, base_ms, attempt);
    let upper = if algorithm.is_randomized() {
        upper.max(base_ms)
    } else {
        upper
    };
    clamp(upper, max_delay_ms)
}

/// Delay in milliseconds before 1-based `attempt`, drawing from `rng` for randomized algorithms.
pub fn compute_delay_with<R>(
    rng: &mut R,
    algorithm: BackoffAlgorithm,
    base_ms: u64,
    attempt: u32,
    max_delay_ms: Option<u64>,
) -> u64
where
    R: Rng + ?Sized,
{
    let upper = unclamped_upper(algorithm, base_ms, attempt);
    let raw = if algorithm.is_randomized() {
        rng.gen_range(base_ms..=upper.max(base_ms))
    } else {
        upper
    };
    clamp(raw, max_delay_ms)
}

/// Delay in milliseconds before 1-based `attempt`.
///
/// ```rust
/// use stk_core::backoff::compute_delay;
/// use stk_model::BackoffAlgorithm;
///
/// assert_eq!(compute_delay(BackoffAlgorithm::Linear, 3_000, 2, None), 6_000);
/// assert_eq!(compute_delay(BackoffAlgorithm::Exponential, 3_000, 10, Some(60_000)), 60_000);
/// ```
pub fn compute_delay(
    algorithm: BackoffAlgorithm,
    base_ms: u64,
    attempt: u32,
    max_delay_ms: Option<u64>,
) -> u64 {
    compute_delay_with(
        &mut rand::thread_rng(),
        algorithm,
        base_ms,
        attempt,
        max_delay_ms,
    )
}

/// Delays for attempts `1..=max_attempts`, in order.
pub fn compute_schedule(algorithm: BackoffAlgorithm, opts: &BackoffOptions) -> Vec<u64> {
    let mut rng = rand::thread_rng();
    (1..=opts.max_attempts)
        .map(|attempt| {
            compute_delay_with(
                &mut rng,
                algorithm,
                opts.base_delay_ms,
                attempt,
                opts.max_delay_ms,
            )
        })
        .collect()
}
