//! Backoff engine: delay arithmetic, precomputed plans and the retry loop.
//!
//! The loop is driven by a [`Probe`]: `Ok(Some(_))` ends it with success, `Ok(None)` means
//! "not ready yet, wait and ask again", and `Err(_)` stops it immediately.
//! `Ok(None)` is not a failure; only exhausting the plan turns it into one.
mod clock;
pub use clock::{Clock, ClockHandle, RecordingClock, TokioClock};

mod delay;
pub use delay::{compute_delay, compute_delay_with, compute_schedule, upper_bound_delay};

mod error;
pub use error::BackoffError;

mod format;
pub use format::{DelayTable, ms_to_time};

mod plan;
pub use plan::BackoffPlan;

mod probe;
pub use probe::{AttemptContext, FnProbe, Probe, probe_fn};

mod scheduler;
pub use scheduler::BackoffScheduler;
