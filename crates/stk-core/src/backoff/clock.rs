use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;

/// Timer used between backoff attempts.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Suspend the caller for `delay`.
    async fn sleep(&self, delay: Duration);
}

/// Shared handle to a clock implementation.
pub type ClockHandle = Arc<dyn Clock>;

/// Clock backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Clock that returns immediately and remembers every requested delay.
///
/// Useful for dry runs and for asserting on a schedule without waiting for it.
#[derive(Debug, Default)]
pub struct RecordingClock {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays requested so far, in order.
    pub fn slept(&self) -> Vec<Duration> {
        self.slept
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Sum of all requested delays.
    pub fn total(&self) -> Duration {
        self.slept().into_iter().sum()
    }
}

#[async_trait]
impl Clock for RecordingClock {
    async fn sleep(&self, delay: Duration) {
        if let Ok(mut guard) = self.slept.lock() {
            guard.push(delay);
        }
    }
}
