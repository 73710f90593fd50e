//! Timing instrumentation helpers

use std::time::{Duration, Instant};

/// Tracks the elapsed time of one dispatched operation
///
/// # Example
///
/// ```
/// use hostbus_infrastructure::utils::TimedOperation;
///
/// let timer = TimedOperation::start();
/// let elapsed = timer.elapsed_ms();
/// assert!(elapsed < 60_000);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TimedOperation {
    start: Instant,
}

impl TimedOperation {
    /// Start timing now
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Elapsed whole milliseconds, saturating at `u64::MAX`
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Elapsed time
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Default for TimedOperation {
    fn default() -> Self {
        Self::start()
    }
}
