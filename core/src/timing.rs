//! Frame-rate constants and the time source used for audio scheduling.

use std::time::{Duration, Instant};

/// Frames produced per second of wall-clock time.
pub const FRAME_RATE: u32 = 60;

/// Duration of one frame at [`FRAME_RATE`].
pub const fn frame_period() -> Duration {
    Duration::from_nanos(1_000_000_000 / FRAME_RATE as u64)
}

/// Convert a sample count at `sample_rate` into a duration (truncated to
/// whole nanoseconds).
pub const fn samples_to_duration(samples: usize, sample_rate: u32) -> Duration {
    Duration::from_nanos(samples as u64 * 1_000_000_000 / sample_rate as u64)
}

/// Monotonic time source for the playback timeline.
///
/// `now()` is measured from an arbitrary origin fixed by the implementation;
/// only differences and orderings are meaningful.
pub trait Clock {
    fn now(&self) -> Duration;
}

/// [`Clock`] backed by [`Instant`], with its origin at construction.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}
