//! Time sources for admission control.
//!
//! Limiters never read the system time directly. They are handed a [`Clock`]
//! at construction so tests can drive time by hand instead of sleeping.

use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// A source of monotonic instants.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> Instant;
}

/// Clock backed by [`Instant::now`], which is monotonic on every supported
/// platform and unaffected by wall-clock adjustments.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
///
/// It can also be stepped backward, which a real monotonic clock never does,
/// to exercise the limiter's handling of clock anomalies.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    /// Create a manual clock frozen at the current instant.
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// Create a manual clock frozen at `start`.
    pub fn starting_at(start: Instant) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }

    /// Move the clock backward. The step is ignored if it would underflow
    /// the platform's `Instant` representation.
    pub fn rewind(&self, by: Duration) {
        let mut now = self.now.lock();
        if let Some(earlier) = now.checked_sub(by) {
            *now = earlier;
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }
}
