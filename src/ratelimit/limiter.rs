//! Leaky-bucket admission limiter.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;
use tracing::trace;

use super::clock::{Clock, MonotonicClock};
use super::policy::LimitPolicy;
use crate::error::Result;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// A leaky bucket deciding whether requests may proceed.
///
/// Every admitted request occupies one slot until it leaks out; slots leak
/// oldest first at `leak_rate` per second. When all `capacity` slots are
/// occupied, further requests are rejected.
///
/// Leaking is discretised: each leak removes `floor(elapsed * leak_rate)`
/// slots and then restarts the elapsed-time reference at the current
/// instant, so the fractional part of a slot is dropped. Under sparse
/// traffic the observed drain rate can therefore be slightly below the
/// configured rate.
///
/// This struct is thread-safe and can be shared across multiple tasks.
pub struct Limiter {
    policy: LimitPolicy,
    clock: Arc<dyn Clock>,
    state: Mutex<BucketState>,
}

struct BucketState {
    /// Admission instants of occupied slots, oldest first
    bucket: VecDeque<Instant>,
    /// Reference instant for the next leak
    last_leak: Instant,
}

impl BucketState {
    /// Release the slots that have leaked since `last_leak`.
    ///
    /// An instant earlier than `last_leak` counts as zero elapsed time, so
    /// `last_leak` only ever moves forward.
    fn leak(&mut self, now: Instant, leak_rate: u32) -> usize {
        let elapsed = now.saturating_duration_since(self.last_leak);
        let leaked = elapsed.as_nanos() * u128::from(leak_rate) / NANOS_PER_SEC;
        if leaked == 0 {
            return 0;
        }

        let released = leaked.min(self.bucket.len() as u128) as usize;
        self.bucket.drain(..released);
        self.last_leak = now;
        released
    }
}

impl Limiter {
    /// Create a limiter reading time from the monotonic system clock.
    ///
    /// Fails with a configuration error if either parameter is zero.
    pub fn new(capacity: u32, leak_rate: u32) -> Result<Self> {
        Self::with_clock(capacity, leak_rate, Arc::new(MonotonicClock))
    }

    /// Create a limiter reading time from `clock`.
    pub fn with_clock(capacity: u32, leak_rate: u32, clock: Arc<dyn Clock>) -> Result<Self> {
        let policy = LimitPolicy::new(capacity, leak_rate)?;
        Ok(Self::from_policy(policy, clock))
    }

    /// Create a limiter from an already validated policy.
    pub fn from_policy(policy: LimitPolicy, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        Self {
            policy,
            clock,
            state: Mutex::new(BucketState {
                bucket: VecDeque::with_capacity(policy.capacity as usize),
                last_leak: now,
            }),
        }
    }

    /// Decide whether one more request may proceed.
    ///
    /// Never blocks beyond the short internal critical section.
    pub fn allow(&self) -> bool {
        let mut state = self.state.lock();
        let now = self.clock.now();

        let released = state.leak(now, self.policy.leak_rate);
        let admitted = state.bucket.len() < self.policy.capacity as usize;
        if admitted {
            state.bucket.push_back(now);
        }

        trace!(
            released = released,
            occupancy = state.bucket.len(),
            capacity = self.policy.capacity,
            admitted = admitted,
            "Admission decision"
        );

        admitted
    }

    /// Number of occupied slots after leaking up to the current instant.
    pub fn occupancy(&self) -> usize {
        let mut state = self.state.lock();
        let now = self.clock.now();
        state.leak(now, self.policy.leak_rate);
        state.bucket.len()
    }

    /// The policy this limiter enforces.
    pub fn policy(&self) -> LimitPolicy {
        self.policy
    }
}

impl std::fmt::Debug for Limiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Limiter")
            .field("policy", &self.policy)
            .field("occupancy", &self.state.lock().bucket.len())
            .finish()
    }
}
