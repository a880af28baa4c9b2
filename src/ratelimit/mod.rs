//! Leaky-bucket admission control.

mod admission;
mod clock;
mod limiter;
mod policy;

pub use admission::AdmissionControl;
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use limiter::Limiter;
pub use policy::{LimitPolicy, LimiterScope, DEFAULT_CAPACITY, DEFAULT_LEAK_RATE};
