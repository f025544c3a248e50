//! Wall-clock sources for validity and freshness checks.

use std::time::SystemTime;

/// Source of "now".
pub trait TimeSource: Send + Sync {
    /// Current time.
    fn now(&self) -> SystemTime;
}

/// The system clock.
#[derive(Copy, Clone, Debug, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// A clock stopped at a fixed instant.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct FixedClock(pub SystemTime);

impl TimeSource for FixedClock {
    fn now(&self) -> SystemTime {
        self.0
    }
}
