//! Injectable time source for the limiters
//!
//! Both limiters take time as a dependency so tests can drive refill and
//! window rollover without sleeping.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Time source used by the limiters
pub trait Clock: Send + Sync + 'static {
    /// Monotonic instant for measuring elapsed refill time
    fn now(&self) -> Instant;

    /// Wall-clock unix seconds for deriving the window id
    fn unix_secs(&self) -> u64;
}

/// Production clock backed by the operating system
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn unix_secs(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Test clock advanced by hand
#[cfg(test)]
#[derive(Debug)]
pub struct ManualClock {
    start: Instant,
    offset: std::sync::Mutex<Duration>,
}

#[cfg(test)]
impl ManualClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            offset: std::sync::Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock().unwrap() += by;
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.start + *self.offset.lock().unwrap()
    }

    fn unix_secs(&self) -> u64 {
        self.offset.lock().unwrap().as_secs()
    }
}
