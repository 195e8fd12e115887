//! Monotonic time sources for the control loop.
//!
//! - [`MonotonicClock`] — wall-clock pacing on `std::time::Instant`.
//! - [`SimClock`] — virtual time that advances only when told to, so a
//!   simulated burn of several hours runs in seconds.

use std::time::{Duration, Instant};

/// Millisecond time source driving [`AppService::tick`](crate::app::service::AppService::tick).
pub trait Clock {
    /// Milliseconds since the clock was created (monotonic).
    fn now_ms(&self) -> u64;

    /// Let `ms` milliseconds pass.
    fn wait(&mut self, ms: u64);

    fn uptime_secs(&self) -> u64 {
        self.now_ms() / 1000
    }
}

/// Real time.
pub struct MonotonicClock {
    start: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    fn wait(&mut self, ms: u64) {
        std::thread::sleep(Duration::from_millis(ms));
    }
}

/// Virtual time.
#[derive(Debug, Default)]
pub struct SimClock {
    now_ms: u64,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for SimClock {
    fn now_ms(&self) -> u64 {
        self.now_ms
    }

    fn wait(&mut self, ms: u64) {
        self.now_ms = self.now_ms.saturating_add(ms);
    }
}
