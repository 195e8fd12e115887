//! Non-blocking millisecond timer.
//!
//! Every timed decision in the controller (flue approach, fuel wait, air
//! boost, blower startup kick) is a [`MilliTimer`].  The timer never
//! sleeps; callers pass the current monotonic time in milliseconds and
//! read back a [`TimerStatus`].
//!
//! ```text
//!   Unset ──start()──▶ Running ──elapsed ≥ duration──▶ Expired
//!     ▲                   │                              │
//!     └─────reset()───────┴──────────reset()─────────────┘
//! ```
//!
//! `Expired` is sticky: it persists across reads until [`MilliTimer::reset`]
//! or a fresh [`MilliTimer::start`].

/// Observable status of a [`MilliTimer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerStatus {
    Unset,
    Running,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Unset,
    Running { started_ms: u64, duration_ms: u64 },
    Expired,
}

/// One-shot timer driven by an externally supplied clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MilliTimer {
    phase: Phase,
}

impl Default for MilliTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl MilliTimer {
    pub const fn new() -> Self {
        Self { phase: Phase::Unset }
    }

    /// Arm (or re-arm) the timer to expire `duration_ms` after `now_ms`.
    pub fn start(&mut self, now_ms: u64, duration_ms: u64) {
        self.phase = Phase::Running {
            started_ms: now_ms,
            duration_ms,
        };
    }

    /// Disarm the timer.
    pub fn reset(&mut self) {
        self.phase = Phase::Unset;
    }

    /// Current status, latching `Expired` once the duration has elapsed.
    pub fn status(&mut self, now_ms: u64) -> TimerStatus {
        if let Phase::Running {
            started_ms,
            duration_ms,
        } = self.phase
        {
            if now_ms.saturating_sub(started_ms) >= duration_ms {
                self.phase = Phase::Expired;
            }
        }
        match self.phase {
            Phase::Unset => TimerStatus::Unset,
            Phase::Running { .. } => TimerStatus::Running,
            Phase::Expired => TimerStatus::Expired,
        }
    }

    pub fn is_set(&mut self, now_ms: u64) -> bool {
        self.status(now_ms) != TimerStatus::Unset
    }

    pub fn is_expired(&mut self, now_ms: u64) -> bool {
        self.status(now_ms) == TimerStatus::Expired
    }
}
