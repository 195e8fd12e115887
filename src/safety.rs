//! Flue alarm evaluation.
//!
//! Runs once per slow tick **before** the state machine.  A probe fault
//! outranks over-temperature: an invalid reading cannot be compared with
//! the threshold.
//!
//! ## Alarm lifecycle
//!
//! 1. [`evaluate`] reports a non-[`AlarmKind::None`] kind.
//! 2. The service forces the state machine into `Alarm`, skipping the rest
//!    of that tick's state logic.
//! 3. Each later tick the `Alarm` state re-reads the kind and returns to
//!    `Idle` once it is `None`.
//!
//! [`AlarmMonitor`] wraps [`evaluate`] with edge tracking so raised and
//! cleared alarms are logged and reported exactly once.

use core::fmt;

use log::{error, info};

/// Why the controller is (or is not) alarming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlarmKind {
    #[default]
    None,
    /// The flue probe returned no valid reading.
    ProbeFault,
    /// Flue at or above the configured alarm threshold.
    OverTemperature,
}

impl AlarmKind {
    pub fn is_active(self) -> bool {
        self != Self::None
    }
}

impl fmt::Display for AlarmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::ProbeFault => write!(f, "probe fault"),
            Self::OverTemperature => write!(f, "over temperature"),
        }
    }
}

/// Classify a flue reading against the alarm threshold.
pub fn evaluate(temperature: Option<i32>, threshold: i32) -> AlarmKind {
    match temperature {
        None => AlarmKind::ProbeFault,
        Some(t) if t >= threshold => AlarmKind::OverTemperature,
        Some(_) => AlarmKind::None,
    }
}

/// Change reported by [`AlarmMonitor::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmEdge {
    Raised(AlarmKind),
    Cleared,
}

/// Tracks the alarm kind across ticks.
#[derive(Debug, Default)]
pub struct AlarmMonitor {
    current: AlarmKind,
}

impl AlarmMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-evaluate and report the edge, if the kind changed.
    ///
    /// A switch from one active kind to another reports `Raised` with the
    /// new kind.
    pub fn update(&mut self, temperature: Option<i32>, threshold: i32) -> Option<AlarmEdge> {
        let kind = evaluate(temperature, threshold);
        if kind == self.current {
            return None;
        }
        self.current = kind;
        if kind.is_active() {
            error!("ALARM RAISED: {kind} (flue={temperature:?}, threshold={threshold})");
            Some(AlarmEdge::Raised(kind))
        } else {
            info!("ALARM CLEARED");
            Some(AlarmEdge::Cleared)
        }
    }

    pub fn current(&self) -> AlarmKind {
        self.current
    }
}
