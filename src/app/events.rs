//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them.

use crate::fsm::StateId;
use crate::fsm::context::ControlAction;
use crate::safety::AlarmKind;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Once per slow tick.
    Telemetry(TelemetryData),

    StateChanged { from: StateId, to: StateId },

    /// The controller took `action` while in (or entering) `state`.
    Action { state: StateId, action: ControlAction },

    AlarmRaised(AlarmKind),

    AlarmCleared,

    /// The application service has started (carries initial state).
    Started(StateId),
}

/// A point-in-time telemetry snapshot suitable for logging or plotting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryData {
    pub uptime_secs: u64,
    pub call_for_heat: bool,
    pub state: StateId,
    /// `None` while the probe is faulted.
    pub temperature: Option<i32>,
    /// Blower level last requested (0–255 scale).
    pub blower: u8,
    /// Flue target, only in `Idle` and `Running`.
    pub target: Option<i32>,
    pub fan_forced: bool,
}
