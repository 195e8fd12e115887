//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events
//! through the `log` facade.  Telemetry lines are comma-separated so a
//! captured log can be pasted straight into a plotter.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => {
                info!(
                    "LOG, {}, {}, {}, {}, {}, {}, {}",
                    t.uptime_secs,
                    if t.call_for_heat { "H" } else { "I" },
                    t.state,
                    t.temperature.map_or_else(|| "INVALID".into(), |v| v.to_string()),
                    t.blower,
                    t.target.unwrap_or(0),
                    if t.fan_forced { "FAN" } else { "-" },
                );
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {} -> {}", from, to);
            }
            AppEvent::Action { state, action } => {
                info!("ACTION | {} | {}", state, action);
            }
            AppEvent::AlarmRaised(kind) => {
                warn!("ALARM | raised: {}", kind);
            }
            AppEvent::AlarmCleared => {
                info!("ALARM | cleared");
            }
            AppEvent::Started(state) => {
                info!("START | initial_state={}", state);
            }
        }
    }
}
