//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (flue probe, panel inputs, fan/beeper relays, event
//! sinks, settings storage) implement these traits.  The
//! [`AppService`](super::service::AppService) consumes them via generics,
//! so the controller never touches hardware directly.  The draft blower is
//! the exception: it is an `embedded-hal` PWM channel owned by the
//! service's [`DraftBlower`](crate::drivers::draft::DraftBlower).

use crate::config::StoveConfig;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Flue temperature source.
pub trait SensorPort {
    /// Latest smoothed flue temperature (°F), `None` if the probe is
    /// open, shorted or otherwise unreadable.
    fn current_temperature(&mut self) -> Option<i32>;
}

// ───────────────────────────────────────────────────────────────
// Input port (driven adapter: panel / thermostat → domain)
// ───────────────────────────────────────────────────────────────

/// One sample of the discrete inputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    /// Thermostat heat demand (level).
    pub call_for_heat: bool,
    /// Mute button pressed since the last sample (edge).
    pub mute: bool,
    /// Air-boost button pressed since the last sample (edge).
    pub air_boost: bool,
}

/// Sampled once per fast tick.  Debouncing and edge detection happen on
/// the adapter side.
pub trait InputPort {
    fn sample(&mut self) -> InputSnapshot;
}

// ───────────────────────────────────────────────────────────────
// Output port (driven adapter: domain → fan relay / beeper)
// ───────────────────────────────────────────────────────────────

pub trait OutputPort {
    /// Force the circulation fan on regardless of its own thermostat, or
    /// release it back to automatic control.
    fn force_fan(&mut self, on: bool);

    /// Start a repeating beep pattern.
    fn beep(&mut self, on_secs: u32, off_secs: u32);

    fn stop_beeper(&mut self);

    /// Silence the current pattern for `secs` without cancelling it.
    fn mute_beeper(&mut self, secs: u32);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists the stove settings.
///
/// Values are clamped by [`StoveConfig::sanitized`] on the way in; this
/// port only moves bytes.
pub trait ConfigPort {
    /// Load settings.  Implementations return defaults (and persist them)
    /// when nothing usable is stored.
    fn load(&self) -> Result<StoveConfig, ConfigError>;

    fn save(&self, config: &StoveConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored blob failed to deserialize.
    Corrupted,
    /// Stored blob was written by an incompatible layout version.
    VersionMismatch { found: u8, expected: u8 },
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::VersionMismatch { found, expected } => {
                write!(f, "config version {found}, expected {expected}")
            }
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for ConfigError {}
