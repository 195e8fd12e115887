//! System configuration parameters
//!
//! The operator-tunable settings for the stove controller, plus the fixed
//! constants that describe the stove and blower hardware.
//! Tunable values can be replaced at runtime via [`AppCommand::UpdateConfig`]
//! and are persisted through a [`ConfigPort`].
//!
//! Out-of-range values are never rejected: [`StoveConfig::sanitized`] clamps
//! every field into its legal range.
//!
//! [`AppCommand::UpdateConfig`]: crate::app::commands::AppCommand::UpdateConfig
//! [`ConfigPort`]: crate::app::ports::ConfigPort

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Flue temperature limits (°F)
// ---------------------------------------------------------------------------

pub const MIN_IDLE_TARGET: i32 = 125;
pub const DEF_IDLE_TARGET: i32 = 150;
pub const MAX_IDLE_TARGET: i32 = 175;

pub const MIN_RUN_TARGET: i32 = 325;
pub const DEF_RUN_TARGET: i32 = 350;
pub const MAX_RUN_TARGET: i32 = 475;

pub const MIN_ALARM_THRESHOLD: i32 = 400;
pub const DEF_ALARM_THRESHOLD: i32 = 475;
pub const MAX_ALARM_THRESHOLD: i32 = 600;

pub const MIN_FLUE_WAIT_SECS: u32 = 60;
pub const DEF_FLUE_WAIT_SECS: u32 = 120;
/// Also the patience granted on a cold start.
pub const MAX_FLUE_WAIT_SECS: u32 = 300;

/// How far below a target the flue may sit before the approach timer runs.
pub const DYING_FIRE_OFFSET: i32 = 10;

/// The draft blower never runs below this flue temperature.
pub const MIN_DRAFT_TEMP: i32 = 100;

// ---------------------------------------------------------------------------
// Circulation fan thresholds (°F, flue temperature)
// ---------------------------------------------------------------------------

pub const MIN_FAN_ON_TEMP: i32 = 150;
pub const DEF_FAN_ON_TEMP: i32 = 250;
pub const MAX_FAN_ON_TEMP: i32 = 350;

pub const MIN_FAN_OFF_TEMP: i32 = 125;
pub const DEF_FAN_OFF_TEMP: i32 = 200;
pub const MAX_FAN_OFF_TEMP: i32 = 350;

pub const MIN_FAN_HYSTERESIS: i32 = 25;

// ---------------------------------------------------------------------------
// Draft blower (empirical motor limits, 8-bit PWM units)
// ---------------------------------------------------------------------------

pub const DRAFT_STARTUP_MS: u64 = 500;
pub const DRAFT_STOP: u8 = 0;
/// Lowest command that keeps the blower turning.
pub const DRAFT_MIN_RUNNING: u8 = 3;
pub const DRAFT_MAX: u8 = 215;

pub const AIR_BOOST_SECS: u32 = 60;

// ---------------------------------------------------------------------------
// Regulator
// ---------------------------------------------------------------------------

pub const REGULATOR_SAMPLE_MS: u64 = 1000;
/// Brings flue degrees into the same range as the blower command.
pub const REGULATOR_SCALE: f64 = 0.10;

// ---------------------------------------------------------------------------
// Beeper patterns (seconds)
// ---------------------------------------------------------------------------

pub const FUEL_BEEP_ON_SECS: u32 = 1;
pub const FUEL_BEEP_OFF_SECS: u32 = 60 - FUEL_BEEP_ON_SECS;
/// How long to ask for fuel before giving up.
pub const FUEL_WAIT_SECS: u32 = 5 * 60;

pub const ALARM_BEEP_ON_SECS: u32 = 5;
pub const ALARM_BEEP_OFF_SECS: u32 = 30 - ALARM_BEEP_ON_SECS;
pub const ALARM_MUTE_SECS: u32 = 5 * 60;

/// Operator-tunable stove settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoveConfig {
    // --- Flue targets ---
    /// Flue temperature held while nobody calls for heat.
    pub idle_target: i32,
    /// Flue temperature held while the thermostat calls for heat.
    pub run_target: i32,

    // --- Safety ---
    /// Flue temperature at or above which the controller alarms.
    pub alarm_threshold: i32,
    /// Seconds the flue may stay below target before the fire is declared dying.
    pub flue_wait_secs: u32,

    // --- Circulation fan ---
    pub fan_on_temp: i32,
    pub fan_off_temp: i32,

    // --- Regulator gains ---
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl Default for StoveConfig {
    fn default() -> Self {
        Self {
            idle_target: DEF_IDLE_TARGET,
            run_target: DEF_RUN_TARGET,

            alarm_threshold: DEF_ALARM_THRESHOLD,
            flue_wait_secs: DEF_FLUE_WAIT_SECS,

            fan_on_temp: DEF_FAN_ON_TEMP,
            fan_off_temp: DEF_FAN_OFF_TEMP,

            // Zero gains: the blower idles on the manual override until tuned.
            kp: 0.0,
            ki: 0.0,
            kd: 0.0,
        }
    }
}

impl StoveConfig {
    /// Clamp every field into its legal range.
    ///
    /// The fan-off threshold is additionally held at least
    /// [`MIN_FAN_HYSTERESIS`] below the fan-on threshold.
    pub fn sanitized(mut self) -> Self {
        self.idle_target = self.idle_target.clamp(MIN_IDLE_TARGET, MAX_IDLE_TARGET);
        self.run_target = self.run_target.clamp(MIN_RUN_TARGET, MAX_RUN_TARGET);
        self.alarm_threshold = self
            .alarm_threshold
            .clamp(MIN_ALARM_THRESHOLD, MAX_ALARM_THRESHOLD);
        self.flue_wait_secs = self
            .flue_wait_secs
            .clamp(MIN_FLUE_WAIT_SECS, MAX_FLUE_WAIT_SECS);

        self.fan_on_temp = self.fan_on_temp.clamp(MIN_FAN_ON_TEMP, MAX_FAN_ON_TEMP);
        let fan_off_max = (self.fan_on_temp - MIN_FAN_HYSTERESIS).min(MAX_FAN_OFF_TEMP);
        self.fan_off_temp = self.fan_off_temp.clamp(MIN_FAN_OFF_TEMP, fan_off_max);

        self.kp = sanitize_gain(self.kp);
        self.ki = sanitize_gain(self.ki);
        self.kd = sanitize_gain(self.kd);
        self
    }

    /// Whether [`sanitized`](Self::sanitized) would leave this config unchanged.
    pub fn is_in_range(&self) -> bool {
        self.clone().sanitized() == *self
    }
}

fn sanitize_gain(gain: f64) -> f64 {
    if gain.is_finite() { gain.max(0.0) } else { 0.0 }
}
