//! Flue-temperature regulator.
//!
//! Thin adapter over [`PidController`]: setpoint and measurement are
//! multiplied by a scale factor before they reach the PID core, so gains
//! tuned against the blower's 0–215 command range stay small numbers.
//! Output limits, sample interval and the manual/automatic switch pass
//! straight through.

use super::pid::{Mode, PidController};
use crate::config::{DRAFT_MAX, DRAFT_STOP, REGULATOR_SAMPLE_MS, REGULATOR_SCALE};

pub use super::pid::Mode as RegulatorMode;

/// Scaled PID regulator driving the draft blower.
#[derive(Debug, Clone)]
pub struct Regulator {
    pid: PidController,
    scale: f64,
}

impl Default for Regulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Regulator {
    /// Manual mode, zero output, zero gains, blower limits, 1 s sample.
    pub fn new() -> Self {
        let mut pid = PidController::new(REGULATOR_SAMPLE_MS);
        pid.set_limits(f64::from(DRAFT_STOP), f64::from(DRAFT_MAX));
        Self {
            pid,
            scale: REGULATOR_SCALE,
        }
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.pid.set_mode(mode);
    }

    pub fn mode(&self) -> Mode {
        self.pid.mode()
    }

    pub fn is_automatic(&self) -> bool {
        self.pid.mode() == Mode::Automatic
    }

    pub fn set_output_limits(&mut self, min: f64, max: f64) {
        self.pid.set_limits(min, max);
    }

    pub fn set_sample_interval(&mut self, ms: u64) {
        self.pid.set_sample_time(ms);
    }

    pub fn set_tunings(&mut self, kp: f64, ki: f64, kd: f64) {
        self.pid.set_tunings(kp, ki, kd);
    }

    /// Current `(kp, ki, kd)`.
    pub fn tunings(&self) -> (f64, f64, f64) {
        (self.pid.kp(), self.pid.ki(), self.pid.kd())
    }

    /// Scale factor applied to setpoint and measurement.  Takes effect on the
    /// next [`set_setpoint`](Self::set_setpoint).
    pub fn set_scale(&mut self, scale: f64) {
        if scale.is_finite() && scale > 0.0 {
            self.scale = scale;
        }
    }

    /// Target flue temperature in degrees.
    pub fn set_setpoint(&mut self, degrees: i32) {
        self.pid.set_target(f64::from(degrees) * self.scale);
    }

    /// Target flue temperature in degrees, rounded.
    pub fn setpoint(&self) -> i32 {
        (self.pid.target() / self.scale).round() as i32
    }

    /// Overwrite the output.  No-op in automatic mode.
    pub fn set_output(&mut self, value: f64) {
        self.pid.set_manual_output(value);
    }

    pub fn output(&self) -> f64 {
        self.pid.output()
    }

    /// Feed a flue reading and return the (clamped) output.
    ///
    /// Inside the current sample interval, or in manual mode, this returns
    /// the previous output unchanged.
    pub fn compute(&mut self, degrees: i32, now_ms: u64) -> f64 {
        self.pid.compute(f64::from(degrees) * self.scale, now_ms);
        self.pid.output()
    }
}
