//! Sampled PID controller for the draft blower.
//!
//! Fixed-interval proportional-integral-derivative controller with a
//! manual/automatic switch.
//!
//! - The integral term is accumulated as `ki * error` once per sample, with
//!   `ki` pre-multiplied by the sample interval, and the accumulated sum is
//!   clamped to the output limits (anti-windup).
//! - The derivative acts on the measurement, not the error, so setpoint
//!   steps do not kick the output.
//! - Switching manual → automatic is bumpless: the integral sum starts at
//!   the current (manual) output.

/// Whether the controller computes its own output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Manual,
    Automatic,
}

/// PID controller
#[derive(Debug, Clone)]
pub struct PidController {
    // Gains as configured (continuous time).
    disp_kp: f64,
    disp_ki: f64,
    disp_kd: f64,
    // Gains scaled to the sample interval.
    kp: f64,
    ki: f64,
    kd: f64,

    sample_ms: u64,
    output_min: f64,
    output_max: f64,
    mode: Mode,

    setpoint: f64,
    input: f64,
    output: f64,
    integral: f64,
    last_input: f64,
    last_time_ms: Option<u64>,
}

impl PidController {
    /// A manual-mode controller with zero gains and `[0, 255]` limits.
    pub fn new(sample_ms: u64) -> Self {
        Self {
            disp_kp: 0.0,
            disp_ki: 0.0,
            disp_kd: 0.0,
            kp: 0.0,
            ki: 0.0,
            kd: 0.0,
            sample_ms: sample_ms.max(1),
            output_min: 0.0,
            output_max: 255.0,
            mode: Mode::Manual,
            setpoint: 0.0,
            input: 0.0,
            output: 0.0,
            integral: 0.0,
            last_input: 0.0,
            last_time_ms: None,
        }
    }

    /// Set the gains.  Negative or non-finite gains are ignored.
    pub fn set_tunings(&mut self, kp: f64, ki: f64, kd: f64) {
        let valid = |g: f64| g.is_finite() && g >= 0.0;
        if !(valid(kp) && valid(ki) && valid(kd)) {
            return;
        }

        self.disp_kp = kp;
        self.disp_ki = ki;
        self.disp_kd = kd;

        let sample_secs = self.sample_ms as f64 / 1000.0;
        self.kp = kp;
        self.ki = ki * sample_secs;
        self.kd = kd / sample_secs;
    }

    pub fn kp(&self) -> f64 {
        self.disp_kp
    }

    pub fn ki(&self) -> f64 {
        self.disp_ki
    }

    pub fn kd(&self) -> f64 {
        self.disp_kd
    }

    /// Change the sample interval, rescaling `ki`/`kd` so the continuous
    /// gains stay the same.  Zero is ignored.
    pub fn set_sample_time(&mut self, sample_ms: u64) {
        if sample_ms == 0 {
            return;
        }
        let ratio = sample_ms as f64 / self.sample_ms as f64;
        self.ki *= ratio;
        self.kd /= ratio;
        self.sample_ms = sample_ms;
    }

    pub fn sample_time(&self) -> u64 {
        self.sample_ms
    }

    /// Set output limits.  Ignored unless `min < max`.
    pub fn set_limits(&mut self, min: f64, max: f64) {
        if min >= max {
            return;
        }
        self.output_min = min;
        self.output_max = max;

        if self.mode == Mode::Automatic {
            self.output = self.output.clamp(min, max);
            self.integral = self.integral.clamp(min, max);
        }
    }

    pub fn limits(&self) -> (f64, f64) {
        (self.output_min, self.output_max)
    }

    pub fn set_mode(&mut self, mode: Mode) {
        if mode == Mode::Automatic && self.mode == Mode::Manual {
            self.initialize();
        }
        self.mode = mode;
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Update setpoint
    pub fn set_target(&mut self, setpoint: f64) {
        self.setpoint = setpoint;
    }

    pub fn target(&self) -> f64 {
        self.setpoint
    }

    /// Overwrite the output.  Only honoured in manual mode.
    pub fn set_manual_output(&mut self, output: f64) {
        if self.mode == Mode::Manual {
            self.output = output;
        }
    }

    pub fn output(&self) -> f64 {
        self.output
    }

    /// Feed a measurement taken at `now_ms`.
    ///
    /// Returns `true` if a new output was computed; `false` in manual mode or
    /// when called again inside the current sample interval.
    pub fn compute(&mut self, measurement: f64, now_ms: u64) -> bool {
        self.input = measurement;
        if self.mode == Mode::Manual {
            return false;
        }
        if let Some(last) = self.last_time_ms {
            if now_ms.saturating_sub(last) < self.sample_ms {
                return false;
            }
        }

        let error = self.setpoint - measurement;
        let d_input = measurement - self.last_input;

        // Integral (with anti-windup)
        self.integral = (self.integral + self.ki * error).clamp(self.output_min, self.output_max);

        // Proportional on error, derivative on measurement
        let output = self.kp * error + self.integral - self.kd * d_input;
        self.output = output.clamp(self.output_min, self.output_max);

        self.last_input = measurement;
        self.last_time_ms = Some(now_ms);
        true
    }

    /// Bumpless transfer into automatic mode.
    fn initialize(&mut self) {
        self.integral = self.output.clamp(self.output_min, self.output_max);
        self.last_input = self.input;
    }
}
