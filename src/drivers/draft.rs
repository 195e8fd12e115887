//! Forced-draft blower driver.
//!
//! The blower motor will not start reliably from rest at a low PWM level,
//! so every start from standstill is a full-power kick for
//! [`DRAFT_STARTUP_MS`] before the requested level is applied.
//!
//! ```text
//!   Stopped ──set_speed(n>0)──▶ Kicking (output = MAX) ──timer──▶ Running (output = n)
//!      ▲                              │                              │
//!      └─────────set_speed(0)─────────┴─────────set_speed(0)─────────┘
//! ```
//!
//! ## Level mapping
//!
//! Levels are 8-bit (0–255) and mapped onto the channel's
//! `max_duty_cycle()`.  Requests are clamped to [`DRAFT_MAX`]; non-zero
//! requests below [`DRAFT_MIN_RUNNING`] are raised to it.
//!
//! The driver never blocks: call [`DraftBlower::tick`] from every fast
//! loop iteration to finish a pending startup kick.

use embedded_hal::pwm::SetDutyCycle;

use crate::config::{DRAFT_MAX, DRAFT_MIN_RUNNING, DRAFT_STARTUP_MS, DRAFT_STOP};
use crate::error::ActuatorError;
use crate::timer::{MilliTimer, TimerStatus};

/// Startup-sequencing blower driver over a PWM channel.
pub struct DraftBlower<P> {
    pwm: P,
    /// Level most recently requested (after clamping).
    last_command: u8,
    /// Level currently written to the channel.
    output: u8,
    startup: MilliTimer,
}

impl<P: SetDutyCycle> DraftBlower<P> {
    /// Wrap a PWM channel.  The blower is considered stopped; nothing is
    /// written until the first [`set_speed`](Self::set_speed).
    pub fn new(pwm: P) -> Self {
        Self {
            pwm,
            last_command: DRAFT_STOP,
            output: DRAFT_STOP,
            startup: MilliTimer::new(),
        }
    }

    /// Request a blower level.
    pub fn set_speed(&mut self, requested: u8, now_ms: u64) -> Result<(), ActuatorError> {
        let mut speed = requested.min(DRAFT_MAX);
        if speed > DRAFT_STOP && speed < DRAFT_MIN_RUNNING {
            speed = DRAFT_MIN_RUNNING;
        }

        if speed == self.last_command {
            return Ok(());
        }

        if speed == DRAFT_STOP {
            return self.stop();
        }

        if self.last_command == DRAFT_STOP {
            // From standstill: kick at full power, apply `speed` later.
            self.write(DRAFT_MAX)?;
            self.last_command = speed;
            self.startup.start(now_ms, DRAFT_STARTUP_MS);
            return Ok(());
        }

        if self.startup.status(now_ms) == TimerStatus::Unset {
            self.write(speed)?;
        }
        self.last_command = speed;
        Ok(())
    }

    /// Stop immediately, cancelling any startup kick.
    ///
    /// A failed write leaves the previous command in place, so the next
    /// stop request writes again.
    pub fn stop(&mut self) -> Result<(), ActuatorError> {
        self.startup.reset();
        self.write(DRAFT_STOP)?;
        self.last_command = DRAFT_STOP;
        Ok(())
    }

    /// Finish the startup kick once its timer has expired.  The kick stays
    /// pending until the write succeeds.
    pub fn tick(&mut self, now_ms: u64) -> Result<(), ActuatorError> {
        if self.startup.is_expired(now_ms) {
            self.write(self.last_command)?;
            self.startup.reset();
        }
        Ok(())
    }

    /// Level most recently requested.
    pub fn speed(&self) -> u8 {
        self.last_command
    }

    /// Level currently on the wire (differs from [`speed`](Self::speed)
    /// during a startup kick).
    pub fn output(&self) -> u8 {
        self.output
    }

    pub fn is_running(&self) -> bool {
        self.last_command != DRAFT_STOP
    }

    /// True while the full-power startup kick is in progress.
    pub fn is_kicking(&mut self, now_ms: u64) -> bool {
        self.startup.is_set(now_ms)
    }

    pub fn pwm(&self) -> &P {
        &self.pwm
    }

    fn write(&mut self, level: u8) -> Result<(), ActuatorError> {
        self.pwm
            .set_duty_cycle_fraction(u16::from(level), u16::from(u8::MAX))
            .map_err(|_| ActuatorError::PwmWriteFailed)?;
        self.output = level;
        Ok(())
    }
}
