//! Naive wood-stove simulator.
//!
//! A lumped thermal model good enough to exercise the controller on a
//! desk: Newtonian cooling toward a cold-basement ambient, heat from fuel
//! burnt at a base rate plus whatever the draft blower adds, and a
//! 30-second delay line between the firebox and the flue probe.  Once
//! three quarters of the load is gone the remaining charcoal yields
//! progressively less heat, so an empty stove fades instead of dropping.
//!
//! The simulator is the flue probe ([`SensorPort`]) and hands out the PWM
//! channel ([`SimBlowerChannel`]) the draft blower drives.

use std::cell::Cell;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::pwm::{ErrorType, SetDutyCycle};

use crate::app::ports::SensorPort;
use crate::config::MIN_DRAFT_TEMP;

pub const AMBIENT_TEMP: f64 = 65.0;
/// Degrees lost per second, per degree above ambient.
pub const COOLING_RATE: f64 = 2.0 / 60.0;
pub const DEGS_PER_OZ: f64 = 360.0;
pub const FUEL_OZ_PER_SEC_AT_FULL_DRAFT: f64 = 0.05;
/// 40 lb of wood.
pub const INITIAL_FUEL_OZ: f64 = 40.0 * 16.0;
/// Below this the next ignition also refuels.
pub const REFUEL_BELOW_OZ: f64 = 10.0;
pub const PROBE_DELAY_SECS: usize = 30;

const SIM_PWM_MAX_DUTY: u16 = 1023;

/// The blower's PWM channel as seen by the simulator.
pub struct SimBlowerChannel {
    duty: Rc<Cell<u16>>,
}

impl ErrorType for SimBlowerChannel {
    type Error = Infallible;
}

impl SetDutyCycle for SimBlowerChannel {
    fn max_duty_cycle(&self) -> u16 {
        SIM_PWM_MAX_DUTY
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        self.duty.set(duty.min(SIM_PWM_MAX_DUTY));
        Ok(())
    }
}

pub struct StoveSim {
    initial_fuel_oz: f64,
    fuel_oz: f64,
    /// Temperature the current fire holds on its own.
    idle_temp: f64,
    firebox_temp: f64,
    /// `[0]` newest, `[PROBE_DELAY_SECS - 1]` what the probe reads.
    delay_line: [f64; PROBE_DELAY_SECS],
    blower_duty: Rc<Cell<u16>>,
    probe_fault: bool,
}

impl Default for StoveSim {
    fn default() -> Self {
        Self::new()
    }
}

impl StoveSim {
    /// A cold stove with a full load.
    pub fn new() -> Self {
        Self::with_fuel(INITIAL_FUEL_OZ)
    }

    /// A cold stove holding `fuel_oz`, which also becomes the refill size.
    pub fn with_fuel(fuel_oz: f64) -> Self {
        let fuel_oz = fuel_oz.max(0.0);
        Self {
            initial_fuel_oz: fuel_oz.max(f64::EPSILON),
            fuel_oz,
            idle_temp: AMBIENT_TEMP,
            firebox_temp: AMBIENT_TEMP,
            delay_line: [AMBIENT_TEMP; PROBE_DELAY_SECS],
            blower_duty: Rc::new(Cell::new(0)),
            probe_fault: false,
        }
    }

    /// PWM channel wired to this stove's blower.
    pub fn blower_channel(&self) -> SimBlowerChannel {
        SimBlowerChannel {
            duty: Rc::clone(&self.blower_duty),
        }
    }

    /// Blower level on the 0–255 scale.
    pub fn blower_level(&self) -> f64 {
        f64::from(self.blower_duty.get()) * 255.0 / f64::from(SIM_PWM_MAX_DUTY)
    }

    pub fn fuel_oz(&self) -> f64 {
        self.fuel_oz
    }

    pub fn firebox_temp(&self) -> f64 {
        self.firebox_temp
    }

    /// Make the probe read as disconnected.
    pub fn set_probe_fault(&mut self, fault: bool) {
        self.probe_fault = fault;
    }

    /// Light (and if nearly empty, refill) the stove.
    pub fn ignite(&mut self) {
        if self.fuel_oz < REFUEL_BELOW_OZ {
            self.fuel_oz = self.initial_fuel_oz;
            self.idle_temp = AMBIENT_TEMP;
        }
        if self.idle_temp == AMBIENT_TEMP {
            self.idle_temp = f64::from(MIN_DRAFT_TEMP);
            self.firebox_temp = self.firebox_temp.max(self.idle_temp);
        }
    }

    /// Advance the model by one second.
    pub fn step_second(&mut self) {
        // No fire, nothing happens.
        if self.firebox_temp != AMBIENT_TEMP {
            self.firebox_temp -= (self.firebox_temp - AMBIENT_TEMP) * COOLING_RATE;

            let base = (self.idle_temp - AMBIENT_TEMP) * COOLING_RATE / DEGS_PER_OZ;
            let draft = self.blower_level() / 255.0 * FUEL_OZ_PER_SEC_AT_FULL_DRAFT;
            let burnt = (base + draft).min(self.fuel_oz);
            self.fuel_oz -= burnt;

            let used = 1.0 - self.fuel_oz / self.initial_fuel_oz;
            let tail = if used < 0.75 {
                1.0
            } else {
                ((1.0 - used) / 0.25).clamp(0.0, 1.0)
            };
            self.firebox_temp += DEGS_PER_OZ * burnt * tail;
        }

        self.delay_line.copy_within(0..PROBE_DELAY_SECS - 1, 1);
        self.delay_line[0] = self.firebox_temp;
    }

    /// What the flue probe reads now.
    pub fn probe_temperature(&self) -> Option<i32> {
        if self.probe_fault {
            return None;
        }
        Some(self.delay_line[PROBE_DELAY_SECS - 1] as i32)
    }
}

impl SensorPort for StoveSim {
    fn current_temperature(&mut self) -> Option<i32> {
        self.probe_temperature()
    }
}
