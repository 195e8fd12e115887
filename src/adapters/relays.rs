//! Host-side fan relay and beeper.
//!
//! Implements [`OutputPort`] for the simulator: nothing is switched, but
//! the relay and beeper state is tracked and every change is logged.  The
//! circulation fan also runs its own flue thermostat with the configured
//! on/off thresholds; a forced-on request overrides it.

use log::info;

use crate::app::ports::OutputPort;
use crate::config::StoveConfig;

/// Active beep pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeepPattern {
    pub on_secs: u32,
    pub off_secs: u32,
}

#[derive(Debug, Default)]
pub struct LoggedRelays {
    fan_forced: bool,
    fan_on: bool,
    beeper: Option<BeepPattern>,
    muted_for_secs: u32,
}

impl LoggedRelays {
    pub fn new() -> Self {
        Self::default()
    }

    /// One-second housekeeping: fan thermostat and mute countdown.
    pub fn tick_second(&mut self, temperature: Option<i32>, config: &StoveConfig) {
        let want = if self.fan_forced {
            true
        } else {
            match temperature {
                Some(t) if t >= config.fan_on_temp => true,
                Some(t) if t <= config.fan_off_temp => false,
                _ => self.fan_on,
            }
        };
        if want != self.fan_on {
            self.fan_on = want;
            info!("RELAY | fan {}", if want { "ON" } else { "OFF" });
        }
        self.muted_for_secs = self.muted_for_secs.saturating_sub(1);
    }

    pub fn fan_on(&self) -> bool {
        self.fan_on
    }

    pub fn fan_forced(&self) -> bool {
        self.fan_forced
    }

    pub fn beeper(&self) -> Option<BeepPattern> {
        self.beeper
    }

    /// A pattern is active and not muted.
    pub fn beeping(&self) -> bool {
        self.beeper.is_some() && self.muted_for_secs == 0
    }
}

impl OutputPort for LoggedRelays {
    fn force_fan(&mut self, on: bool) {
        self.fan_forced = on;
        if on && !self.fan_on {
            self.fan_on = true;
            info!("RELAY | fan ON (forced)");
        }
    }

    fn beep(&mut self, on_secs: u32, off_secs: u32) {
        self.beeper = Some(BeepPattern { on_secs, off_secs });
        self.muted_for_secs = 0;
        info!("BEEPER | {on_secs}s on / {off_secs}s off");
    }

    fn stop_beeper(&mut self) {
        if self.beeper.take().is_some() {
            info!("BEEPER | off");
        }
        self.muted_for_secs = 0;
    }

    fn mute_beeper(&mut self, secs: u32) {
        self.muted_for_secs = secs;
        info!("BEEPER | muted for {secs}s");
    }
}
