//! Fuzz target: controller under arbitrary probe and panel input
//!
//! Each input byte pair is one 100 ms loop iteration: the first byte picks
//! the flue reading (0xFF = probe fault), the second the panel state
//! (heat demand, mute, air boost) and how far the clock jumps.
//!
//! Invariants checked:
//! - No panics
//! - The blower is never commanded between stop and its minimum running level
//! - A faulted probe is in `Alarm` once the slow tick has seen it
//!
//! cargo fuzz run fuzz_controller_inputs

#![no_main]

use std::convert::Infallible;

use embedded_hal::pwm::{ErrorType, SetDutyCycle};
use libfuzzer_sys::fuzz_target;
use stovectl::app::events::AppEvent;
use stovectl::app::ports::{EventSink, InputPort, InputSnapshot, OutputPort, SensorPort};
use stovectl::app::service::AppService;
use stovectl::config::{DRAFT_MAX, DRAFT_MIN_RUNNING, StoveConfig};
use stovectl::fsm::StateId;

struct Pwm;

impl ErrorType for Pwm {
    type Error = Infallible;
}

impl SetDutyCycle for Pwm {
    fn max_duty_cycle(&self) -> u16 {
        255
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        assert!(duty == 0 || (u16::from(DRAFT_MIN_RUNNING)..=u16::from(DRAFT_MAX)).contains(&duty));
        Ok(())
    }
}

#[derive(Default)]
struct Board {
    temperature: Option<i32>,
    panel: u8,
}

impl SensorPort for Board {
    fn current_temperature(&mut self) -> Option<i32> {
        self.temperature
    }
}

impl InputPort for Board {
    fn sample(&mut self) -> InputSnapshot {
        InputSnapshot {
            call_for_heat: self.panel & 0x01 != 0,
            mute: self.panel & 0x02 != 0,
            air_boost: self.panel & 0x04 != 0,
        }
    }
}

impl OutputPort for Board {
    fn force_fan(&mut self, _on: bool) {}
    fn beep(&mut self, _on_secs: u32, _off_secs: u32) {}
    fn stop_beeper(&mut self) {}
    fn mute_beeper(&mut self, _secs: u32) {}
}

struct Discard;

impl EventSink for Discard {
    fn emit(&mut self, _event: &AppEvent) {}
}

fuzz_target!(|data: &[u8]| {
    let config = StoveConfig {
        kp: 4.0,
        ki: 0.1,
        kd: 10.0,
        ..StoveConfig::default()
    };
    let mut app = AppService::new(config, Pwm);
    let mut board = Board::default();
    let mut sink = Discard;
    app.start(&mut sink);

    let mut now_ms = 0u64;
    let mut last_second = None;
    for pair in data.chunks_exact(2) {
        board.temperature = match pair[0] {
            0xFF => None,
            b => Some(40 + i32::from(b) * 2),
        };
        board.panel = pair[1];

        // Upper bits: 100 ms to several seconds per step.
        now_ms += 100 * (1 + u64::from(pair[1] >> 3));
        app.tick(now_ms, &mut board, &mut sink);

        let second = now_ms / 1000;
        if last_second != Some(second) && board.temperature.is_none() {
            assert_eq!(app.state(), StateId::Alarm);
        }
        last_second = Some(second);
    }
});
