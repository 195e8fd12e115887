//! Mock board for integration tests.
//!
//! One struct plays probe, front panel and relays, and records every
//! outward command so tests can assert on the full history.

use std::cell::{Cell, RefCell};
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::pwm::{ErrorType, SetDutyCycle};
use stovectl::app::events::AppEvent;
use stovectl::app::ports::{
    ConfigError, ConfigPort, EventSink, InputPort, InputSnapshot, OutputPort, SensorPort,
};
use stovectl::app::service::AppService;
use stovectl::config::StoveConfig;
use stovectl::fsm::StateId;

// ── Output call record ────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputCall {
    ForceFan(bool),
    Beep { on_secs: u32, off_secs: u32 },
    StopBeeper,
    MuteBeeper(u32),
}

// ── MockBoard ─────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MockBoard {
    /// `None` reads as a faulted probe.
    pub temperature: Option<i32>,
    pub call_for_heat: bool,
    /// Momentary: consumed by the next `sample()`.
    pub mute_pressed: bool,
    /// Momentary: consumed by the next `sample()`.
    pub air_boost_pressed: bool,
    pub calls: Vec<OutputCall>,
}

#[allow(dead_code)]
impl MockBoard {
    pub fn at(temperature: i32) -> Self {
        Self {
            temperature: Some(temperature),
            ..Self::default()
        }
    }

    pub fn saw(&self, call: OutputCall) -> bool {
        self.calls.contains(&call)
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }
}

impl SensorPort for MockBoard {
    fn current_temperature(&mut self) -> Option<i32> {
        self.temperature
    }
}

impl InputPort for MockBoard {
    fn sample(&mut self) -> InputSnapshot {
        InputSnapshot {
            call_for_heat: self.call_for_heat,
            mute: std::mem::take(&mut self.mute_pressed),
            air_boost: std::mem::take(&mut self.air_boost_pressed),
        }
    }
}

impl OutputPort for MockBoard {
    fn force_fan(&mut self, on: bool) {
        self.calls.push(OutputCall::ForceFan(on));
    }

    fn beep(&mut self, on_secs: u32, off_secs: u32) {
        self.calls.push(OutputCall::Beep { on_secs, off_secs });
    }

    fn stop_beeper(&mut self) {
        self.calls.push(OutputCall::StopBeeper);
    }

    fn mute_beeper(&mut self, secs: u32) {
        self.calls.push(OutputCall::MuteBeeper(secs));
    }
}

// ── MockPwm ───────────────────────────────────────────────────

/// PWM channel whose duty stays readable after the service takes it.
#[derive(Debug, Clone, Default)]
pub struct MockPwm {
    duty: Rc<Cell<u16>>,
}

#[allow(dead_code)]
impl MockPwm {
    pub fn duty(&self) -> u16 {
        self.duty.get()
    }
}

impl ErrorType for MockPwm {
    type Error = Infallible;
}

impl SetDutyCycle for MockPwm {
    fn max_duty_cycle(&self) -> u16 {
        255
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        self.duty.set(duty);
        Ok(())
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn transitions(&self) -> Vec<(StateId, StateId)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::StateChanged { from, to } => Some((*from, *to)),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── MockConfigStore ───────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MockConfigStore {
    pub saved: RefCell<Option<StoveConfig>>,
    pub saves: Cell<u32>,
    pub fail_saves: Cell<bool>,
}

impl ConfigPort for MockConfigStore {
    fn load(&self) -> Result<StoveConfig, ConfigError> {
        Ok(self.saved.borrow().clone().unwrap_or_default())
    }

    fn save(&self, config: &StoveConfig) -> Result<(), ConfigError> {
        if self.fail_saves.get() {
            return Err(ConfigError::IoError);
        }
        self.saves.set(self.saves.get() + 1);
        *self.saved.borrow_mut() = Some(config.clone());
        Ok(())
    }
}

// ── Harness ───────────────────────────────────────────────────

/// Service plus mocks, ticking once per simulated second.
pub struct Harness {
    pub app: AppService<MockPwm>,
    pub pwm: MockPwm,
    pub board: MockBoard,
    pub sink: RecordingSink,
    pub now_ms: u64,
}

#[allow(dead_code)]
impl Harness {
    pub fn new(config: StoveConfig, temperature: i32) -> Self {
        let pwm = MockPwm::default();
        let mut app = AppService::new(config, pwm.clone());
        let mut sink = RecordingSink::default();
        app.start(&mut sink);
        Self {
            app,
            pwm,
            board: MockBoard::at(temperature),
            sink,
            now_ms: 0,
        }
    }

    /// Tick at the current time, then advance one second.
    pub fn second(&mut self) {
        self.app.tick(self.now_ms, &mut self.board, &mut self.sink);
        self.now_ms += 1000;
    }

    pub fn seconds(&mut self, n: u32) {
        for _ in 0..n {
            self.second();
        }
    }

    /// Tick once per second until `state` is reached; returns the seconds
    /// it took, or `None` after `limit` seconds.
    pub fn run_until(&mut self, state: StateId, limit: u32) -> Option<u32> {
        for elapsed in 1..=limit {
            self.second();
            if self.app.state() == state {
                return Some(elapsed);
            }
        }
        None
    }
}
