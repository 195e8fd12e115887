//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the blackboard the state handlers read from and write
//! to: the latest flue reading and heat demand, the regulator, the
//! fault-detection timers and the controller's latches.  Handlers never
//! touch hardware; the helpers below change the regulator directly and
//! record a [`ControlAction`] for everything the outside world must act on
//! (beeper, fan relay) or be told about.

use core::fmt;

use heapless::Vec;

use crate::config::{
    AIR_BOOST_SECS, DRAFT_MAX, DRAFT_STOP, FUEL_WAIT_SECS, MAX_FLUE_WAIT_SECS, StoveConfig,
};
use crate::control::regulator::{Regulator, RegulatorMode};
use crate::safety::AlarmKind;
use crate::timer::MilliTimer;

/// Room for every action a single tick can record.
pub const ACTION_QUEUE_LEN: usize = 16;

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// Something the controller did during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    /// Regulator manual, blower stopped.
    DraftOff,
    /// Regulator automatic on the idle target.
    DraftIdle,
    /// Regulator automatic on the run target.
    DraftRun,
    /// Regulator manual, blower at full power.
    DraftFull,
    /// Blower held at zero while the regulator keeps running.
    DraftPause,
    DraftResume,
    StartAirBoostTimer,
    /// Fuel-request beeper on, fuel-wait timer armed.
    StartFuelWaitAlarm,
    StopFuelWaitAlarm,
    /// Blower stopped, circulation fan forced on, alarm beeper on.
    AlarmConditionOn,
    AlarmConditionOff,
}

impl fmt::Display for ControlAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::DraftOff => "draft off",
            Self::DraftIdle => "draft idle",
            Self::DraftRun => "draft run",
            Self::DraftFull => "draft full",
            Self::DraftPause => "draft pause",
            Self::DraftResume => "draft resume",
            Self::StartAirBoostTimer => "start air boost timer",
            Self::StartFuelWaitAlarm => "start fuel wait alarm",
            Self::StopFuelWaitAlarm => "stop fuel wait alarm",
            Self::AlarmConditionOn => "alarm condition on",
            Self::AlarmConditionOff => "alarm condition off",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
pub struct FsmContext {
    // -- Timing --
    /// Monotonic time of the current tick (ms).
    pub now_ms: u64,

    // -- Inputs --
    /// Latest flue reading, `None` when the probe is faulted.
    pub temperature: Option<i32>,
    /// Thermostat heat demand.
    pub call_for_heat: bool,
    /// Alarm classification for this tick (set by the service).
    pub alarm: AlarmKind,

    // -- Configuration --
    pub config: StoveConfig,

    // -- Control --
    pub regulator: Regulator,
    /// Flue must reach its band before this expires.
    pub flue_timer: MilliTimer,
    pub fuel_wait_timer: MilliTimer,
    pub air_boost_timer: MilliTimer,

    // -- Latches --
    /// Grants the long flue wait until the fire first reaches run band.
    pub cold_start: bool,
    /// Lowest flue reading since entering `DyingFire`.
    pub low_water_mark: i32,
    /// A dying fire found in `Idle` should ask for fuel (once).
    pub dying_fire_alarm_in_idle: bool,
    /// Air boost pressed and not yet consumed.
    pub air_boost_requested: bool,
    /// Blower held at zero while the regulator stays automatic.
    pub draft_paused: bool,

    actions: Vec<ControlAction, ACTION_QUEUE_LEN>,
}

impl FsmContext {
    /// Fresh controller context: regulator manual and stopped, all timers
    /// unset, gains taken from `config`.
    pub fn new(config: StoveConfig) -> Self {
        let mut regulator = Regulator::new();
        regulator.set_tunings(config.kp, config.ki, config.kd);
        Self {
            now_ms: 0,
            temperature: None,
            call_for_heat: false,
            alarm: AlarmKind::None,
            config,
            regulator,
            flue_timer: MilliTimer::new(),
            fuel_wait_timer: MilliTimer::new(),
            air_boost_timer: MilliTimer::new(),
            cold_start: true,
            low_water_mark: 0,
            dying_fire_alarm_in_idle: false,
            air_boost_requested: false,
            draft_paused: false,
            actions: Vec::new(),
        }
    }

    /// Drain the actions recorded since the last call.
    pub fn take_actions(&mut self) -> Vec<ControlAction, ACTION_QUEUE_LEN> {
        core::mem::take(&mut self.actions)
    }

    /// Actions recorded and not yet drained.
    pub fn pending_actions(&self) -> &[ControlAction] {
        &self.actions
    }

    // ── Blower / regulator ───────────────────────────────────

    pub fn draft_off(&mut self) {
        self.regulator.set_mode(RegulatorMode::Manual);
        self.regulator.set_output(f64::from(DRAFT_STOP));
        self.draft_paused = false;
        self.record(ControlAction::DraftOff);
    }

    pub fn draft_idle(&mut self) {
        self.regulator.set_mode(RegulatorMode::Automatic);
        self.regulator.set_setpoint(self.config.idle_target);
        self.draft_paused = false;
        self.record(ControlAction::DraftIdle);
    }

    pub fn draft_run(&mut self) {
        self.regulator.set_mode(RegulatorMode::Automatic);
        self.regulator.set_setpoint(self.config.run_target);
        self.draft_paused = false;
        self.record(ControlAction::DraftRun);
    }

    pub fn draft_full(&mut self) {
        self.regulator.set_mode(RegulatorMode::Manual);
        self.regulator.set_output(f64::from(DRAFT_MAX));
        self.draft_paused = false;
        self.record(ControlAction::DraftFull);
    }

    pub fn pause_draft(&mut self) {
        if !self.draft_paused {
            self.draft_paused = true;
            self.record(ControlAction::DraftPause);
        }
    }

    pub fn resume_draft(&mut self) {
        if self.draft_paused {
            self.draft_paused = false;
            self.record(ControlAction::DraftResume);
        }
    }

    // ── Timers ───────────────────────────────────────────────

    /// Arm the air-boost timer unless it is already armed.
    pub fn start_air_boost_timer(&mut self) {
        if !self.air_boost_timer.is_set(self.now_ms) {
            self.air_boost_timer
                .start(self.now_ms, u64::from(AIR_BOOST_SECS) * 1000);
            self.record(ControlAction::StartAirBoostTimer);
        }
    }

    pub fn start_fuel_wait_alarm(&mut self) {
        self.fuel_wait_timer
            .start(self.now_ms, u64::from(FUEL_WAIT_SECS) * 1000);
        self.record(ControlAction::StartFuelWaitAlarm);
    }

    pub fn stop_fuel_wait_alarm(&mut self) {
        self.fuel_wait_timer.reset();
        self.record(ControlAction::StopFuelWaitAlarm);
    }

    pub fn fuel_wait_active(&mut self) -> bool {
        self.fuel_wait_timer.is_set(self.now_ms)
    }

    /// Arm the flue-approach timer if it is not already running.  A cold
    /// start gets the longest allowed wait.
    pub fn arm_flue_timer(&mut self) {
        if self.flue_timer.is_set(self.now_ms) {
            return;
        }
        let secs = if self.cold_start {
            MAX_FLUE_WAIT_SECS
        } else {
            self.config.flue_wait_secs
        };
        self.flue_timer.start(self.now_ms, u64::from(secs) * 1000);
    }

    // ── Alarm ────────────────────────────────────────────────

    pub fn alarm_on(&mut self) {
        self.draft_off();
        self.record(ControlAction::AlarmConditionOn);
    }

    pub fn alarm_off(&mut self) {
        self.record(ControlAction::AlarmConditionOff);
    }

    fn record(&mut self, action: ControlAction) {
        // A tick records a handful of actions at most.
        let recorded = self.actions.push(action);
        debug_assert!(recorded.is_ok(), "action queue full");
    }
}
