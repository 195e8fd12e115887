//! Application service — the hexagonal core.
//!
//! [`AppService`] owns the combustion FSM, the alarm monitor, the shared
//! context and the draft blower.  It runs two cadences from one
//! [`tick`](AppService::tick):
//!
//! - **fast** (every call): regulator compute, blower sequencing, button
//!   handling;
//! - **slow** (first call in each new uptime second): alarm check, fuel-wait
//!   expiry, state logic, action dispatch, telemetry.
//!
//! ```text
//!  SensorPort ──▶ ┌────────────────────────────┐ ──▶ EventSink
//!   InputPort ──▶ │         AppService          │
//!  OutputPort ◀── │  FSM · Alarm · Regulator    │ ──▶ DraftBlower ──▶ PWM
//!                 └────────────────────────────┘
//! ```

use embedded_hal::pwm::SetDutyCycle;
use log::{info, warn};

use crate::config::{
    ALARM_BEEP_OFF_SECS, ALARM_BEEP_ON_SECS, ALARM_MUTE_SECS, DRAFT_MAX, DRAFT_STOP,
    FUEL_BEEP_OFF_SECS, FUEL_BEEP_ON_SECS, StoveConfig,
};
use crate::control::regulator::Regulator;
use crate::drivers::draft::DraftBlower;
use crate::fsm::context::{ControlAction, FsmContext};
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId};
use crate::safety::{AlarmEdge, AlarmKind, AlarmMonitor};

use super::commands::AppCommand;
use super::events::{AppEvent, TelemetryData};
use super::ports::{ConfigPort, EventSink, InputPort, InputSnapshot, OutputPort, SensorPort};

/// Settings are persisted this long after the last change.
pub const AUTO_SAVE_DELAY_MS: u64 = 5000;

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

pub struct AppService<P> {
    fsm: Fsm,
    ctx: FsmContext,
    alarm: AlarmMonitor,
    blower: DraftBlower<P>,
    idle_speed_override: u8,
    fan_forced: bool,
    now_ms: u64,
    /// Uptime second of the last slow phase.
    last_second: Option<u64>,
    slow_ticks: u64,
    config_dirty: bool,
    dirty_since_ms: u64,
}

impl<P: SetDutyCycle> AppService<P> {
    /// Construct the service.  `config` is clamped into range.
    ///
    /// Does **not** start the FSM — call [`start`](Self::start) next.
    pub fn new(config: StoveConfig, pwm: P) -> Self {
        let config = sanitize_logged(config);
        Self {
            fsm: Fsm::new(build_state_table(), StateId::NoFire),
            ctx: FsmContext::new(config),
            alarm: AlarmMonitor::new(),
            blower: DraftBlower::new(pwm),
            idle_speed_override: 0,
            fan_forced: false,
            now_ms: 0,
            last_second: None,
            slow_ticks: 0,
            config_dirty: false,
            dirty_since_ms: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Stop the blower and enter the initial state (`NoFire`).
    pub fn start(&mut self, sink: &mut impl EventSink) {
        if let Err(e) = self.blower.stop() {
            warn!("draft blower: {e}");
        }
        self.fsm.start(&mut self.ctx);
        sink.emit(&AppEvent::Started(self.fsm.current_state()));
        info!("AppService started in {:?}", self.fsm.current_state());
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one loop iteration at monotonic time `now_ms`.
    ///
    /// The `hw` parameter satisfies every port the loop touches, which
    /// avoids juggling several mutable borrows of the same board.
    pub fn tick(
        &mut self,
        now_ms: u64,
        hw: &mut (impl SensorPort + InputPort + OutputPort),
        sink: &mut impl EventSink,
    ) {
        self.now_ms = now_ms;
        self.ctx.now_ms = now_ms;

        let temperature = hw.current_temperature();
        let input = hw.sample();
        self.ctx.temperature = temperature;
        self.ctx.call_for_heat = input.call_for_heat;

        self.fast_phase(input, hw);

        let second = now_ms / 1000;
        if self.last_second != Some(second) {
            self.last_second = Some(second);
            self.slow_phase(second, hw, sink);
        }
    }

    fn fast_phase(&mut self, input: InputSnapshot, out: &mut impl OutputPort) {
        let state = self.fsm.current_state();

        // 1. Regulator.  An invalid reading reuses the previous output.
        if let Some(t) = self.ctx.temperature {
            self.ctx.regulator.compute(t, self.now_ms);
        }

        // 2. Blower
        self.drive_blower(state);

        // 3. Buttons
        if input.mute {
            match state {
                StateId::Alarm => out.mute_beeper(ALARM_MUTE_SECS),
                StateId::DyingFire => out.stop_beeper(),
                _ => {}
            }
        }
        if input.air_boost
            && matches!(
                state,
                StateId::NoFire | StateId::Idle | StateId::DyingFire
            )
        {
            self.ctx.air_boost_requested = true;
        }
    }

    fn slow_phase(&mut self, second: u64, out: &mut impl OutputPort, sink: &mut impl EventSink) {
        self.slow_ticks += 1;
        let prev_state = self.fsm.current_state();

        // 1. Alarm check preempts everything else this tick.
        match self
            .alarm
            .update(self.ctx.temperature, self.ctx.config.alarm_threshold)
        {
            Some(AlarmEdge::Raised(kind)) => sink.emit(&AppEvent::AlarmRaised(kind)),
            Some(AlarmEdge::Cleared) => sink.emit(&AppEvent::AlarmCleared),
            None => {}
        }
        self.ctx.alarm = self.alarm.current();

        if self.ctx.alarm.is_active() && prev_state != StateId::Alarm {
            warn!("Alarm condition: {}", self.ctx.alarm);
            self.fsm.force_transition(StateId::Alarm, &mut self.ctx);
        } else {
            // 2. Fuel request gives up after its time.
            if prev_state != StateId::Alarm && self.ctx.fuel_wait_timer.is_expired(self.now_ms) {
                info!("Fuel wait expired, silencing");
                self.ctx.stop_fuel_wait_alarm();
            }

            // 3. State logic
            self.fsm.tick(&mut self.ctx);
        }

        let state = self.fsm.current_state();
        if state != prev_state {
            sink.emit(&AppEvent::StateChanged {
                from: prev_state,
                to: state,
            });
        }

        // The new state's draft reaches the blower on this tick, not the next.
        if state != prev_state {
            self.drive_blower(state);
        }

        self.dispatch_actions(state, out, sink);

        let telemetry = self.build_telemetry(second);
        sink.emit(&AppEvent::Telemetry(telemetry));
    }

    /// Forward recorded controller actions to the relays and the sink.
    fn dispatch_actions(
        &mut self,
        state: StateId,
        out: &mut impl OutputPort,
        sink: &mut impl EventSink,
    ) {
        for action in self.ctx.take_actions() {
            match action {
                ControlAction::StartFuelWaitAlarm => {
                    out.beep(FUEL_BEEP_ON_SECS, FUEL_BEEP_OFF_SECS);
                }
                ControlAction::StopFuelWaitAlarm => out.stop_beeper(),
                ControlAction::AlarmConditionOn => {
                    self.fan_forced = true;
                    out.force_fan(true);
                    out.beep(ALARM_BEEP_ON_SECS, ALARM_BEEP_OFF_SECS);
                }
                ControlAction::AlarmConditionOff => {
                    out.stop_beeper();
                    self.fan_forced = false;
                    out.force_fan(false);
                }
                _ => {}
            }
            sink.emit(&AppEvent::Action { state, action });
        }
    }

    // ── Command handling ──────────────────────────────────────

    pub fn handle_command(&mut self, cmd: AppCommand) {
        match cmd {
            AppCommand::UpdateConfig(new_config) => {
                self.update_settings(new_config);
                self.mark_config_dirty();
                info!("Configuration updated at runtime");
            }
            AppCommand::SaveConfig => {
                self.config_dirty = true;
                self.dirty_since_ms = self.now_ms.saturating_sub(AUTO_SAVE_DELAY_MS);
                info!("Explicit config save requested (will flush on next auto-save check)");
            }
            AppCommand::SetIdleSpeedOverride(level) => self.set_idle_speed_override(level),
            AppCommand::ResetToDefaults => {
                self.update_settings(StoveConfig::default());
                self.mark_config_dirty();
                info!("Configuration reset to defaults");
            }
        }
    }

    /// Apply new settings: gains only if they changed, setpoint of the
    /// active regulating state refreshed.
    fn update_settings(&mut self, config: StoveConfig) {
        let config = sanitize_logged(config);

        let gains = (config.kp, config.ki, config.kd);
        if self.ctx.regulator.tunings() != gains {
            self.ctx.regulator.set_tunings(config.kp, config.ki, config.kd);
        }

        self.ctx.config = config;
        match self.fsm.current_state() {
            StateId::Idle => self.ctx.regulator.set_setpoint(self.ctx.config.idle_target),
            StateId::Running => self.ctx.regulator.set_setpoint(self.ctx.config.run_target),
            _ => {}
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn build_telemetry(&self, uptime_secs: u64) -> TelemetryData {
        TelemetryData {
            uptime_secs,
            call_for_heat: self.ctx.call_for_heat,
            state: self.fsm.current_state(),
            temperature: self.ctx.temperature,
            blower: self.blower.speed(),
            target: self.target_temperature(),
            fan_forced: self.fan_forced,
        }
    }

    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    pub fn alarm_kind(&self) -> AlarmKind {
        self.alarm.current()
    }

    pub fn calling_for_heat(&self) -> bool {
        self.ctx.call_for_heat
    }

    /// Flue target of the regulating states, `None` otherwise.
    pub fn target_temperature(&self) -> Option<i32> {
        match self.fsm.current_state() {
            StateId::Idle => Some(self.ctx.config.idle_target),
            StateId::Running => Some(self.ctx.config.run_target),
            _ => None,
        }
    }

    pub fn temperature(&self) -> Option<i32> {
        self.ctx.temperature
    }

    pub fn idle_speed_override(&self) -> u8 {
        self.idle_speed_override
    }

    /// Blower level to use in `Idle` instead of the regulator (0 = off).
    pub fn set_idle_speed_override(&mut self, level: u8) {
        self.idle_speed_override = level.min(DRAFT_MAX);
        info!("Idle speed override = {}", self.idle_speed_override);
    }

    pub fn blower(&self) -> &DraftBlower<P> {
        &self.blower
    }

    pub fn regulator(&self) -> &Regulator {
        &self.ctx.regulator
    }

    pub fn fan_forced(&self) -> bool {
        self.fan_forced
    }

    /// Slow ticks executed since startup.
    pub fn slow_tick_count(&self) -> u64 {
        self.slow_ticks
    }

    pub fn current_config(&self) -> StoveConfig {
        self.ctx.config.clone()
    }

    // ── Config dirty-flag management ──────────────────────────

    pub fn mark_config_dirty(&mut self) {
        if !self.config_dirty {
            self.config_dirty = true;
            self.dirty_since_ms = self.now_ms;
        }
    }

    /// Save once [`AUTO_SAVE_DELAY_MS`] have passed since the first
    /// unsaved change.  Returns `true` if the config was saved.
    pub fn auto_save_if_needed(&mut self, storage: &impl ConfigPort) -> bool {
        if !self.config_dirty {
            return false;
        }
        if self.now_ms.saturating_sub(self.dirty_since_ms) < AUTO_SAVE_DELAY_MS {
            return false;
        }
        match storage.save(&self.ctx.config) {
            Ok(()) => {
                self.config_dirty = false;
                info!("Config auto-saved");
                true
            }
            Err(e) => {
                warn!("Config auto-save failed: {}", e);
                false
            }
        }
    }

    /// Force-save if dirty (call before shutdown).  On failure the config
    /// stays dirty.
    pub fn force_save_if_dirty(&mut self, storage: &impl ConfigPort) -> crate::error::Result<()> {
        if !self.config_dirty {
            return Ok(());
        }
        storage.save(&self.ctx.config)?;
        self.config_dirty = false;
        info!("Config force-saved before shutdown");
        Ok(())
    }

    pub fn is_config_dirty(&self) -> bool {
        self.config_dirty
    }
}

fn sanitize_logged(config: StoveConfig) -> StoveConfig {
    if config.is_in_range() {
        return config;
    }
    let clamped = config.sanitized();
    warn!("Settings out of range, clamped to {:?}", clamped);
    clamped
}

impl<P: SetDutyCycle> AppService<P> {
    /// Blower level the current regulator output asks for in `state`.
    fn draft_level(&self, state: StateId) -> u8 {
        if state == StateId::Idle && self.idle_speed_override > 0 {
            return self.idle_speed_override;
        }
        if self.ctx.draft_paused {
            return DRAFT_STOP;
        }
        to_level(self.ctx.regulator.output())
    }

    fn drive_blower(&mut self, state: StateId) {
        let level = self.draft_level(state);
        if let Err(e) = self.write_blower(level) {
            warn!("draft blower: {e}");
        }
    }

    fn write_blower(&mut self, level: u8) -> crate::error::Result<()> {
        self.blower.tick(self.now_ms)?;
        self.blower.set_speed(level, self.now_ms)?;
        Ok(())
    }
}

/// Round a regulator output onto the blower's 0–255 scale.
fn to_level(output: f64) -> u8 {
    if output.is_nan() {
        return 0;
    }
    output.round().clamp(0.0, f64::from(u8::MAX)) as u8
}
