//! Combustion scenarios: the service driven second by second against a
//! mock board, asserting on state changes and relay commands.

use crate::mock_hw::{Harness, OutputCall};

use stovectl::app::events::AppEvent;
use stovectl::config::{
    ALARM_BEEP_OFF_SECS, ALARM_BEEP_ON_SECS, ALARM_MUTE_SECS, DRAFT_MAX, FUEL_BEEP_OFF_SECS,
    FUEL_BEEP_ON_SECS, StoveConfig,
};
use stovectl::fsm::StateId;
use stovectl::fsm::context::ControlAction;
use stovectl::safety::AlarmKind;

const FUEL_BEEP: OutputCall = OutputCall::Beep {
    on_secs: FUEL_BEEP_ON_SECS,
    off_secs: FUEL_BEEP_OFF_SECS,
};

const ALARM_BEEP: OutputCall = OutputCall::Beep {
    on_secs: ALARM_BEEP_ON_SECS,
    off_secs: ALARM_BEEP_OFF_SECS,
};

/// Warm stove, heat called, flue has reached the run band once.
fn running_at_band() -> Harness {
    let mut h = Harness::new(StoveConfig::default(), 350);
    h.board.call_for_heat = true;
    h.seconds(3);
    assert_eq!(h.app.state(), StateId::Running);
    h
}

fn saw_action(h: &Harness, state: StateId, action: ControlAction) -> bool {
    h.sink
        .events
        .contains(&AppEvent::Action { state, action })
}

// ── Warm-up ───────────────────────────────────────────────────

#[test]
fn warm_flue_goes_idle_then_running_on_demand() {
    let mut h = Harness::new(StoveConfig::default(), 80);
    h.second();
    assert_eq!(h.app.state(), StateId::NoFire);

    h.board.temperature = Some(350);
    h.second();
    assert_eq!(h.app.state(), StateId::Idle);
    assert_eq!(h.app.target_temperature(), Some(150));

    h.board.call_for_heat = true;
    h.second();
    assert_eq!(h.app.state(), StateId::Running);
    assert_eq!(h.app.target_temperature(), Some(350));
    assert_eq!(
        h.sink.transitions(),
        vec![
            (StateId::NoFire, StateId::Idle),
            (StateId::Idle, StateId::Running)
        ]
    );
}

#[test]
fn demand_satisfied_returns_to_idle() {
    let mut h = running_at_band();
    h.board.call_for_heat = false;
    h.second();
    assert_eq!(h.app.state(), StateId::Idle);
}

#[test]
fn cooling_idle_flue_puts_fire_out() {
    let mut h = Harness::new(StoveConfig::default(), 150);
    h.second();
    assert_eq!(h.app.state(), StateId::Idle);

    h.board.temperature = Some(99);
    h.second();
    assert_eq!(h.app.state(), StateId::NoFire);
    assert_eq!(h.app.target_temperature(), None);
}

// ── Dying fire ────────────────────────────────────────────────

#[test]
fn running_held_below_band_becomes_dying_fire() {
    let mut h = running_at_band();
    h.board.temperature = Some(335);

    let waited = h.run_until(StateId::DyingFire, 200).expect("never declared dying");
    let wait = StoveConfig::default().flue_wait_secs;
    assert!(
        (wait..=wait + 2).contains(&waited),
        "dying fire after {waited}s, expected about {wait}s"
    );
    assert!(h.board.saw(FUEL_BEEP));
    assert!(saw_action(&h, StateId::DyingFire, ControlAction::StartFuelWaitAlarm));
    assert_eq!(h.app.target_temperature(), None);
}

#[test]
fn cold_start_gets_the_longest_wait() {
    let mut h = Harness::new(StoveConfig::default(), 200);
    h.board.call_for_heat = true;
    h.seconds(2);
    assert_eq!(h.app.state(), StateId::Running);

    // Never reached the band, so the cold-start allowance applies.
    assert_eq!(h.run_until(StateId::DyingFire, 200), None);
    assert!(h.run_until(StateId::DyingFire, 200).is_some());
}

#[test]
fn refuelled_dying_fire_recovers_to_idle() {
    let mut h = running_at_band();
    h.board.temperature = Some(300);
    h.run_until(StateId::DyingFire, 200).expect("never declared dying");
    h.board.clear_calls();

    h.board.temperature = Some(305);
    h.second();
    assert_eq!(h.app.state(), StateId::DyingFire, "within offset of the low mark");

    h.board.temperature = Some(312);
    h.second();
    assert_eq!(h.app.state(), StateId::Idle);
    assert!(h.board.saw(OutputCall::StopBeeper));
}

#[test]
fn dying_fire_goes_out_below_min_draft() {
    let mut h = running_at_band();
    h.board.temperature = Some(300);
    h.run_until(StateId::DyingFire, 200).expect("never declared dying");

    h.board.temperature = Some(90);
    h.second();
    assert_eq!(h.app.state(), StateId::NoFire);
    assert!(h.board.saw(OutputCall::StopBeeper));
}

#[test]
fn fuel_request_gives_up_after_five_minutes() {
    let mut h = running_at_band();
    h.board.temperature = Some(300);
    h.run_until(StateId::DyingFire, 200).expect("never declared dying");
    h.board.clear_calls();

    h.seconds(295);
    assert!(!h.board.saw(OutputCall::StopBeeper));
    h.seconds(10);
    assert!(h.board.saw(OutputCall::StopBeeper));
    assert_eq!(h.app.state(), StateId::DyingFire);
}

#[test]
fn mute_silences_fuel_request() {
    let mut h = running_at_band();
    h.board.temperature = Some(300);
    h.run_until(StateId::DyingFire, 200).expect("never declared dying");

    h.board.mute_pressed = true;
    h.second();
    assert!(h.board.saw(OutputCall::StopBeeper));
}

#[test]
fn fire_dying_after_heat_call_requests_fuel_in_idle() {
    let mut h = running_at_band();
    h.board.call_for_heat = false;
    h.board.temperature = Some(130);
    h.second();
    assert_eq!(h.app.state(), StateId::Idle);
    h.board.clear_calls();

    let wait = StoveConfig::default().flue_wait_secs;
    h.seconds(wait + 3);
    assert_eq!(h.app.state(), StateId::Idle);
    assert!(h.board.saw(FUEL_BEEP));
    assert!(saw_action(&h, StateId::Idle, ControlAction::DraftPause));

    // A new call for heat cancels the request.
    h.board.clear_calls();
    h.board.call_for_heat = true;
    h.second();
    assert_eq!(h.app.state(), StateId::Running);
    assert!(h.board.saw(OutputCall::StopBeeper));
}

#[test]
fn idle_below_target_too_long_pauses_then_resumes_blower() {
    let config = StoveConfig {
        kp: 10.0,
        ..StoveConfig::default()
    };
    let mut h = Harness::new(config, 130);
    h.seconds(2);
    assert_eq!(h.app.state(), StateId::Idle);
    assert!(h.app.blower().speed() > 0);

    // Cold start: five minutes of patience, and no fuel request in Idle.
    h.seconds(305);
    assert!(saw_action(&h, StateId::Idle, ControlAction::DraftPause));
    assert_eq!(h.app.blower().speed(), 0);
    assert!(!h.board.saw(FUEL_BEEP));

    h.board.temperature = Some(150);
    h.second();
    assert!(saw_action(&h, StateId::Idle, ControlAction::DraftResume));
}

// ── Alarm ─────────────────────────────────────────────────────

#[test]
fn invalid_reading_while_running_raises_alarm() {
    let mut h = running_at_band();
    h.board.temperature = None;
    h.second();

    assert_eq!(h.app.state(), StateId::Alarm);
    assert_eq!(h.app.alarm_kind(), AlarmKind::ProbeFault);
    assert!(h.app.fan_forced());
    assert!(h.board.saw(OutputCall::ForceFan(true)));
    assert!(h.board.saw(ALARM_BEEP));
    assert!(
        h.sink
            .events
            .contains(&AppEvent::AlarmRaised(AlarmKind::ProbeFault))
    );

    h.second();
    assert_eq!(h.app.blower().speed(), 0);
}

#[test]
fn alarm_stops_blower_on_the_tick_it_is_raised() {
    let config = StoveConfig {
        kp: 4.0,
        ..StoveConfig::default()
    };
    let mut h = Harness::new(config, 300);
    h.board.call_for_heat = true;
    h.seconds(3);
    assert_eq!(h.app.state(), StateId::Running);
    assert_eq!(h.app.blower().speed(), 20);

    h.board.temperature = None;
    h.second();
    assert_eq!(h.app.state(), StateId::Alarm);
    assert_eq!(h.app.blower().speed(), 0);
    assert_eq!(h.pwm.duty(), 0);

    let last = h.sink.events.iter().rev().find_map(|e| match e {
        AppEvent::Telemetry(t) => Some(t),
        _ => None,
    });
    let last = last.expect("telemetry");
    assert_eq!(last.state, StateId::Alarm);
    assert_eq!(last.blower, 0);
}

#[test]
fn over_temperature_raises_alarm_from_idle() {
    let mut h = Harness::new(StoveConfig::default(), 150);
    h.second();
    h.board.temperature = Some(480);
    h.second();
    assert_eq!(h.app.state(), StateId::Alarm);
    assert_eq!(h.app.alarm_kind(), AlarmKind::OverTemperature);
}

#[test]
fn alarm_mute_then_clear_returns_to_idle() {
    let mut h = running_at_band();
    h.board.temperature = None;
    h.second();
    assert_eq!(h.app.state(), StateId::Alarm);

    h.board.mute_pressed = true;
    h.second();
    assert!(h.board.saw(OutputCall::MuteBeeper(ALARM_MUTE_SECS)));
    assert_eq!(h.app.state(), StateId::Alarm);

    h.board.clear_calls();
    h.board.temperature = Some(350);
    h.second();
    assert_eq!(h.app.state(), StateId::Idle);
    assert!(!h.app.fan_forced());
    assert_eq!(
        h.board.calls,
        vec![OutputCall::StopBeeper, OutputCall::ForceFan(false)]
    );
    assert!(h.sink.events.contains(&AppEvent::AlarmCleared));
}

#[test]
fn mute_outside_alarm_and_dying_fire_does_nothing() {
    let mut h = Harness::new(StoveConfig::default(), 150);
    h.second();
    h.board.mute_pressed = true;
    h.second();
    assert!(h.board.calls.is_empty());
}

// ── Air boost ─────────────────────────────────────────────────

#[test]
fn air_boost_runs_full_draft_for_a_minute() {
    let mut h = Harness::new(StoveConfig::default(), 80);
    h.board.air_boost_pressed = true;
    h.second();
    assert_eq!(h.app.state(), StateId::AirBoost);

    h.second();
    assert_eq!(h.app.blower().speed(), DRAFT_MAX);
    assert_eq!(h.pwm.duty(), u16::from(DRAFT_MAX));

    let took = h.run_until(StateId::Idle, 70).expect("boost never ended");
    assert!((58..=60).contains(&took), "boost ended after {took}s");
}

#[test]
fn air_boost_ends_at_idle_target() {
    let mut h = Harness::new(StoveConfig::default(), 80);
    h.board.air_boost_pressed = true;
    h.seconds(3);
    assert_eq!(h.app.state(), StateId::AirBoost);

    h.board.temperature = Some(150);
    h.second();
    assert_eq!(h.app.state(), StateId::Idle);
}

#[test]
fn air_boost_refused_near_run_temperature() {
    let mut h = Harness::new(StoveConfig::default(), 345);
    h.second();
    assert_eq!(h.app.state(), StateId::Idle);

    h.board.air_boost_pressed = true;
    h.second();
    assert_eq!(h.app.state(), StateId::Idle);

    // The refused request is not kept for later.
    h.board.temperature = Some(200);
    h.seconds(2);
    assert_eq!(h.app.state(), StateId::Idle);
}

#[test]
fn air_boost_ignored_while_running() {
    let mut h = Harness::new(StoveConfig::default(), 200);
    h.board.call_for_heat = true;
    h.seconds(2);
    assert_eq!(h.app.state(), StateId::Running);

    h.board.air_boost_pressed = true;
    h.second();
    h.board.call_for_heat = false;
    h.seconds(3);
    assert_eq!(h.app.state(), StateId::Idle);
}

// ── Idle speed override ──────────────────────────────────────

#[test]
fn idle_override_replaces_regulator_in_idle_only() {
    let mut h = Harness::new(StoveConfig::default(), 150);
    h.app.set_idle_speed_override(40);
    h.seconds(2);
    assert_eq!(h.app.state(), StateId::Idle);
    assert_eq!(h.app.blower().speed(), 40);

    h.board.call_for_heat = true;
    h.seconds(2);
    assert_eq!(h.app.state(), StateId::Running);
    // Zero gains: the regulator holds the blower off.
    assert_eq!(h.app.blower().speed(), 0);
}
