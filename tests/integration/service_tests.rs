//! Service plumbing: commands, settings persistence and telemetry.

use crate::mock_hw::{Harness, MockConfigStore};

use stovectl::adapters::settings_store::MemoryConfigStore;
use stovectl::app::commands::AppCommand;
use stovectl::app::events::{AppEvent, TelemetryData};
use stovectl::app::ports::{ConfigError, ConfigPort};
use stovectl::app::service::AUTO_SAVE_DELAY_MS;
use stovectl::config::{MIN_IDLE_TARGET, StoveConfig};
use stovectl::error::Error;
use stovectl::fsm::StateId;

#[test]
fn start_emits_started_in_no_fire() {
    let h = Harness::new(StoveConfig::default(), 65);
    assert_eq!(h.sink.events, vec![AppEvent::Started(StateId::NoFire)]);
    assert_eq!(h.app.state(), StateId::NoFire);
}

#[test]
fn one_telemetry_record_per_second() {
    let mut h = Harness::new(StoveConfig::default(), 150);
    h.board.call_for_heat = true;

    // Several fast ticks inside the same second.
    for now in [0, 10, 500, 990] {
        h.app.tick(now, &mut h.board, &mut h.sink);
    }
    h.app.tick(1000, &mut h.board, &mut h.sink);

    let telemetry: Vec<&TelemetryData> = h
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::Telemetry(t) => Some(t),
            _ => None,
        })
        .collect();
    assert_eq!(telemetry.len(), 2);
    assert_eq!(h.app.slow_tick_count(), 2);

    let last = telemetry[1];
    assert_eq!(last.uptime_secs, 1);
    assert!(last.call_for_heat);
    assert_eq!(last.state, StateId::Running);
    assert_eq!(last.temperature, Some(150));
    assert_eq!(last.target, Some(350));
    assert!(!last.fan_forced);
}

#[test]
fn update_config_refreshes_active_target() {
    let mut h = Harness::new(StoveConfig::default(), 150);
    h.second();
    assert_eq!(h.app.target_temperature(), Some(150));

    let cfg = StoveConfig {
        idle_target: 170,
        ..StoveConfig::default()
    };
    h.app.handle_command(AppCommand::UpdateConfig(cfg));
    assert_eq!(h.app.target_temperature(), Some(170));
    assert!(h.app.is_config_dirty());
}

#[test]
fn idle_target_change_reaches_the_regulator() {
    let tuned = StoveConfig {
        kp: 4.0,
        ..StoveConfig::default()
    };
    let mut h = Harness::new(tuned.clone(), 150);
    h.seconds(2);
    assert_eq!(h.app.state(), StateId::Idle);
    assert_eq!(h.app.regulator().setpoint(), 150);
    assert_eq!(h.app.blower().speed(), 0);

    h.app.handle_command(AppCommand::UpdateConfig(StoveConfig {
        idle_target: 170,
        ..tuned
    }));
    assert_eq!(h.app.regulator().setpoint(), 170);

    // 20 degrees short at a 0.1 scale and kp 4.
    h.second();
    assert_eq!(h.app.blower().speed(), 8);
}

#[test]
fn run_target_change_reaches_the_regulator() {
    let tuned = StoveConfig {
        kp: 4.0,
        ..StoveConfig::default()
    };
    let mut h = Harness::new(tuned.clone(), 150);
    h.board.call_for_heat = true;
    h.seconds(3);
    assert_eq!(h.app.state(), StateId::Running);
    assert_eq!(h.app.regulator().setpoint(), 350);
    assert_eq!(h.app.blower().speed(), 80);

    h.app.handle_command(AppCommand::UpdateConfig(StoveConfig {
        run_target: 400,
        ..tuned
    }));
    assert_eq!(h.app.regulator().setpoint(), 400);

    h.second();
    assert_eq!(h.app.blower().speed(), 100);
}

#[test]
fn update_config_is_clamped() {
    let mut h = Harness::new(StoveConfig::default(), 65);
    let cfg = StoveConfig {
        idle_target: 20,
        kp: -3.0,
        ..StoveConfig::default()
    };
    h.app.handle_command(AppCommand::UpdateConfig(cfg));
    let applied = h.app.current_config();
    assert_eq!(applied.idle_target, MIN_IDLE_TARGET);
    assert_eq!(applied.kp, 0.0);
}

#[test]
fn changed_settings_auto_save_after_delay() {
    let mut h = Harness::new(StoveConfig::default(), 150);
    let store = MockConfigStore::default();

    let cfg = StoveConfig {
        run_target: 400,
        ..StoveConfig::default()
    };
    h.app.handle_command(AppCommand::UpdateConfig(cfg.clone()));

    h.seconds(4);
    assert!(!h.app.auto_save_if_needed(&store));
    assert_eq!(store.saves.get(), 0);

    h.seconds(2);
    assert!(h.now_ms > AUTO_SAVE_DELAY_MS);
    assert!(h.app.auto_save_if_needed(&store));
    assert_eq!(store.load(), Ok(cfg));
    assert!(!h.app.is_config_dirty());

    // Nothing new to save.
    assert!(!h.app.auto_save_if_needed(&store));
    assert_eq!(store.saves.get(), 1);
}

#[test]
fn save_config_flushes_on_next_check() {
    let mut h = Harness::new(StoveConfig::default(), 150);
    let store = MockConfigStore::default();
    h.seconds(10);

    h.app.handle_command(AppCommand::SaveConfig);
    assert!(h.app.auto_save_if_needed(&store));
    assert_eq!(store.saves.get(), 1);
}

#[test]
fn failed_save_stays_dirty() {
    let mut h = Harness::new(StoveConfig::default(), 150);
    let store = MockConfigStore::default();
    store.fail_saves.set(true);

    h.app.handle_command(AppCommand::ResetToDefaults);
    h.seconds(6);
    assert!(!h.app.auto_save_if_needed(&store));
    assert!(h.app.is_config_dirty());

    assert_eq!(
        h.app.force_save_if_dirty(&store),
        Err(Error::Config(ConfigError::IoError))
    );
    assert!(h.app.is_config_dirty());

    store.fail_saves.set(false);
    assert_eq!(h.app.force_save_if_dirty(&store), Ok(()));
    assert!(!h.app.is_config_dirty());
    assert_eq!(store.saves.get(), 1);
}

#[test]
fn reset_to_defaults_restores_targets() {
    let cfg = StoveConfig {
        idle_target: 170,
        ..StoveConfig::default()
    };
    let mut h = Harness::new(cfg, 150);
    h.second();
    assert_eq!(h.app.target_temperature(), Some(170));

    h.app.handle_command(AppCommand::ResetToDefaults);
    assert_eq!(h.app.target_temperature(), Some(150));
    assert_eq!(h.app.current_config(), StoveConfig::default());
}

#[test]
fn idle_override_command_is_capped() {
    let mut h = Harness::new(StoveConfig::default(), 150);
    h.app.handle_command(AppCommand::SetIdleSpeedOverride(250));
    assert_eq!(h.app.idle_speed_override(), 215);
}

#[test]
fn settings_survive_a_restart_through_the_store() {
    let store = MemoryConfigStore::new();
    let initial = store.load().expect("defaults");
    let mut h = Harness::new(initial, 150);

    let cfg = StoveConfig {
        alarm_threshold: 500,
        fan_on_temp: 300,
        ..StoveConfig::default()
    };
    h.app.handle_command(AppCommand::UpdateConfig(cfg.clone()));
    h.app.force_save_if_dirty(&store).expect("saved");

    let reloaded = store.load().expect("stored settings");
    assert_eq!(reloaded, cfg);

    let mut restarted = Harness::new(reloaded, 150);
    restarted.second();
    assert_eq!(restarted.app.current_config(), cfg);
}
