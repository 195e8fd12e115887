//! StoveCtl host runner.
//!
//! Runs the controller against the stove simulator so a burn can be
//! watched (or tuned) without a stove.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  Adapters (outer ring)                   │
//! │                                                          │
//! │  SimBench            LogEventSink   MemoryConfigStore    │
//! │  (Sensor+Input+      (EventSink)    (ConfigPort)         │
//! │   Output)            Clock (Sim/Monotonic)               │
//! │                                                          │
//! │  ───────────────── Port Trait Boundary ────────────────  │
//! │                                                          │
//! │  ┌────────────────────────────────────────────────────┐  │
//! │  │            AppService (pure logic)                 │  │
//! │  │  FSM · Alarm · Regulator · Draft blower            │  │
//! │  └────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use embedded_hal::pwm::SetDutyCycle;
use log::{info, warn};

use stovectl::adapters::log_sink::LogEventSink;
use stovectl::adapters::relays::LoggedRelays;
use stovectl::adapters::settings_store::MemoryConfigStore;
use stovectl::adapters::time::{Clock, MonotonicClock, SimClock};
use stovectl::app::commands::AppCommand;
use stovectl::app::ports::{ConfigPort, InputPort, InputSnapshot, OutputPort, SensorPort};
use stovectl::app::service::AppService;
use stovectl::config::StoveConfig;
use stovectl::sim::StoveSim;

/// Loop period of the control loop.
const LOOP_PERIOD_MS: u64 = 10;

#[derive(Parser)]
#[command(name = "stovectl")]
#[command(about = "Forced-draft stove controller, run against a simulated stove")]
#[command(version)]
struct Cli {
    /// JSON settings file applied on top of the stored settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Simulated run length
    #[arg(long, default_value_t = 240)]
    minutes: u64,

    /// Pace the loop in wall-clock time instead of running flat out
    #[arg(long)]
    realtime: bool,

    /// Minute at which the thermostat starts calling for heat
    #[arg(long, default_value_t = 10)]
    heat_on_minute: u64,

    /// Minute at which the thermostat stops calling for heat
    #[arg(long, default_value_t = 150)]
    heat_off_minute: u64,

    /// Blower level used in Idle instead of the regulator (0 = regulate)
    #[arg(long, default_value_t = 0)]
    idle_speed: u8,

    /// More log output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

// ── Simulated bench ───────────────────────────────────────────
//
// Stove, front panel and relays in one place, so the service sees a
// single board implementing every port it touches.

struct SimBench {
    stove: StoveSim,
    relays: LoggedRelays,
    heat_from_ms: u64,
    heat_until_ms: u64,
    now_ms: u64,
    /// Air boost pressed once at power-up to light the fire.
    boost_pending: bool,
}

impl SimBench {
    fn new(stove: StoveSim, heat_from_ms: u64, heat_until_ms: u64) -> Self {
        Self {
            stove,
            relays: LoggedRelays::new(),
            heat_from_ms,
            heat_until_ms,
            now_ms: 0,
            boost_pending: true,
        }
    }

    /// Once per simulated second.
    fn step_second(&mut self, config: &StoveConfig) {
        self.stove.step_second();
        self.relays.tick_second(self.stove.probe_temperature(), config);
    }
}

impl SensorPort for SimBench {
    fn current_temperature(&mut self) -> Option<i32> {
        self.stove.current_temperature()
    }
}

impl InputPort for SimBench {
    fn sample(&mut self) -> InputSnapshot {
        let air_boost = std::mem::take(&mut self.boost_pending);
        if air_boost {
            info!("PANEL | air boost pressed, lighting the stove");
            self.stove.ignite();
        }
        InputSnapshot {
            call_for_heat: (self.heat_from_ms..self.heat_until_ms).contains(&self.now_ms),
            mute: false,
            air_boost,
        }
    }
}

impl OutputPort for SimBench {
    fn force_fan(&mut self, on: bool) {
        self.relays.force_fan(on);
    }

    fn beep(&mut self, on_secs: u32, off_secs: u32) {
        self.relays.beep(on_secs, off_secs);
    }

    fn stop_beeper(&mut self) {
        self.relays.stop_beeper();
    }

    fn mute_beeper(&mut self, secs: u32) {
        self.relays.mute_beeper(secs);
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::builder().filter_level(level).init();

    info!("StoveCtl v{}", env!("CARGO_PKG_VERSION"));

    // ── Settings ──────────────────────────────────────────────
    let store = MemoryConfigStore::new();
    let config = match store.load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("Settings load failed ({}), using defaults", e);
            StoveConfig::default()
        }
    };
    let overrides = cli.config.as_deref().map(read_settings).transpose()?;

    // ── Service ───────────────────────────────────────────────
    let stove = StoveSim::new();
    let mut app = AppService::new(config, stove.blower_channel());
    let mut sink = LogEventSink::new();
    app.start(&mut sink);
    if let Some(cfg) = overrides {
        app.handle_command(AppCommand::UpdateConfig(cfg));
    }
    if cli.idle_speed > 0 {
        app.handle_command(AppCommand::SetIdleSpeedOverride(cli.idle_speed));
    }

    let mut bench = SimBench::new(
        stove,
        cli.heat_on_minute * 60_000,
        cli.heat_off_minute * 60_000,
    );

    // ── Loop ──────────────────────────────────────────────────
    let run_ms = cli.minutes * 60_000;
    if cli.realtime {
        run(&mut app, &mut bench, &mut sink, &store, MonotonicClock::new(), run_ms);
    } else {
        run(&mut app, &mut bench, &mut sink, &store, SimClock::new(), run_ms);
    }

    app.force_save_if_dirty(&store).context("saving settings at shutdown")?;
    info!(
        "Done: {} with {:.1} oz of fuel left",
        app.state(),
        bench.stove.fuel_oz()
    );
    Ok(())
}

fn read_settings(path: &Path) -> Result<StoveConfig> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let config =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    info!("Settings read from {}", path.display());
    Ok(config)
}

fn run<P: SetDutyCycle>(
    app: &mut AppService<P>,
    bench: &mut SimBench,
    sink: &mut LogEventSink,
    store: &MemoryConfigStore,
    mut clock: impl Clock,
    run_ms: u64,
) {
    let mut last_second = 0;
    loop {
        let now = clock.now_ms();
        if now >= run_ms {
            break;
        }

        bench.now_ms = now;
        let second = clock.uptime_secs();
        if second != last_second {
            last_second = second;
            bench.step_second(&app.current_config());
        }

        app.tick(now, bench, sink);
        app.auto_save_if_needed(store);

        clock.wait(LOOP_PERIOD_MS);
    }
}
