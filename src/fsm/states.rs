//! Concrete state handler functions and table builder.
//!
//! ```text
//!                     flue ≥ MIN_DRAFT_TEMP            call for heat
//!   NO FIRE ───────────────────────────────▶ IDLE ─────────────────────▶ RUNNING
//!      ▲  ▲                                  ▲ │ ◀─────────────────────── │
//!      │  │          flue < MIN_DRAFT_TEMP     │ │     demand satisfied      │
//!      │  └────────────────────────────────────┘ │                           │
//!      │                                         │ flue > low mark + offset  │ flue timer
//!      │   flue < MIN_DRAFT_TEMP                 │                           │ expired
//!      └──────────────────────────── DYING FIRE ◀┴───────────────────────────┘
//!
//!   NO FIRE / IDLE / DYING FIRE ──[air boost]──▶ AIR BOOST ──[60 s or idle target]──▶ IDLE
//!   any state ──[probe fault / over-temp]──▶ ALARM ──[condition clears]──▶ IDLE
//! ```
//!
//! Every update handler reads `ctx.temperature` with `?`: the alarm check
//! runs first and sends invalid readings to `Alarm`, so the handlers
//! below only ever see a valid reading.  `Alarm` itself does not need one.

use super::context::FsmContext;
use super::{StateDescriptor, StateId};
use crate::config::{DYING_FIRE_OFFSET, MIN_DRAFT_TEMP};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0 — NoFire
        StateDescriptor {
            id: StateId::NoFire,
            on_enter: None,
            on_exit: None,
            on_update: no_fire_update,
        },
        // Index 1 — Idle
        StateDescriptor {
            id: StateId::Idle,
            on_enter: Some(idle_enter),
            on_exit: None,
            on_update: idle_update,
        },
        // Index 2 — Running
        StateDescriptor {
            id: StateId::Running,
            on_enter: Some(running_enter),
            on_exit: None,
            on_update: running_update,
        },
        // Index 3 — DyingFire
        StateDescriptor {
            id: StateId::DyingFire,
            on_enter: Some(dying_fire_enter),
            on_exit: None,
            on_update: dying_fire_update,
        },
        // Index 4 — Alarm
        StateDescriptor {
            id: StateId::Alarm,
            on_enter: Some(alarm_enter),
            on_exit: Some(alarm_exit),
            on_update: alarm_update,
        },
        // Index 5 — AirBoost
        StateDescriptor {
            id: StateId::AirBoost,
            on_enter: Some(air_boost_enter),
            on_exit: Some(air_boost_exit),
            on_update: air_boost_update,
        },
    ]
}

/// Shared air-boost gate for `NoFire`, `Idle` and `DyingFire`.
///
/// A request refused because the flue is already near run temperature is
/// discarded, not kept pending.
fn air_boost_requested(ctx: &mut FsmContext, temp: i32) -> Option<StateId> {
    if !ctx.air_boost_requested {
        return None;
    }
    if temp < ctx.config.run_target - DYING_FIRE_OFFSET {
        return Some(StateId::AirBoost);
    }
    ctx.air_boost_requested = false;
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  NO FIRE — waiting for the flue to warm enough for the blower to help
// ═══════════════════════════════════════════════════════════════════════════

fn no_fire_update(ctx: &mut FsmContext) -> Option<StateId> {
    let temp = ctx.temperature?;

    if ctx.flue_timer.is_set(ctx.now_ms) {
        ctx.flue_timer.reset();
    }
    ctx.cold_start = true;

    if temp >= MIN_DRAFT_TEMP {
        return Some(StateId::Idle);
    }

    air_boost_requested(ctx, temp)
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE — holding the idle target until the thermostat calls
// ═══════════════════════════════════════════════════════════════════════════

fn idle_enter(ctx: &mut FsmContext) {
    ctx.draft_idle();
}

fn idle_update(ctx: &mut FsmContext) -> Option<StateId> {
    let temp = ctx.temperature?;

    // The fire is out: no fuel request, even if the flue timer ran out on
    // this same tick.
    if temp < MIN_DRAFT_TEMP {
        ctx.draft_off();
        return Some(StateId::NoFire);
    }

    if ctx.call_for_heat {
        if ctx.fuel_wait_active() {
            ctx.stop_fuel_wait_alarm();
        }
        return Some(StateId::Running);
    }

    if ctx.flue_timer.is_expired(ctx.now_ms) {
        if ctx.dying_fire_alarm_in_idle {
            ctx.dying_fire_alarm_in_idle = false;
            ctx.start_fuel_wait_alarm();
        }
        ctx.pause_draft();
    }

    if temp < ctx.config.idle_target - DYING_FIRE_OFFSET {
        ctx.arm_flue_timer();
    } else {
        if ctx.flue_timer.is_set(ctx.now_ms) {
            ctx.flue_timer.reset();
        }
        ctx.resume_draft();
        if ctx.fuel_wait_active() {
            ctx.stop_fuel_wait_alarm();
        }
    }

    air_boost_requested(ctx, temp)
}

// ═══════════════════════════════════════════════════════════════════════════
//  RUNNING — holding the run target while the thermostat calls
// ═══════════════════════════════════════════════════════════════════════════

fn running_enter(ctx: &mut FsmContext) {
    ctx.draft_run();
}

fn running_update(ctx: &mut FsmContext) -> Option<StateId> {
    let temp = ctx.temperature?;

    if !ctx.call_for_heat {
        ctx.flue_timer.reset();
        ctx.dying_fire_alarm_in_idle = true;
        return Some(StateId::Idle);
    }

    if ctx.flue_timer.is_expired(ctx.now_ms) {
        ctx.flue_timer.reset();
        return Some(StateId::DyingFire);
    }

    if temp < ctx.config.run_target - DYING_FIRE_OFFSET {
        ctx.arm_flue_timer();
    } else {
        ctx.cold_start = false;
        if ctx.flue_timer.is_set(ctx.now_ms) {
            ctx.flue_timer.reset();
        }
    }

    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  DYING FIRE — blower stopped, asking for fuel
// ═══════════════════════════════════════════════════════════════════════════

fn dying_fire_enter(ctx: &mut FsmContext) {
    if let Some(temp) = ctx.temperature {
        ctx.low_water_mark = temp;
    }
    ctx.start_fuel_wait_alarm();
    ctx.draft_off();
}

fn dying_fire_update(ctx: &mut FsmContext) -> Option<StateId> {
    let temp = ctx.temperature?;

    ctx.low_water_mark = ctx.low_water_mark.min(temp);

    if temp > ctx.low_water_mark + DYING_FIRE_OFFSET {
        ctx.stop_fuel_wait_alarm();
        return Some(StateId::Idle);
    }

    if temp < MIN_DRAFT_TEMP {
        ctx.stop_fuel_wait_alarm();
        ctx.draft_off();
        return Some(StateId::NoFire);
    }

    air_boost_requested(ctx, temp)
}

// ═══════════════════════════════════════════════════════════════════════════
//  ALARM — probe fault or over-temperature
// ═══════════════════════════════════════════════════════════════════════════

fn alarm_enter(ctx: &mut FsmContext) {
    ctx.alarm_on();
}

fn alarm_exit(ctx: &mut FsmContext) {
    ctx.alarm_off();
}

fn alarm_update(ctx: &mut FsmContext) -> Option<StateId> {
    if ctx.alarm.is_active() {
        return None;
    }
    Some(StateId::Idle)
}

// ═══════════════════════════════════════════════════════════════════════════
//  AIR BOOST — full-power burst to help a fire catch
// ═══════════════════════════════════════════════════════════════════════════

fn air_boost_enter(ctx: &mut FsmContext) {
    ctx.air_boost_requested = false;
    ctx.draft_full();
    ctx.start_air_boost_timer();
}

fn air_boost_exit(ctx: &mut FsmContext) {
    ctx.air_boost_timer.reset();
    // Stop in manual first so the idle regulator starts from zero.
    ctx.draft_off();
}

fn air_boost_update(ctx: &mut FsmContext) -> Option<StateId> {
    let temp = ctx.temperature?;

    if ctx.air_boost_timer.is_expired(ctx.now_ms) {
        return Some(StateId::Idle);
    }
    if temp >= ctx.config.idle_target {
        return Some(StateId::Idle);
    }
    None
}
