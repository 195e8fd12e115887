//! StoveCtl library.
//!
//! Forced-draft combustion control for a solid-fuel stove: a flue-temperature
//! state machine, a sampled PID regulator and a draft-blower sequencer, all
//! behind port traits so the same core runs against the simulator, the host
//! binary, or real relays and a PWM channel.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod control;
pub mod drivers;
pub mod error;
pub mod fsm;
pub mod safety;
pub mod sim;
pub mod timer;
