//! Application core — pure domain logic, zero I/O.
//!
//! Orchestration of the combustion state machine, alarm evaluation and the
//! draft regulator.  All interaction with hardware happens through
//! **port traits** defined in [`ports`], keeping this layer testable
//! without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
