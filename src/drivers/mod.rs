//! Actuator drivers.

pub mod draft;
