//! Closed-loop control.
//!
//! [`pid`] is the sampled PID core; [`regulator`] wraps it with the
//! flue-temperature scaling and manual override the stove needs.

pub mod pid;
pub mod regulator;
