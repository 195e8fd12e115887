//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter          | Implements   | Connects to                 |
//! |------------------|--------------|-----------------------------|
//! | `log_sink`       | EventSink    | `log` facade                |
//! | `relays`         | OutputPort   | fan relay / beeper (logged) |
//! | `settings_store` | ConfigPort   | in-memory versioned blob    |
//! | `time`           | Clock        | `Instant` or virtual time   |
//!
//! The flue probe and panel inputs for the host build live in
//! [`crate::sim`].

pub mod log_sink;
pub mod relays;
pub mod settings_store;
pub mod time;
