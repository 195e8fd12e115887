//! Inbound commands to the application service.
//!
//! These represent requests from the setup screens or a serial console
//! that the [`AppService`](super::service::AppService) interprets.

use crate::config::StoveConfig;

#[derive(Debug, Clone)]
pub enum AppCommand {
    /// Replace the settings.  Values are clamped into range, gains are
    /// pushed to the regulator and the active setpoint is refreshed.
    UpdateConfig(StoveConfig),

    /// Persist the current settings on the next auto-save check.
    SaveConfig,

    /// Fixed blower level used in `Idle` instead of the regulator output
    /// (0 = regulator).  Handy while the gains are still untuned.
    SetIdleSpeedOverride(u8),

    /// Factory settings.
    ResetToDefaults,
}
