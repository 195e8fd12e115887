//! In-memory settings store.
//!
//! Implements [`ConfigPort`] over a namespaced key-value map holding one
//! versioned `postcard` blob:
//!
//! ```text
//!   [ version: u8 ][ postcard(StoveConfig) ... ]
//! ```
//!
//! A missing blob or a blob from another layout version is replaced by
//! defaults, which are written back so the next boot finds a valid blob.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::StoveConfig;

const CONFIG_NAMESPACE: &str = "stovectl";
const CONFIG_KEY: &str = "settings";

/// Bump whenever `StoveConfig`'s field layout changes.
pub const SETTINGS_VERSION: u8 = 1;

pub struct MemoryConfigStore {
    store: RefCell<HashMap<String, Vec<u8>>>,
    read_only: Cell<bool>,
}

impl Default for MemoryConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self {
            store: RefCell::new(HashMap::new()),
            read_only: Cell::new(false),
        }
    }

    /// Make every subsequent save fail with [`ConfigError::IoError`].
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.set(read_only);
    }

    /// Raw stored blob, if any.
    pub fn raw_blob(&self) -> Option<Vec<u8>> {
        self.store.borrow().get(&Self::composite_key()).cloned()
    }

    /// Overwrite the stored blob (tests, migration tooling).
    pub fn put_raw_blob(&self, bytes: Vec<u8>) {
        self.store.borrow_mut().insert(Self::composite_key(), bytes);
    }

    fn composite_key() -> String {
        format!("{}::{}", CONFIG_NAMESPACE, CONFIG_KEY)
    }

    fn defaults_written_back(&self) -> Result<StoveConfig, ConfigError> {
        let cfg = StoveConfig::default();
        if let Err(e) = self.save(&cfg) {
            warn!("MemoryConfigStore: could not write defaults back: {e}");
        }
        Ok(cfg)
    }
}

impl ConfigPort for MemoryConfigStore {
    fn load(&self) -> Result<StoveConfig, ConfigError> {
        let Some(bytes) = self.raw_blob() else {
            info!("MemoryConfigStore: no stored settings, using defaults");
            return self.defaults_written_back();
        };

        let Some((&version, body)) = bytes.split_first() else {
            return Err(ConfigError::Corrupted);
        };
        if version != SETTINGS_VERSION {
            warn!(
                "MemoryConfigStore: {}, using defaults",
                ConfigError::VersionMismatch {
                    found: version,
                    expected: SETTINGS_VERSION,
                }
            );
            return self.defaults_written_back();
        }

        let cfg: StoveConfig = postcard::from_bytes(body).map_err(|_| ConfigError::Corrupted)?;
        info!("MemoryConfigStore: loaded settings ({} bytes)", bytes.len());
        Ok(cfg.sanitized())
    }

    fn save(&self, config: &StoveConfig) -> Result<(), ConfigError> {
        if self.read_only.get() {
            return Err(ConfigError::IoError);
        }
        let mut bytes = vec![SETTINGS_VERSION];
        let body = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        bytes.extend_from_slice(&body);
        self.put_raw_blob(bytes);
        info!("MemoryConfigStore: settings saved");
        Ok(())
    }
}
