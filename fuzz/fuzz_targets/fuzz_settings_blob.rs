//! Fuzz target: stored settings blob
//!
//! Feeds arbitrary bytes to `MemoryConfigStore::load` as if they had been
//! read back from flash.
//!
//! Invariants checked:
//! - No panics under any byte sequence
//! - A successful load always yields settings inside their legal ranges
//! - A blob that fails to decode reports `Corrupted`, never anything else
//!
//! cargo fuzz run fuzz_settings_blob

#![no_main]

use libfuzzer_sys::fuzz_target;
use stovectl::adapters::settings_store::MemoryConfigStore;
use stovectl::app::ports::{ConfigError, ConfigPort};

fuzz_target!(|data: &[u8]| {
    let store = MemoryConfigStore::new();
    store.put_raw_blob(data.to_vec());

    match store.load() {
        Ok(cfg) => assert!(cfg.is_in_range(), "loaded settings out of range: {cfg:?}"),
        Err(e) => assert_eq!(e, ConfigError::Corrupted),
    }
});
