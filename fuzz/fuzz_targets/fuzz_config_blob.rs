//! Fuzz target: stored config blob decode + validate
//!
//! Writes arbitrary bytes under the config key and loads them back through
//! the store.  Loading must never panic: garbage is `Corrupted`, a blob
//! that decodes but is out of range is `ValidationFailed`, and anything
//! returned as `Ok` must itself validate.
//!
//! cargo fuzz run fuzz_config_blob

#![no_main]

use libfuzzer_sys::fuzz_target;
use sensorflow::adapters::config_store::{CONFIG_KEY, CONFIG_NAMESPACE, MemoryConfigStore};
use sensorflow::app::ports::{ConfigPort, StoragePort};
use sensorflow::config::StationConfig;

fuzz_target!(|data: &[u8]| {
    let mut store = MemoryConfigStore::in_memory();
    if store
        .storage_mut()
        .write(CONFIG_NAMESPACE, CONFIG_KEY, data)
        .is_err()
    {
        return;
    }

    if let Ok(config) = store.load() {
        assert!(config.validate().is_ok(), "load returned an invalid config");

        // Whatever loads must also save and reload identically.
        let mut fresh = MemoryConfigStore::in_memory();
        fresh.save(&config).expect("valid config saves");
        assert_eq!(fresh.load().expect("saved config reloads"), config);
    }

    let _ = postcard::from_bytes::<StationConfig>(data);
});
