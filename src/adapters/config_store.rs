//! Configuration store adapter.
//!
//! Implements [`ConfigPort`] on top of any [`StoragePort`] by keeping the
//! whole [`StationConfig`] as one `postcard` blob, and provides
//! [`MemoryStorage`], a RAM-backed [`StoragePort`] for simulation and tests.
//!
//! - Config validation: all fields are range-checked before persistence.
//! - Namespace isolation: keys are stored as `namespace::key`.

use core::cell::RefCell;
use std::collections::BTreeMap;

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort, StorageError, StoragePort};
use crate::config::StationConfig;

pub const CONFIG_NAMESPACE: &str = "station";
pub const CONFIG_KEY: &str = "stacfg";

/// Largest config blob accepted on load.
pub const MAX_BLOB_SIZE: usize = 4000;

// ═══════════════════════════════════════════════════════════════
//  RAM storage
// ═══════════════════════════════════════════════════════════════

#[derive(Default)]
pub struct MemoryStorage {
    store: RefCell<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{}::{}", namespace, key)
    }
}

impl StoragePort for MemoryStorage {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let composite = Self::composite_key(namespace, key);
        match self.store.borrow().get(&composite) {
            Some(data) if data.len() > buf.len() => Err(StorageError::BufferTooSmall),
            Some(data) => {
                buf[..data.len()].copy_from_slice(data);
                Ok(data.len())
            }
            None => Err(StorageError::NotFound),
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let composite = Self::composite_key(namespace, key);
        self.store.borrow_mut().insert(composite, data.to_vec());
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        let composite = Self::composite_key(namespace, key);
        self.store.borrow_mut().remove(&composite);
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        let composite = Self::composite_key(namespace, key);
        self.store.borrow().contains_key(&composite)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Config over storage
// ═══════════════════════════════════════════════════════════════

/// [`ConfigPort`] persisting a postcard blob through `S`.
pub struct ConfigStore<S> {
    storage: S,
}

/// Config store kept in RAM.
pub type MemoryConfigStore = ConfigStore<MemoryStorage>;

impl MemoryConfigStore {
    pub fn in_memory() -> Self {
        info!("ConfigStore: RAM backend");
        Self::new(MemoryStorage::new())
    }
}

impl<S: StoragePort> ConfigStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Forget the stored config; the next load returns defaults.
    pub fn reset(&mut self) -> Result<(), ConfigError> {
        self.storage
            .delete(CONFIG_NAMESPACE, CONFIG_KEY)
            .map_err(storage_to_config)
    }
}

fn storage_to_config(e: StorageError) -> ConfigError {
    match e {
        StorageError::NotFound => ConfigError::NotFound,
        StorageError::Full => ConfigError::StorageFull,
        StorageError::BufferTooSmall => ConfigError::Corrupted,
        StorageError::IoError => ConfigError::IoError,
    }
}

impl<S: StoragePort> ConfigPort for ConfigStore<S> {
    fn load(&self) -> Result<StationConfig, ConfigError> {
        if !self.storage.exists(CONFIG_NAMESPACE, CONFIG_KEY) {
            info!("ConfigStore: no stored config, using defaults");
            return Ok(StationConfig::default());
        }
        let mut buf = vec![0_u8; MAX_BLOB_SIZE];
        let len = self
            .storage
            .read(CONFIG_NAMESPACE, CONFIG_KEY, &mut buf)
            .map_err(storage_to_config)?;
        let cfg: StationConfig =
            postcard::from_bytes(&buf[..len]).map_err(|_| ConfigError::Corrupted)?;
        if let Err(e) = cfg.validate() {
            warn!("ConfigStore: stored config rejected: {}", e);
            return Err(e);
        }
        info!("ConfigStore: loaded config ({} bytes)", len);
        Ok(cfg)
    }

    fn save(&mut self, config: &StationConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        if bytes.len() > MAX_BLOB_SIZE {
            return Err(ConfigError::StorageFull);
        }
        self.storage
            .write(CONFIG_NAMESPACE, CONFIG_KEY, &bytes)
            .map_err(storage_to_config)?;
        info!("ConfigStore: config saved ({} bytes)", bytes.len());
        Ok(())
    }
}
