//! Storage adapters.
//!
//! Implements [`StoragePort`] and [`ConfigPort`] over two backends:
//!
//! - [`MemStorage`] — in-memory map, used by the simulation and tests.
//! - [`FileStorage`] — one file per namespaced key under a directory,
//!   with atomic writes (temp file + rename). Gives the simulation a
//!   registry that survives restarts, the way flash does on the vehicle.
//!
//! Config validation lives here: all fields are range-checked before
//! persistence, and invalid values are rejected rather than clamped.

use std::collections::HashMap;
use std::path::PathBuf;

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort, StorageError, StoragePort};
use crate::config::SystemConfig;

const CONFIG_NAMESPACE: &str = "faregate";
const CONFIG_KEY: &str = "syscfg";

fn validate_config(cfg: &SystemConfig) -> Result<(), ConfigError> {
    if !(100..=10_000).contains(&cfg.crossing_window_ms) {
        return Err(ConfigError::ValidationFailed(
            "crossing_window_ms must be 100-10000",
        ));
    }
    if !(10..=500).contains(&cfg.crossing_debounce_ms) {
        return Err(ConfigError::ValidationFailed(
            "crossing_debounce_ms must be 10-500",
        ));
    }
    if cfg.crossing_debounce_ms >= cfg.crossing_window_ms {
        return Err(ConfigError::ValidationFailed(
            "crossing_debounce_ms must be < crossing_window_ms",
        ));
    }
    if !(1..=500).contains(&cfg.occupancy_threshold) {
        return Err(ConfigError::ValidationFailed(
            "occupancy_threshold must be 1-500",
        ));
    }
    if !(500..=60_000).contains(&cfg.overload_alarm_ms) {
        return Err(ConfigError::ValidationFailed(
            "overload_alarm_ms must be 500-60000",
        ));
    }
    if !(1000..=300_000).contains(&cfg.emergency_window_ms) {
        return Err(ConfigError::ValidationFailed(
            "emergency_window_ms must be 1000-300000",
        ));
    }
    if !(100..=10_000).contains(&cfg.gate_settle_ms) {
        return Err(ConfigError::ValidationFailed(
            "gate_settle_ms must be 100-10000",
        ));
    }
    if !(1000..=60_000).contains(&cfg.gate_open_hold_ms) {
        return Err(ConfigError::ValidationFailed(
            "gate_open_hold_ms must be 1000-60000",
        ));
    }
    if !(1000..=600_000).contains(&cfg.heartbeat_period_ms) {
        return Err(ConfigError::ValidationFailed(
            "heartbeat_period_ms must be 1000-600000",
        ));
    }
    if !(1..=100).contains(&cfg.control_loop_interval_ms) {
        return Err(ConfigError::ValidationFailed(
            "control_loop_interval_ms must be 1-100",
        ));
    }
    Ok(())
}

// ── In-memory backend ─────────────────────────────────────────

/// Volatile storage backend. Everything is lost on drop, which is
/// exactly what corruption and first-boot tests want.
#[derive(Default)]
pub struct MemStorage {
    store: std::cell::RefCell<HashMap<String, Vec<u8>>>,
}

impl MemStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{}::{}", namespace, key)
    }
}

impl StoragePort for MemStorage {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let composite = Self::composite_key(namespace, key);
        match self.store.borrow().get(&composite) {
            Some(data) => {
                let len = data.len().min(buf.len());
                buf[..len].copy_from_slice(&data[..len]);
                Ok(len)
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

impl ConfigPort for MemStorage {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        let key = Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY);
        if let Some(bytes) = self.store.borrow().get(&key) {
            let cfg: SystemConfig =
                postcard::from_bytes(bytes).map_err(|_| ConfigError::Corrupted)?;
            info!("storage: loaded config from store");
            Ok(cfg)
        } else {
            info!("storage: no stored config, using defaults");
            Ok(SystemConfig::default())
        }
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        validate_config(config)?;
        let key = Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY);
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        self.store.borrow_mut().insert(key, bytes);
        Ok(())
    }
}

// ── File-backed backend ───────────────────────────────────────

/// Persistent storage backend for the host simulation. Each namespaced
/// key maps to `<root>/<namespace>.<key>`; writes go through a temp
/// file and a rename so a crash never leaves a partial record behind.
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|_| StorageError::IoError)?;
        Ok(Self { root })
    }

    fn path_for(&self, namespace: &str, key: &str) -> PathBuf {
        self.root.join(format!("{}.{}", namespace, key))
    }
}

impl StoragePort for FileStorage {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let path = self.path_for(namespace, key);
        let data = match std::fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound);
            }
            Err(_) => return Err(StorageError::IoError),
        };
        let len = data.len().min(buf.len());
        buf[..len].copy_from_slice(&data[..len]);
        Ok(len)
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let path = self.path_for(namespace, key);
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, data).map_err(|_| StorageError::IoError)?;
        std::fs::rename(&tmp, &path).map_err(|_| StorageError::IoError)?;
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(namespace, key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(_) => Err(StorageError::IoError),
        }
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.path_for(namespace, key).exists()
    }
}

impl ConfigPort for FileStorage {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        let path = self.path_for(CONFIG_NAMESPACE, CONFIG_KEY);
        match std::fs::read(&path) {
            Ok(bytes) => {
                let cfg: SystemConfig =
                    postcard::from_bytes(&bytes).map_err(|_| ConfigError::Corrupted)?;
                info!("storage: loaded config from {}", path.display());
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("storage: no stored config, using defaults");
                Ok(SystemConfig::default())
            }
            Err(e) => {
                warn!("storage: config read error ({e}), using defaults");
                Ok(SystemConfig::default())
            }
        }
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        validate_config(config)?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        let path = self.path_for(CONFIG_NAMESPACE, CONFIG_KEY);
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, &bytes).map_err(|_| ConfigError::IoError)?;
        std::fs::rename(&tmp, &path).map_err(|_| ConfigError::IoError)?;
        Ok(())
    }
}
