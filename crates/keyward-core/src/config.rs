use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

use thiserror::Error;

/// Section holding path settings.
pub const PATHS_SECTION: &str = "paths";
/// Entry within [`PATHS_SECTION`] naming the default key file.
pub const KEY_FILE_ENTRY: &str = "key_file";
/// Default key file used when configuration does not name one.
pub const DEFAULT_KEY_FILE: &str = ".env";

/// Errors produced by configuration store implementations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Configuration source exists but could not be read.
    #[error("failed to read config {location}: {reason}")]
    Read { location: String, reason: String },
    /// Configuration source is not valid for this store's format.
    #[error("failed to parse config {location}: {reason}")]
    Parse { location: String, reason: String },
    /// Configuration could not be persisted.
    #[error("failed to write config {location}: {reason}")]
    Write { location: String, reason: String },
}

/// Sectioned key-value configuration (e.g. `paths.key_file`).
pub trait ConfigStore {
    /// Read a value; `Ok(None)` when the section or entry is absent.
    fn get(&self, section: &str, key: &str) -> Result<Option<String>, ConfigError>;

    /// Durably replace a single value, leaving other entries untouched.
    fn set(&self, section: &str, key: &str, value: &str) -> Result<(), ConfigError>;
}

/// In-memory configuration store for tests and ephemeral sessions.
/// Clones share the same underlying entries.
#[derive(Debug, Default, Clone)]
pub struct InMemoryConfigStore {
    inner: Arc<Mutex<BTreeMap<(String, String), String>>>,
}

impl InMemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with a single entry.
    pub fn with_entry(section: &str, key: &str, value: &str) -> Self {
        let store = Self::new();
        if let Ok(mut map) = store.inner.lock() {
            map.insert((section.to_string(), key.to_string()), value.to_string());
        }
        store
    }
}

impl ConfigStore for InMemoryConfigStore {
    fn get(&self, section: &str, key: &str) -> Result<Option<String>, ConfigError> {
        let map = self.inner.lock().map_err(|err| ConfigError::Read {
            location: "memory".to_string(),
            reason: format!("lock poisoned: {err}"),
        })?;
        Ok(map.get(&(section.to_string(), key.to_string())).cloned())
    }

    fn set(&self, section: &str, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut map = self.inner.lock().map_err(|err| ConfigError::Write {
            location: "memory".to_string(),
            reason: format!("lock poisoned: {err}"),
        })?;
        map.insert((section.to_string(), key.to_string()), value.to_string());
        Ok(())
    }
}
