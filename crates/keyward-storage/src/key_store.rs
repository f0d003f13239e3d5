use std::path::{Path, PathBuf};

use keyward_cipher::{CipherError, Token};
use keyward_core::{
    config::{ConfigError, ConfigStore, DEFAULT_KEY_FILE, KEY_FILE_ENTRY, PATHS_SECTION},
    key::{self, Key},
};
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::key_file::{self, LoadError, PathOrigin, PersistError, PersistencePolicy, SaveOutcome};

/// The new default path could not be persisted; the previous default is still in effect.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("failed to persist default key path {}: {source}", .path.display())]
pub struct ConfigWriteError {
    pub path: PathBuf,
    #[source]
    pub source: ConfigError,
}

/// Key lifecycle manager: owns the configured default key path and composes
/// generation, persistence, loading and the cipher.
///
/// Operations taking `Option<&Path>` fall back to the default path as it is at the
/// time of the call.
#[derive(Debug)]
pub struct KeyStore<C: ConfigStore> {
    config: C,
    default_path: PathBuf,
}

impl<C: ConfigStore> KeyStore<C> {
    /// Read `paths.key_file` from `config`, falling back to `.env` when unset.
    #[instrument(skip_all)]
    pub fn open(config: C) -> Result<Self, ConfigError> {
        let default_path = config
            .get(PATHS_SECTION, KEY_FILE_ENTRY)?
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_KEY_FILE));
        debug!(default_path = %default_path.display(), "key store opened");
        Ok(Self {
            config,
            default_path,
        })
    }

    pub fn default_path(&self) -> &Path {
        &self.default_path
    }

    /// Persist `new_path` as `paths.key_file`, then adopt it in memory.
    /// On failure the previous default stays in effect.
    ///
    /// Blank and non-UTF-8 paths are refused before the store is touched: neither
    /// would read back as the same default.
    #[instrument(skip_all, fields(path = %new_path.as_ref().display()))]
    pub fn set_default_path(
        &mut self,
        new_path: impl AsRef<Path>,
    ) -> Result<(), ConfigWriteError> {
        let new_path = new_path.as_ref();
        let rejected = |reason: &str| ConfigWriteError {
            path: new_path.to_path_buf(),
            source: ConfigError::Write {
                location: format!("{PATHS_SECTION}.{KEY_FILE_ENTRY}"),
                reason: reason.to_string(),
            },
        };
        let value = new_path
            .to_str()
            .ok_or_else(|| rejected("path is not valid UTF-8"))?;
        if value.trim().is_empty() {
            return Err(rejected("path is empty"));
        }

        self.config
            .set(PATHS_SECTION, KEY_FILE_ENTRY, value)
            .map_err(|source| ConfigWriteError {
                path: new_path.to_path_buf(),
                source,
            })?;
        self.default_path = new_path.to_path_buf();
        info!("default key path updated");
        Ok(())
    }

    pub fn generate_key(&self) -> Key {
        key::generate_key()
    }

    /// Save `key` to `path`, or to the current default path when `None`.
    pub fn save_key(
        &self,
        key: &Key,
        path: Option<&Path>,
        policy: PersistencePolicy,
    ) -> Result<SaveOutcome, PersistError> {
        key_file::save_key(key, path.unwrap_or(&self.default_path), policy)
    }

    /// Load a key from `path`, or from the current default path when `None`.
    pub fn load_key(&self, path: Option<&Path>) -> Result<Key, LoadError> {
        match path {
            Some(path) => key_file::load_key_from(path, PathOrigin::Explicit),
            None => key_file::load_key_from(&self.default_path, PathOrigin::Default),
        }
    }

    pub fn encrypt(&self, plaintext: &str, key: &Key) -> Result<Token, CipherError> {
        keyward_cipher::encrypt(plaintext, key)
    }

    pub fn decrypt(&self, token: &Token, key: &Key) -> Result<String, CipherError> {
        keyward_cipher::decrypt(token, key)
    }

    pub fn config(&self) -> &C {
        &self.config
    }
}
