use std::path::Path;

use color_eyre::Result;
use keyward_storage::{key_store::KeyStore, toml_config::TomlConfigStore};
use tracing::debug;

/// Open the key store backed by the TOML config at `config_path`.
pub fn open_key_store(config_path: &Path) -> Result<KeyStore<TomlConfigStore>> {
    debug!(config = %config_path.display(), "opening key store");
    let store = KeyStore::open(TomlConfigStore::new(config_path))?;
    Ok(store)
}

/// Helper for tests: a key store whose config lives only in memory.
#[cfg(test)]
pub fn test_store(
    default_key: &Path,
) -> KeyStore<keyward_core::config::InMemoryConfigStore> {
    use keyward_core::config::{InMemoryConfigStore, KEY_FILE_ENTRY, PATHS_SECTION};

    let config = InMemoryConfigStore::with_entry(
        PATHS_SECTION,
        KEY_FILE_ENTRY,
        &default_key.to_string_lossy(),
    );
    KeyStore::open(config).expect("in-memory config never fails to read")
}
