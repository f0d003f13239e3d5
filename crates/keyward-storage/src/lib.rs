//! Filesystem persistence for Keyward keys and configuration.
//! Key files and the TOML config are replaced atomically via temp file + rename.

mod atomic;
pub mod key_file;
pub mod key_store;
pub mod toml_config;
