//! Core abstractions for Keyward: the symmetric key type and the configuration store contract.
//! Storage and cipher crates build on these types; nothing here touches the filesystem.

pub mod config;
pub mod key;
