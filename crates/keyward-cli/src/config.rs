use std::{ffi::OsString, path::PathBuf};

use color_eyre::Result;
use dirs::config_dir;

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "KEYWARD_CONFIG";

/// Resolve the config file: `--config` flag, then `$KEYWARD_CONFIG`, then the platform default.
pub fn resolve_path(flag: Option<PathBuf>) -> Result<PathBuf> {
    resolve_from(flag, std::env::var_os(CONFIG_ENV))
}

fn resolve_from(flag: Option<PathBuf>, env: Option<OsString>) -> Result<PathBuf> {
    if let Some(path) = flag {
        return Ok(path);
    }
    match env {
        Some(value) if !value.is_empty() => Ok(PathBuf::from(value)),
        _ => default_path(),
    }
}

/// Resolve the default config path (platform aware).
pub fn default_path() -> Result<PathBuf> {
    let base = config_dir().ok_or_else(|| color_eyre::eyre::eyre!("no config dir available"))?;
    Ok(base.join("keyward").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_wins_over_environment() {
        let path = resolve_from(
            Some(PathBuf::from("flag.toml")),
            Some(OsString::from("env.toml")),
        )
        .expect("resolve");
        assert_eq!(path, PathBuf::from("flag.toml"));
    }

    #[test]
    fn environment_used_without_flag() {
        let path = resolve_from(None, Some(OsString::from("env.toml"))).expect("resolve");
        assert_eq!(path, PathBuf::from("env.toml"));
    }

    #[test]
    fn empty_environment_is_ignored() {
        let resolved = resolve_from(None, Some(OsString::new()));
        if let Ok(default) = default_path() {
            assert_eq!(resolved.expect("resolve"), default);
        }
    }
}
