use std::{
    fs, io,
    path::{Path, PathBuf},
};

use keyward_core::config::{ConfigError, ConfigStore};
use toml::{Table, Value};
use tracing::{debug, instrument};

use crate::atomic::replace_file;

/// Configuration store backed by a TOML file, one table per section:
///
/// ```toml
/// [paths]
/// key_file = "secrets/key.env"
/// ```
///
/// A missing file reads as empty. Writes rewrite the whole file atomically and keep
/// unrelated tables and entries.
#[derive(Debug, Clone)]
pub struct TomlConfigStore {
    path: PathBuf,
}

impl TomlConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn read_table(&self) -> Result<Table, ConfigError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Table::new()),
            Err(err) => {
                return Err(ConfigError::Read {
                    location: self.location(),
                    reason: err.to_string(),
                })
            }
        };
        if contents.trim().is_empty() {
            return Ok(Table::new());
        }
        toml::from_str::<Table>(&contents).map_err(|e| ConfigError::Parse {
            location: self.location(),
            reason: e.to_string(),
        })
    }
}

impl ConfigStore for TomlConfigStore {
    #[instrument(skip(self), fields(config = %self.path.display()))]
    fn get(&self, section: &str, key: &str) -> Result<Option<String>, ConfigError> {
        let table = self.read_table()?;
        let Some(value) = table
            .get(section)
            .and_then(Value::as_table)
            .and_then(|entries| entries.get(key))
        else {
            return Ok(None);
        };

        match value.as_str() {
            Some(text) => Ok(Some(text.to_string())),
            None => Err(ConfigError::Parse {
                location: self.location(),
                reason: format!("{section}.{key} must be a string"),
            }),
        }
    }

    #[instrument(skip(self, value), fields(config = %self.path.display()))]
    fn set(&self, section: &str, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut table = self.read_table()?;
        let entry = table
            .entry(section.to_string())
            .or_insert_with(|| Value::Table(Table::new()));
        let Value::Table(section_table) = entry else {
            return Err(ConfigError::Parse {
                location: self.location(),
                reason: format!("{section} is not a table"),
            });
        };
        section_table.insert(key.to_string(), Value::String(value.to_string()));

        let write_err = |reason: String| ConfigError::Write {
            location: self.location(),
            reason,
        };
        let body = toml::to_string_pretty(&table).map_err(|e| write_err(e.to_string()))?;

        let directory = self.path.parent().unwrap_or_else(|| Path::new(""));
        if !directory.as_os_str().is_empty() {
            fs::create_dir_all(directory).map_err(|e| write_err(e.to_string()))?;
        }
        replace_file(directory, &self.path, body.as_bytes())
            .map_err(|e| write_err(e.to_string()))?;
        debug!("config updated");
        Ok(())
    }
}
