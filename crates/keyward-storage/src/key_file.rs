use std::{
    fmt, fs, io,
    path::{Path, PathBuf, MAIN_SEPARATOR},
};

use keyward_core::key::Key;
use thiserror::Error;
use tracing::{debug, instrument};
use zeroize::{Zeroize, Zeroizing};

use crate::atomic::replace_file;

/// Per-save rules for the key persister. The default neither creates directories nor
/// replaces an existing key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistencePolicy {
    /// Create the target's parent directory (and ancestors) when missing.
    pub create_missing_directory: bool,
    /// Replace a key file that already exists. When false, an existing file is kept.
    pub overwrite_existing: bool,
}

impl PersistencePolicy {
    /// Create directories as needed and replace any existing key.
    pub fn permissive() -> Self {
        Self {
            create_missing_directory: true,
            overwrite_existing: true,
        }
    }
}

/// Result of a successful save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The key was written to disk.
    Written,
    /// A key file already existed and overwriting was disabled; nothing was written.
    PreservedExisting,
}

/// Where a load target came from; selects the diagnostic for a missing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathOrigin {
    /// The configured default key file.
    Default,
    /// A path supplied by the caller.
    Explicit,
}

impl fmt::Display for PathOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathOrigin::Default => f.write_str("default"),
            PathOrigin::Explicit => f.write_str("explicit"),
        }
    }
}

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("invalid key path {}: {reason}", .path.display())]
    InvalidPath { path: PathBuf, reason: &'static str },
    #[error("directory {} does not exist", .directory.display())]
    DirectoryNotFound { directory: PathBuf },
    #[error("failed to write key file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("{}", missing_message(.path, .origin))]
    FileNotFound { path: PathBuf, origin: PathOrigin },
    #[error("key file {} is corrupt: {reason}", .path.display())]
    CorruptKey { path: PathBuf, reason: String },
    #[error("failed to read key file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn missing_message(path: &Path, origin: &PathOrigin) -> String {
    match origin {
        PathOrigin::Default => format!(
            "default key file {} is missing; save a key first",
            path.display()
        ),
        PathOrigin::Explicit => format!("key file {} does not exist", path.display()),
    }
}

/// Write `key` to `path` according to `policy`.
///
/// An existing file with overwriting disabled is a successful no-op
/// ([`SaveOutcome::PreservedExisting`]), never an error.
#[instrument(skip_all, fields(path = %path.display(), ?policy))]
pub fn save_key(
    key: &Key,
    path: &Path,
    policy: PersistencePolicy,
) -> Result<SaveOutcome, PersistError> {
    let directory = split_directory(path)?;

    if path.is_dir() {
        return Err(PersistError::InvalidPath {
            path: path.to_path_buf(),
            reason: "path is an existing directory",
        });
    }

    if !directory.as_os_str().is_empty() && !directory.exists() {
        if !policy.create_missing_directory {
            return Err(PersistError::DirectoryNotFound {
                directory: directory.to_path_buf(),
            });
        }
        fs::create_dir_all(directory).map_err(|source| PersistError::Io {
            path: directory.to_path_buf(),
            source,
        })?;
        debug!(directory = %directory.display(), "created key directory");
    }

    if path.exists() && !policy.overwrite_existing {
        debug!("key file exists; preserving it");
        return Ok(SaveOutcome::PreservedExisting);
    }

    let encoded = Zeroizing::new(key.encode());
    replace_file(directory, path, encoded.as_bytes()).map_err(|source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("key file written");
    Ok(SaveOutcome::Written)
}

/// Read a key from a caller-supplied path.
pub fn load_key(path: &Path) -> Result<Key, LoadError> {
    load_key_from(path, PathOrigin::Explicit)
}

/// Read a key from `path`, tagging a missing-file error with `origin`.
#[instrument(skip_all, fields(path = %path.display(), %origin))]
pub fn load_key_from(path: &Path, origin: PathOrigin) -> Result<Key, LoadError> {
    let bytes = fs::read(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            LoadError::FileNotFound {
                path: path.to_path_buf(),
                origin,
            }
        } else {
            LoadError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let text = Zeroizing::new(String::from_utf8(bytes).map_err(|err| {
        err.into_bytes().zeroize();
        LoadError::CorruptKey {
            path: path.to_path_buf(),
            reason: "content is not UTF-8 text".to_string(),
        }
    })?);

    Key::decode(&text).map_err(|e| LoadError::CorruptKey {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Directory component of `path`, rejecting paths without a usable file name
/// (empty, trailing separator, `.` or `..`).
fn split_directory(path: &Path) -> Result<&Path, PersistError> {
    let invalid = || PersistError::InvalidPath {
        path: path.to_path_buf(),
        reason: "file name is empty",
    };

    let text = path.to_string_lossy();
    let last_segment = text
        .rsplit(|c: char| c == '/' || c == MAIN_SEPARATOR)
        .next()
        .unwrap_or_default();
    if matches!(last_segment, "" | "." | "..") {
        return Err(invalid());
    }

    path.file_name().ok_or_else(invalid)?;
    Ok(path.parent().unwrap_or_else(|| Path::new("")))
}
