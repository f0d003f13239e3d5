use std::{
    io::{self, Write},
    path::Path,
};

use tempfile::NamedTempFile;

/// Replace `path` with `contents` via a temp file in `directory` and a rename, so readers
/// never observe a partial write. An empty `directory` means the current directory.
pub(crate) fn replace_file(directory: &Path, path: &Path, contents: &[u8]) -> io::Result<()> {
    let directory = if directory.as_os_str().is_empty() {
        Path::new(".")
    } else {
        directory
    };

    let mut tmp = NamedTempFile::new_in(directory)?;
    tmp.write_all(contents)?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
