//! Source document I/O
//!
//! The write-back is a single whole-file overwrite staged through a temp
//! file in the same directory and an atomic rename. No partial-line
//! writes, no byte-range patching.

use crate::PatchError;
use std::io::Write;
use std::path::Path;

/// Read the current source text
pub fn load_source(path: impl AsRef<Path>) -> Result<String, PatchError> {
    let path = path.as_ref();
    std::fs::read_to_string(path).map_err(|source| PatchError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Overwrite the source document atomically.
///
/// The temp file lives in the target's directory so the rename stays on
/// one filesystem.
pub fn persist_source(path: impl AsRef<Path>, text: &str) -> Result<(), PatchError> {
    let path = path.as_ref();
    let write_err = |source: std::io::Error| PatchError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(text.as_bytes()).map_err(write_err)?;
    tmp.flush().map_err(write_err)?;
    tmp.persist(path)
        .map_err(|e| write_err(e.error))?;

    tracing::info!(path = %path.display(), bytes = text.len(), "source persisted");
    Ok(())
}
