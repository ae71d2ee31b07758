//! Write-to-temp-then-rename JSON helpers.
//!
//! Every persisted document goes through [`write_json_atomic`]: the payload
//! is written to a temporary file in the destination directory and renamed
//! over the target, so a reader sees either the old document or the new one.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;

use crate::{PersistError, PersistResult};

/// Pretty-print `value` to `path` atomically, creating parent directories.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> PersistResult<()> {
    let bytes = serde_json::to_vec_pretty(value).map_err(|e| PersistError::json(path, e))?;
    write_bytes_atomic(path, &bytes)
}

/// Atomically replace `path` with `bytes`.
pub fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> PersistResult<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(|e| PersistError::io(dir, e))?;

    // Dropped (and deleted) on any early return.
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| PersistError::io(dir, e))?;
    tmp.write_all(bytes).map_err(|e| PersistError::io(tmp.path(), e))?;
    tmp.as_file().sync_all().map_err(|e| PersistError::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| PersistError::Persist { path: path.to_path_buf(), source: e })?;
    Ok(())
}

/// Read and parse a JSON document.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> PersistResult<T> {
    let raw = fs::read(path).map_err(|e| PersistError::io(path, e))?;
    serde_json::from_slice(&raw).map_err(|e| PersistError::json(path, e))
}

/// Like [`read_json`], but a missing file is `Ok(None)`.
pub fn read_json_opt<T: DeserializeOwned>(path: &Path) -> PersistResult<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    read_json(path).map(Some)
}
