//! Startup cleanup of temp files orphaned by a previous process.

use crate::error::ObjectError;
use std::fs;
use std::io;
use std::path::Path;

/// Delete every entry in `dir` whose name starts with `prefix`.
///
/// Stops at the first entry that cannot be removed and returns that error;
/// anything not yet visited is left for the next sweep. Directories are only
/// removed when empty. Returns the number of entries deleted.
pub fn sweep_stale(dir: &Path, prefix: &str) -> Result<usize, ObjectError> {
    if prefix.is_empty() {
        return Err(ObjectError::filesystem(
            dir,
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "refusing to sweep with an empty prefix",
            ),
        ));
    }

    let entries = fs::read_dir(dir).map_err(|e| ObjectError::filesystem(dir, e))?;
    let mut removed = 0;
    for entry in entries {
        let entry = entry.map_err(|e| ObjectError::filesystem(dir, e))?;
        if !entry.file_name().to_string_lossy().starts_with(prefix) {
            continue;
        }
        let path = entry.path();
        let file_type = entry
            .file_type()
            .map_err(|e| ObjectError::filesystem(&path, e))?;
        let result = if file_type.is_dir() {
            fs::remove_dir(&path)
        } else {
            fs::remove_file(&path)
        };
        result.map_err(|e| ObjectError::filesystem(&path, e))?;
        tracing::debug!(path = %path.display(), "removed stale temp file");
        removed += 1;
    }

    if removed > 0 {
        tracing::info!(dir = %dir.display(), prefix, removed, "swept stale temp files");
    }
    Ok(removed)
}
