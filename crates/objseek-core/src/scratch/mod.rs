//! Scoped temp files for staging object data.
//!
//! A `TempObjectFile` owns a uniquely named file in an explicit directory and
//! deletes it exactly once: on `release`, on drop, or never if it was
//! `persist`ed to a final path. `sweep_stale` reclaims files that a crashed
//! process left behind under the same prefix.

mod sweep;

use crate::error::ObjectError;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

pub use sweep::sweep_stale;

/// Open handle plus the path it was created at.
struct Held {
    /// `None` once the handle was closed by a release whose delete failed.
    file: Option<File>,
    path: PathBuf,
}

/// Read/write temp file that is removed when released or dropped.
pub struct TempObjectFile {
    path: PathBuf,
    held: Mutex<Option<Held>>,
}

impl TempObjectFile {
    /// Create a new file named `{prefix}{random}` in `dir`, open for read and write.
    pub fn acquire(dir: &Path, prefix: &str) -> Result<Self, ObjectError> {
        let (file, path) = tempfile::Builder::new()
            .prefix(prefix)
            .tempfile_in(dir)
            .and_then(|named| named.keep().map_err(|e| e.error))
            .map_err(|e| ObjectError::filesystem(dir, e))?;
        tracing::debug!(path = %path.display(), "temp file acquired");
        Ok(Self {
            path: path.clone(),
            held: Mutex::new(Some(Held {
                file: Some(file),
                path,
            })),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// False once the file was released or persisted.
    pub fn is_owned(&self) -> bool {
        self.lock().is_some()
    }

    /// Close the handle and delete the file. Later calls are no-ops.
    ///
    /// If the delete fails the file stays owned, so calling again retries it.
    pub fn release(&self) -> Result<(), ObjectError> {
        let mut held = self.lock();
        let Some(h) = held.as_mut() else {
            return Ok(());
        };
        drop(h.file.take());
        match std::fs::remove_file(&h.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %h.path.display(), "temp file already gone");
            }
            Err(e) => return Err(ObjectError::filesystem(&h.path, e)),
        }
        tracing::debug!(path = %h.path.display(), "temp file released");
        *held = None;
        Ok(())
    }

    /// Flush file data to disk.
    pub fn sync(&self) -> Result<(), ObjectError> {
        self.with_file(|f| f.sync_all())
            .map_err(|e| ObjectError::filesystem(&self.path, e))
    }

    /// Rename to `final_path` and give up ownership; the file is not deleted afterwards.
    /// Fails if `final_path` is on a different filesystem, in which case the
    /// temp file is still owned and will be removed on drop.
    pub fn persist(self, final_path: &Path) -> Result<(), ObjectError> {
        let mut held = self.lock();
        let Some(h) = held.as_mut() else {
            return Err(ObjectError::Released {
                path: self.path.clone(),
            });
        };
        drop(h.file.take());
        std::fs::rename(&h.path, final_path)
            .map_err(|e| ObjectError::filesystem(final_path, e))?;
        tracing::debug!(
            from = %h.path.display(),
            to = %final_path.display(),
            "temp file persisted"
        );
        *held = None;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Option<Held>> {
        self.held.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_file<T>(&self, op: impl FnOnce(&mut File) -> io::Result<T>) -> io::Result<T> {
        let mut held = self.lock();
        match held.as_mut().and_then(|h| h.file.as_mut()) {
            Some(file) => op(file),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                ObjectError::Released {
                    path: self.path.clone(),
                },
            )),
        }
    }
}

impl Drop for TempObjectFile {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to remove temp file");
        }
    }
}

impl Read for &TempObjectFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.with_file(|f| f.read(buf))
    }
}

impl Write for &TempObjectFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.with_file(|f| f.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.with_file(|f| f.flush())
    }
}

impl Seek for &TempObjectFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.with_file(|f| f.seek(pos))
    }
}

impl Read for TempObjectFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (&*self).read(buf)
    }
}

impl Write for TempObjectFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (&*self).write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        (&*self).flush()
    }
}

impl Seek for TempObjectFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        (&*self).seek(pos)
    }
}

/// Run `op` on a fresh temp file and release it on every exit path.
///
/// An error from `op` takes precedence over a release error.
pub fn with_temp_file<T, E>(
    dir: &Path,
    prefix: &str,
    op: impl FnOnce(&TempObjectFile) -> Result<T, E>,
) -> Result<T, E>
where
    E: From<ObjectError>,
{
    let file = TempObjectFile::acquire(dir, prefix)?;
    let result = op(&file);
    let released = file.release();
    let value = result?;
    released?;
    Ok(value)
}
