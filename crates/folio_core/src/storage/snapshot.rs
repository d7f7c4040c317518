//! JSON snapshot file with atomic replace-on-write.
//!
//! # Responsibility
//! - Load the last successfully persisted snapshot.
//! - Replace the snapshot through write-temp, fsync, rename.
//!
//! # Invariants
//! - The temp file lives in the target's directory so the rename stays on
//!   one filesystem.
//! - A failed save leaves the previous snapshot untouched.
//! - Every handle to the same file in one process shares one writer lock.
//! - At most one `SnapshotLock` guard exists per file across processes.

use super::{StorageError, StorageResult};
use log::{debug, error, warn};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tempfile::NamedTempFile;

static WRITE_LOCKS: Lazy<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> = Lazy::new(Default::default);

/// Handle to one JSON snapshot file on disk.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Loads and decodes the full snapshot.
    ///
    /// # Errors
    /// - `StorageError::Io` when the file cannot be read.
    /// - `StorageError::Decode` when the content does not decode into `T`.
    pub fn load<T: DeserializeOwned>(&self) -> StorageResult<T> {
        let bytes = std::fs::read(&self.path).map_err(|source| StorageError::Io {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|source| StorageError::Decode {
            path: self.path.clone(),
            source,
        })
    }

    /// Atomically replaces the snapshot with `value`.
    ///
    /// # Side effects
    /// - Creates the parent directory when missing.
    /// - Emits `snapshot_save` logging events with duration and status.
    pub fn save<T: Serialize + ?Sized>(&self, value: &T) -> StorageResult<()> {
        let started_at = Instant::now();
        match self.write_atomically(value) {
            Ok(()) => {
                debug!(
                    "event=snapshot_save module=storage status=ok file={} duration_ms={}",
                    self.file_label(),
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=snapshot_save module=storage status=error file={} duration_ms={} error={}",
                    self.file_label(),
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Writes `initial` when no snapshot exists yet.
    ///
    /// Returns `true` when a new snapshot was created.
    pub fn ensure_initialized<T: Serialize + ?Sized>(&self, initial: &T) -> StorageResult<bool> {
        if self.exists() {
            return Ok(false);
        }
        self.save(initial)?;
        Ok(true)
    }

    /// Returns the writer lock shared by every handle to this file.
    ///
    /// Handles are matched by canonical parent directory plus file name, so
    /// different spellings of one path share a lock.
    pub fn write_lock(&self) -> Arc<Mutex<()>> {
        let key = self.lock_key();
        Arc::clone(WRITE_LOCKS.lock().entry(key).or_default())
    }

    /// Takes the cross-process lock file `<path>.lock`.
    ///
    /// The lock file is removed when the guard drops. A lock file left by a
    /// crashed process has to be removed by hand.
    ///
    /// # Errors
    /// - `StorageError::Locked` when another holder owns the lock.
    /// - `StorageError::Io` when the lock file cannot be created.
    pub fn lock_exclusive(&self) -> StorageResult<SnapshotLock> {
        let dir = self.parent_dir();
        std::fs::create_dir_all(&dir).map_err(|source| self.io_error(source))?;
        let lock_path = self.lock_path();
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
        {
            Ok(_) => Ok(SnapshotLock { path: lock_path }),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                warn!(
                    "event=snapshot_lock module=storage status=error error_code=locked file={}",
                    self.file_label()
                );
                Err(StorageError::Locked { path: lock_path })
            }
            Err(source) => Err(self.io_error(source)),
        }
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".lock");
        PathBuf::from(name)
    }

    fn lock_key(&self) -> PathBuf {
        let dir = self.parent_dir();
        match (std::fs::canonicalize(&dir), self.path.file_name()) {
            (Ok(dir), Some(name)) => dir.join(name),
            _ => self.path.clone(),
        }
    }

    fn write_atomically<T: Serialize + ?Sized>(&self, value: &T) -> StorageResult<()> {
        let dir = self.parent_dir();
        std::fs::create_dir_all(&dir).map_err(|source| self.io_error(source))?;

        let mut temp = NamedTempFile::new_in(&dir).map_err(|source| self.io_error(source))?;
        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            serde_json::to_writer(&mut writer, value).map_err(StorageError::Encode)?;
            writer
                .write_all(b"\n")
                .and_then(|()| writer.flush())
                .map_err(|source| self.io_error(source))?;
        }
        temp.as_file()
            .sync_all()
            .map_err(|source| self.io_error(source))?;
        temp.persist(&self.path)
            .map_err(|err| self.io_error(err.error))?;
        Ok(())
    }

    fn parent_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    fn file_label(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unknown".to_string())
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

/// Guard for the cross-process lock file; removes it on drop.
#[derive(Debug)]
pub struct SnapshotLock {
    path: PathBuf,
}

impl Drop for SnapshotLock {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_file(&self.path) {
            warn!(
                "event=snapshot_unlock module=storage status=error error={}",
                err
            );
        }
    }
}
