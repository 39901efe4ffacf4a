// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key file storage inside one vault directory.
//!
//! Every write goes to a temp file in the vault directory, is fsynced, and is
//! then moved into place atomically, so a reader sees either the complete old
//! file or the complete new one. New records use a no-clobber move: the
//! existence check and the write are one filesystem operation, and two racing
//! setups cannot overwrite each other. Replacing a record is a
//! compare-and-swap against the bytes the caller read, so an update made in
//! between is reported as a conflict instead of being silently lost.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lockbox_core::{Identity, LockboxError};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Suffix appended to an identity to form its key file name.
pub const KEY_FILE_SUFFIX: &str = "-key.json";

/// File name of the unnamed single-tenant record.
pub const UNNAMED_KEY_FILE: &str = "key.json";

/// File-backed storage for serialized key records.
///
/// Clones share one write lock, so every handle to the same store
/// serializes its compare-and-swap and removal steps.
#[derive(Debug, Clone)]
pub struct VaultStore {
    dir: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl VaultStore {
    /// Store rooted at `dir`. Nothing is touched on disk until a write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.dir
    }

    /// Deterministic key file path: `{identity}-key.json`, or `key.json`
    /// for the unnamed record. Identities cannot contain separators, so
    /// distinct identities never share a path.
    pub fn path_for(&self, identity: Option<&Identity>) -> PathBuf {
        match identity {
            Some(id) => self.dir.join(format!("{id}{KEY_FILE_SUFFIX}")),
            None => self.dir.join(UNNAMED_KEY_FILE),
        }
    }

    pub fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    /// Create the vault directory (owner-only on Unix) if it is missing.
    ///
    /// Returns `true` if the directory was created by this call.
    pub fn ensure_directory_exists(&self) -> Result<bool, LockboxError> {
        if self.dir.is_dir() {
            return Ok(false);
        }

        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }
        builder
            .create(&self.dir)
            .map_err(|e| LockboxError::io(&self.dir, e))?;

        debug!(path = %self.dir.display(), "vault directory created");
        Ok(true)
    }

    /// Read a key file.
    pub fn read(&self, path: &Path) -> Result<Vec<u8>, LockboxError> {
        fs::read(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => LockboxError::NotFound {
                path: path.to_path_buf(),
            },
            _ => LockboxError::io(path, e),
        })
    }

    /// Write a new key file, refusing to replace an existing one.
    pub fn write_new(&self, path: &Path, bytes: &[u8]) -> Result<(), LockboxError> {
        let tmp = self.stage(bytes)?;
        tmp.persist_noclobber(path).map_err(|e| match e.error.kind() {
            ErrorKind::AlreadyExists => LockboxError::AlreadyExists {
                path: path.to_path_buf(),
            },
            _ => LockboxError::io(path, e.error),
        })?;
        self.sync_directory();
        Ok(())
    }

    /// Atomically replace an existing key file, provided it still holds
    /// `expected` (the bytes the caller based its update on).
    ///
    /// Fails with [`LockboxError::Conflict`] if the file changed in the
    /// meantime; the file is then left as it is.
    pub fn replace(&self, path: &Path, expected: &[u8], bytes: &[u8]) -> Result<(), LockboxError> {
        if !self.exists(path) {
            return Err(LockboxError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let tmp = self.stage(bytes)?;

        let _guard = self.lock();
        if self.read(path)? != expected {
            return Err(LockboxError::Conflict {
                path: path.to_path_buf(),
            });
        }
        tmp.persist(path)
            .map_err(|e| LockboxError::io(path, e.error))?;
        self.sync_directory();
        Ok(())
    }

    /// Delete a key file.
    pub fn remove(&self, path: &Path) -> Result<(), LockboxError> {
        let _guard = self.lock();
        fs::remove_file(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => LockboxError::NotFound {
                path: path.to_path_buf(),
            },
            _ => LockboxError::io(path, e),
        })?;
        self.sync_directory();
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write `bytes` to a durable temp file (mode 0600) next to the target.
    fn stage(&self, bytes: &[u8]) -> Result<NamedTempFile, LockboxError> {
        let mut tmp = tempfile::Builder::new()
            .prefix(".lockbox-")
            .suffix(".tmp")
            .tempfile_in(&self.dir)
            .map_err(|e| LockboxError::io(&self.dir, e))?;
        tmp.write_all(bytes)
            .map_err(|e| LockboxError::io(tmp.path(), e))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| LockboxError::io(tmp.path(), e))?;
        Ok(tmp)
    }

    /// Flush the directory entry so the rename survives a crash.
    #[cfg(unix)]
    fn sync_directory(&self) {
        let synced = fs::File::open(&self.dir).and_then(|dir| dir.sync_all());
        if let Err(e) = synced {
            warn!(
                path = %self.dir.display(),
                error = %e,
                "vault directory fsync failed, last change may not survive a crash"
            );
        }
    }

    #[cfg(not(unix))]
    fn sync_directory(&self) {}
}
