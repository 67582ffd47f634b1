//! core::file::lock
//!
//! Exclusive per-file lock for mutating commands.
//!
//! # Storage
//!
//! - `<design>.lock` - Lock file next to the design, with an OS-level
//!   exclusive lock
//!
//! # Invariants
//!
//! - Lock must be held from load to save of a mutating command
//! - Lock is automatically released on drop (RAII pattern)
//! - Lock acquisition is non-blocking (fails fast if locked)
//!
//! # Example
//!
//! ```no_run
//! use plydesign::core::file::lock::DesignLock;
//! use std::path::Path;
//!
//! let lock = DesignLock::acquire(Path::new("gripper.ply.json"))?;
//!
//! // Load, edit and save while holding the lock
//!
//! drop(lock);
//! # Ok::<(), plydesign::core::file::lock::LockError>(())
//! ```

use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;

/// Errors from locking operations.
#[derive(Debug, Error)]
pub enum LockError {
    /// Another process already holds the lock.
    #[error("design is locked by another ply process")]
    AlreadyLocked,

    /// Failed to create the lock file.
    #[error("failed to create lock: {0}")]
    CreateFailed(String),

    /// Failed to acquire the OS lock.
    #[error("failed to acquire lock: {0}")]
    AcquireFailed(String),

    /// Failed to release the lock.
    #[error("failed to release lock: {0}")]
    ReleaseFailed(String),
}

/// Path of the lock file guarding `design_path`.
pub fn lock_path(design_path: &Path) -> PathBuf {
    let mut name = design_path
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(".lock");
    design_path.with_file_name(name)
}

/// An exclusive lock on one design file.
///
/// Released when dropped.
#[derive(Debug)]
pub struct DesignLock {
    path: PathBuf,
    /// When this is Some, we hold the lock.
    file: Option<File>,
}

impl DesignLock {
    /// Attempt to lock `design_path`.
    ///
    /// The design itself need not exist yet; the lock file is created next
    /// to where it would be.
    ///
    /// # Errors
    ///
    /// - [`LockError::AlreadyLocked`] if another process holds the lock
    /// - [`LockError::CreateFailed`] if the lock file cannot be created
    /// - [`LockError::AcquireFailed`] if the OS lock cannot be acquired
    pub fn acquire(design_path: &Path) -> Result<Self, LockError> {
        let path = lock_path(design_path);

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| {
                LockError::CreateFailed(format!("cannot open {}: {}", path.display(), e))
            })?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "acquired design lock");
                Ok(Self {
                    path,
                    file: Some(file),
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Err(LockError::AlreadyLocked),
            Err(e) => Err(LockError::AcquireFailed(e.to_string())),
        }
    }

    /// Try to acquire the lock, returning None if already held.
    pub fn try_acquire(design_path: &Path) -> Result<Option<Self>, LockError> {
        match Self::acquire(design_path) {
            Ok(lock) => Ok(Some(lock)),
            Err(LockError::AlreadyLocked) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Check if the lock is currently held.
    pub fn is_held(&self) -> bool {
        self.file.is_some()
    }

    /// Get the path to the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock before the guard goes out of scope.
    pub fn release(&mut self) -> Result<(), LockError> {
        if let Some(file) = self.file.take() {
            file.unlock()
                .map_err(|e| LockError::ReleaseFailed(e.to_string()))?;
        }
        Ok(())
    }
}

impl Drop for DesignLock {
    fn drop(&mut self) {
        // Best-effort release on drop
        if let Some(file) = self.file.take() {
            let _ = file.unlock();
        }
    }
}
