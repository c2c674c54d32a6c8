//! Readers/writer lock built from two lock cores on one path.
//!
//! Readers take a shared [`FileLock`], writers an exclusive one, both on the
//! same file. Native locks on separate descriptors of one file already give
//! reader/writer semantics; soft locks fall back to plain mutual exclusion
//! (see [`ReadWriteLock::readers_share`]).
//!
//! Changing modes while holding the lock is refused:
//!
//! - a write request while the caller holds the read lock would wait on its
//!   own shared lock forever, so it fails with `UpgradeNotSupported`
//! - a read request while the caller holds the write lock fails with
//!   `DowngradeNotSupported` for the same reason
//!
//! Release the held side first, accepting that another writer may get in
//! between.

use crate::backend::{self, Backend};
use crate::config::{LockConfig, Mode, Reentrancy};
use crate::error::{LockError, Result};
use crate::lock::{FileLock, LockGuard};
use log::warn;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// A cross-process readers/writer lock on a filesystem path.
#[derive(Debug)]
pub struct ReadWriteLock {
    read: Arc<FileLock>,
    write: Arc<FileLock>,
}

impl ReadWriteLock {
    /// Create a readers/writer lock on `path` with the default configuration.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let config = LockConfig::default();
        let backend = backend::select(config.backend, config.file_mode);
        Self::with_backend(path, backend)
    }

    /// Create a readers/writer lock from a configuration; `config.mode` is ignored.
    pub fn with_config(path: impl Into<PathBuf>, config: &LockConfig) -> Result<Self> {
        let path = path.into();
        Ok(Self::from_locks(
            FileLock::with_config(path.clone(), &config.with_mode(Mode::Shared))?,
            FileLock::with_config(path, &config.with_mode(Mode::Exclusive))?,
        ))
    }

    /// Create a readers/writer lock that uses a specific backend.
    pub fn with_backend(path: impl Into<PathBuf>, backend: Arc<dyn Backend>) -> Self {
        let path = path.into();
        Self::from_locks(
            FileLock::with_backend(path.clone(), Mode::Shared, backend.clone()),
            FileLock::with_backend(path, Mode::Exclusive, backend),
        )
    }

    fn from_locks(read: FileLock, write: FileLock) -> Self {
        if !read.supports_shared() {
            warn!(
                "readers of '{}' will exclude each other ({} backend)",
                read.path().display(),
                read.backend_kind()
            );
        }
        Self {
            read: Arc::new(read),
            write: Arc::new(write),
        }
    }

    /// Set the reentrancy scope of both sides.
    ///
    /// A side still referenced by a live async guard keeps its scope.
    pub fn with_reentrancy(self, reentrancy: Reentrancy) -> Self {
        let rescope = |side: Arc<FileLock>| match Arc::try_unwrap(side) {
            Ok(lock) => Arc::new(lock.with_reentrancy(reentrancy)),
            Err(shared) => shared,
        };
        Self {
            read: rescope(self.read),
            write: rescope(self.write),
        }
    }

    /// Acquire the read lock with the configured timeout and poll interval.
    pub fn read(&self) -> Result<ReadGuard<'_>> {
        self.acquire_read(self.read.timeout(), self.read.poll_interval())
    }

    /// Acquire the write lock with the configured timeout and poll interval.
    pub fn write(&self) -> Result<WriteGuard<'_>> {
        self.acquire_write(self.write.timeout(), self.write.poll_interval())
    }

    /// Make a single attempt to acquire the read lock.
    pub fn try_read(&self) -> Result<ReadGuard<'_>> {
        self.acquire_read(Some(Duration::ZERO), self.read.poll_interval())
    }

    /// Make a single attempt to acquire the write lock.
    pub fn try_write(&self) -> Result<WriteGuard<'_>> {
        self.acquire_write(Some(Duration::ZERO), self.write.poll_interval())
    }

    /// Acquire the read lock.
    ///
    /// # Returns
    ///
    /// * `Err(LockError::DowngradeNotSupported)` - The caller holds the write lock
    /// * Otherwise as [`FileLock::acquire_with`]
    pub fn acquire_read(
        &self,
        timeout: Option<Duration>,
        poll_interval: Duration,
    ) -> Result<ReadGuard<'_>> {
        self.check_read()?;
        self.read.acquire_with(timeout, poll_interval).map(ReadGuard)
    }

    /// Acquire the write lock.
    ///
    /// # Returns
    ///
    /// * `Err(LockError::UpgradeNotSupported)` - The caller holds the read lock
    /// * Otherwise as [`FileLock::acquire_with`]
    pub fn acquire_write(
        &self,
        timeout: Option<Duration>,
        poll_interval: Duration,
    ) -> Result<WriteGuard<'_>> {
        self.check_write()?;
        self.write.acquire_with(timeout, poll_interval).map(WriteGuard)
    }

    /// Release one level of the read lock held by the caller.
    pub fn release_read(&self, force: bool) -> Result<()> {
        self.read.release(force)
    }

    /// Release one level of the write lock held by the caller.
    pub fn release_write(&self, force: bool) -> Result<()> {
        self.write.release(force)
    }

    /// Whether concurrent readers are possible; false when readers degrade to
    /// exclusive locks.
    pub fn readers_share(&self) -> bool {
        self.read.supports_shared()
    }

    /// Path of the lock file.
    pub fn path(&self) -> &Path {
        self.read.path()
    }

    /// Whether any owner holds the read side of this instance.
    pub fn is_read_locked(&self) -> bool {
        self.read.is_locked()
    }

    /// Whether any owner holds the write side of this instance.
    pub fn is_write_locked(&self) -> bool {
        self.write.is_locked()
    }

    /// The shared sub-lock.
    pub fn read_lock(&self) -> &FileLock {
        &self.read
    }

    /// The exclusive sub-lock.
    pub fn write_lock(&self) -> &FileLock {
        &self.write
    }

    pub(crate) fn shared_side(&self) -> &Arc<FileLock> {
        &self.read
    }

    pub(crate) fn exclusive_side(&self) -> &Arc<FileLock> {
        &self.write
    }

    /// Refuse a read request from an owner that holds the write side.
    pub(crate) fn check_read(&self) -> Result<()> {
        if self.write.lock_counter() > 0 {
            return Err(LockError::DowngradeNotSupported {
                path: self.path().to_path_buf(),
            });
        }
        Ok(())
    }

    /// Refuse a write request from an owner that holds the read side.
    pub(crate) fn check_write(&self) -> Result<()> {
        if self.read.lock_counter() > 0 {
            return Err(LockError::UpgradeNotSupported {
                path: self.path().to_path_buf(),
            });
        }
        Ok(())
    }
}

/// Guard for one level of a held read lock.
#[must_use = "the read lock is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct ReadGuard<'a>(LockGuard<'a>);

impl ReadGuard<'_> {
    /// Manually release this level of the read lock.
    pub fn release(self) -> Result<()> {
        self.0.release()
    }

    /// Keep the read lock held without a guard.
    pub fn detach(self) {
        self.0.detach()
    }
}

/// Guard for one level of a held write lock.
#[must_use = "the write lock is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct WriteGuard<'a>(LockGuard<'a>);

impl WriteGuard<'_> {
    /// Manually release this level of the write lock.
    pub fn release(self) -> Result<()> {
        self.0.release()
    }

    /// Keep the write lock held without a guard.
    pub fn detach(self) {
        self.0.detach()
    }
}
