//! The reentrant lock core.
//!
//! A [`FileLock`] binds a path, a [`Mode`] and a [`Backend`]. It keeps one
//! holding per owner (a thread, or the whole instance under
//! `Reentrancy::Shared`) with a reentrancy depth:
//!
//! - the OS lock is taken only on the 0 → 1 transition of a depth
//! - it is released only on the 1 → 0 transition
//! - a nested acquire by the owner never calls the backend
//!
//! Other threads go through the backend like any other process would, so
//! they block or poll until the owner lets go.
//!
//! # Acquisition
//!
//! Acquisition is a poll loop bounded by a timeout. The poll loop itself is
//! in [`acquisition`]; this module drives it with `std::thread::sleep`, and
//! [`crate::asyncio`] drives the same loop with tokio timers.

mod acquisition;
mod guard;
mod types;


use crate::backend::{self, Backend, LockHandle};
use crate::config::{BackendKind, LockConfig, Mode, Reentrancy};
use crate::error::{LockError, Result};
use log::{debug, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

pub(crate) use acquisition::{Acquisition, Step};
pub use guard::LockGuard;
pub(crate) use types::Owner;
use types::Holding;

/// A reentrant, cross-process lock on a filesystem path.
#[derive(Debug)]
pub struct FileLock {
    path: PathBuf,
    mode: Mode,
    reentrancy: Reentrancy,
    timeout: Option<Duration>,
    poll_interval: Duration,
    backend: Arc<dyn Backend>,
    holdings: Mutex<HashMap<Owner, Holding>>,
}

impl FileLock {
    /// Create an exclusive lock on `path` with the default configuration.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let config = LockConfig::default();
        let backend = backend::select(config.backend, config.file_mode);
        Self::from_parts(path.into(), &config, backend)
    }

    /// Create a lock on `path` from a validated configuration.
    pub fn with_config(path: impl Into<PathBuf>, config: &LockConfig) -> Result<Self> {
        config.validate()?;
        let backend = backend::select(config.backend, config.file_mode);
        Ok(Self::from_parts(path.into(), config, backend))
    }

    /// Create a lock on `path` that uses a specific backend.
    pub fn with_backend(path: impl Into<PathBuf>, mode: Mode, backend: Arc<dyn Backend>) -> Self {
        let config = LockConfig {
            mode,
            ..LockConfig::default()
        };
        Self::from_parts(path.into(), &config, backend)
    }

    fn from_parts(path: PathBuf, config: &LockConfig, backend: Arc<dyn Backend>) -> Self {
        if config.mode == Mode::Shared && !backend.supports_shared() {
            warn!(
                "{} backend has no shared locks; '{}' will be locked exclusively",
                backend.kind(),
                path.display()
            );
        }

        Self {
            path,
            mode: config.mode,
            reentrancy: config.reentrancy,
            timeout: config.timeout(),
            poll_interval: config.poll_interval(),
            backend,
            holdings: Mutex::new(HashMap::new()),
        }
    }

    /// Set the default acquisition timeout (`None` waits forever).
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the default delay between acquisition attempts.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Set the reentrancy scope.
    pub fn with_reentrancy(mut self, reentrancy: Reentrancy) -> Self {
        self.reentrancy = reentrancy;
        self
    }

    // =========================================================================
    // Acquire / release
    // =========================================================================

    /// Acquire the lock with the configured timeout and poll interval.
    pub fn acquire(&self) -> Result<LockGuard<'_>> {
        self.acquire_with(self.timeout, self.poll_interval)
    }

    /// Make a single attempt to acquire the lock.
    ///
    /// Fails with `LockError::Timeout` if the lock is held elsewhere.
    pub fn try_acquire(&self) -> Result<LockGuard<'_>> {
        self.acquire_with(Some(Duration::ZERO), self.poll_interval)
    }

    /// Acquire the lock, blocking the calling thread between attempts.
    ///
    /// # Arguments
    ///
    /// * `timeout` - Maximum time to wait; `None` waits forever
    /// * `poll_interval` - Delay between attempts; zero busy-polls
    ///
    /// # Returns
    ///
    /// * `Ok(LockGuard)` - The lock is held (possibly re-entered)
    /// * `Err(LockError::PermissionDenied | IsADirectory)` - The path is unusable
    /// * `Err(LockError::Timeout)` - The lock stayed busy for `timeout`
    /// * `Err(LockError::BackendFatal | Unsupported)` - The backend failed
    pub fn acquire_with(
        &self,
        timeout: Option<Duration>,
        poll_interval: Duration,
    ) -> Result<LockGuard<'_>> {
        let mut acquisition = Acquisition::new(self, timeout, poll_interval);
        loop {
            match acquisition.step()? {
                Step::Done(owner) => return Ok(LockGuard::new(self, owner)),
                Step::Wait(delay) => thread::sleep(delay),
            }
        }
    }

    /// Release one level of the lock held by the calling owner.
    ///
    /// With `force`, drops every level at once. The OS lock is released when
    /// the depth reaches zero. A forced release of an unheld lock is a no-op,
    /// so cleanup paths can call it unconditionally.
    ///
    /// Guards outstanding at a forced release still release one level each
    /// when dropped. If the owner has re-acquired by then, that drop takes a
    /// level from the new acquisition.
    ///
    /// # Returns
    ///
    /// * `Err(LockError::NotLocked)` - Nobody holds this lock (non-forced only)
    /// * `Err(LockError::WrongOwner)` - Another thread holds it
    pub fn release(&self, force: bool) -> Result<()> {
        self.release_as(self.owner(), force)
    }

    /// Release one level held by `owner`, whichever thread calls.
    pub(crate) fn release_as(&self, owner: Owner, force: bool) -> Result<()> {
        let mut holdings = self.holdings();
        let empty = holdings.is_empty();

        let depth = match holdings.get_mut(&owner) {
            Some(holding) => {
                holding.depth = if force { 0 } else { holding.depth - 1 };
                holding.depth
            }
            None if empty && force => return Ok(()),
            None if empty => {
                return Err(LockError::NotLocked {
                    path: self.path.clone(),
                });
            }
            None => {
                return Err(LockError::WrongOwner {
                    path: self.path.clone(),
                });
            }
        };

        if depth == 0
            && let Some(holding) = holdings.remove(&owner)
        {
            self.backend.release(holding.handle);
            debug!("released lock on '{}'", self.path.display());
        }

        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Path of the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Requested locking mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Mode the lock is actually held in, after backend degradation.
    pub fn effective_mode(&self) -> Mode {
        if self.mode == Mode::Shared && !self.supports_shared() {
            Mode::Exclusive
        } else {
            self.mode
        }
    }

    /// Whether the backend provides real shared locks.
    pub fn supports_shared(&self) -> bool {
        self.backend.supports_shared()
    }

    /// Which backend holds the lock.
    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// Reentrancy scope of this lock.
    pub fn reentrancy(&self) -> Reentrancy {
        self.reentrancy
    }

    /// Default acquisition timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Default delay between acquisition attempts.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Whether any owner currently holds this lock instance.
    pub fn is_locked(&self) -> bool {
        !self.holdings().is_empty()
    }

    /// Reentrancy depth of the calling owner; zero when it does not hold the lock.
    pub fn lock_counter(&self) -> usize {
        self.holdings()
            .get(&self.owner())
            .map_or(0, |holding| holding.depth)
    }

    // =========================================================================
    // Bookkeeping used by the acquisition loop
    // =========================================================================

    fn owner(&self) -> Owner {
        Owner::current(self.reentrancy)
    }

    fn holdings(&self) -> MutexGuard<'_, HashMap<Owner, Holding>> {
        // A panic while holding the mutex leaves the map consistent.
        self.holdings
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }

    /// Increment the owner's depth if it already holds the lock.
    fn reenter(&self, owner: Owner) -> Option<usize> {
        self.holdings().get_mut(&owner).map(|holding| {
            holding.depth += 1;
            holding.depth
        })
    }

    /// Record a freshly acquired handle for `owner`.
    fn bind(&self, owner: Owner, handle: LockHandle) {
        let mut holdings = self.holdings();
        match holdings.get_mut(&owner) {
            // Two threads sharing an owner raced through the backend; keep one handle.
            Some(holding) => {
                holding.depth += 1;
                self.backend.release(handle);
            }
            None => {
                holdings.insert(owner, Holding { handle, depth: 1 });
            }
        }
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let holdings = std::mem::take(
            self.holdings
                .get_mut()
                .unwrap_or_else(|poison| poison.into_inner()),
        );
        for (_, holding) in holdings {
            debug!("releasing '{}' on drop", self.path.display());
            self.backend.release(holding.handle);
        }
    }
}
