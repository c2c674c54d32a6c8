//! RAII lock guard implementation.

use super::{FileLock, Owner};
use crate::error::Result;
use log::warn;

/// RAII guard for one level of a held [`FileLock`].
///
/// When dropped, the lock depth is decremented and the OS lock is released
/// once the depth reaches zero. If release fails (for example after a forced
/// release), a warning is logged but no panic occurs.
///
/// The guard remembers the owner it acquired for, so it may be dropped on
/// any thread.
///
/// After a forced [`FileLock::release`] the guard still releases one level
/// on drop. If its owner has acquired the lock again in the meantime, that
/// level comes out of the newer acquisition; call [`LockGuard::detach`] on
/// guards that a forced release has already covered.
#[must_use = "the lock is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct LockGuard<'a> {
    lock: &'a FileLock,
    owner: Owner,

    /// Whether the guard has been released or detached manually.
    released: bool,
}

impl<'a> LockGuard<'a> {
    pub(super) fn new(lock: &'a FileLock, owner: Owner) -> Self {
        Self {
            lock,
            owner,
            released: false,
        }
    }

    /// The lock this guard belongs to.
    pub fn lock(&self) -> &'a FileLock {
        self.lock
    }

    /// Manually release this level of the lock.
    ///
    /// Useful when the caller wants to handle release errors explicitly.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        self.lock.release_as(self.owner, false)
    }

    /// Keep the acquisition held without a guard.
    ///
    /// The caller becomes responsible for a matching [`FileLock::release`].
    pub fn detach(mut self) {
        self.released = true;
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        if !self.released
            && let Err(e) = self.lock.release_as(self.owner, false)
        {
            warn!("failed to release lock guard: {}", e);
        }
    }
}
