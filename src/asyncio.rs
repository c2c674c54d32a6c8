//! Async acquisition on tokio.
//!
//! The async types drive the same poll loop as the blocking API; only the
//! wait between attempts changes, from `std::thread::sleep` to
//! `tokio::time::sleep`. Release stays synchronous.
//!
//! # Cancellation
//!
//! Dropping an acquire future cancels it. A successful backend attempt is
//! committed inside a synchronous step and wrapped in a guard before the
//! future next yields, so a cancelled acquire never leaves a handle behind.
//!
//! # Owners
//!
//! Tasks move between worker threads, so thread identity means nothing to an
//! async caller. [`AsyncFileLock::new`] and [`AsyncReadWriteLock::new`]
//! switch the wrapped lock to `Reentrancy::Shared`: the instance is the
//! owner, and tasks that must exclude each other use separate instances.
//! Guards remember the owner they acquired for and release that holding from
//! whichever thread drops them.

use crate::config::Reentrancy;
use crate::error::Result;
use crate::lock::{Acquisition, FileLock, Owner, Step};
use crate::rwlock::ReadWriteLock;
use log::warn;
use std::sync::Arc;
use std::time::Duration;

/// Drive the poll loop, yielding to the runtime between attempts.
///
/// Returns the owner the holding was recorded under.
async fn drive(lock: &FileLock, timeout: Option<Duration>, poll_interval: Duration) -> Result<Owner> {
    let mut acquisition = Acquisition::new(lock, timeout, poll_interval);
    loop {
        match acquisition.step()? {
            Step::Done(owner) => return Ok(owner),
            // A zero-length sleep may complete without yielding.
            Step::Wait(delay) if delay.is_zero() => tokio::task::yield_now().await,
            Step::Wait(delay) => tokio::time::sleep(delay).await,
        }
    }
}

/// Async front end for a [`FileLock`].
#[derive(Debug, Clone)]
pub struct AsyncFileLock {
    inner: Arc<FileLock>,
}

impl AsyncFileLock {
    /// Wrap a lock for async use, scoping reentrancy to the instance.
    pub fn new(lock: FileLock) -> Self {
        Self {
            inner: Arc::new(lock.with_reentrancy(Reentrancy::Shared)),
        }
    }

    /// Wrap a shared lock, e.g. one obtained from a `LockRegistry`.
    ///
    /// The lock keeps its reentrancy scope. Register async locks with
    /// `Reentrancy::Shared`; under `PerThread` a task that migrates between
    /// acquires waits on its own holding.
    pub fn from_arc(lock: Arc<FileLock>) -> Self {
        Self { inner: lock }
    }

    /// The wrapped lock.
    pub fn inner(&self) -> &Arc<FileLock> {
        &self.inner
    }

    /// Acquire with the lock's configured timeout and poll interval.
    pub async fn acquire(&self) -> Result<AsyncLockGuard> {
        self.acquire_with(self.inner.timeout(), self.inner.poll_interval())
            .await
    }

    /// Make a single attempt to acquire the lock.
    pub async fn try_acquire(&self) -> Result<AsyncLockGuard> {
        self.acquire_with(Some(Duration::ZERO), self.inner.poll_interval())
            .await
    }

    /// Acquire the lock, suspending the task between attempts.
    pub async fn acquire_with(
        &self,
        timeout: Option<Duration>,
        poll_interval: Duration,
    ) -> Result<AsyncLockGuard> {
        let owner = drive(&self.inner, timeout, poll_interval).await?;
        Ok(AsyncLockGuard::new(self.inner.clone(), owner))
    }

    /// Release one level of the lock held by the caller.
    pub fn release(&self, force: bool) -> Result<()> {
        self.inner.release(force)
    }

    /// Whether any owner currently holds the lock.
    pub fn is_locked(&self) -> bool {
        self.inner.is_locked()
    }
}

/// Async front end for a [`ReadWriteLock`].
#[derive(Debug, Clone)]
pub struct AsyncReadWriteLock {
    inner: Arc<ReadWriteLock>,
}

impl AsyncReadWriteLock {
    /// Wrap a readers/writer lock for async use, scoping reentrancy to the
    /// instance.
    pub fn new(lock: ReadWriteLock) -> Self {
        Self {
            inner: Arc::new(lock.with_reentrancy(Reentrancy::Shared)),
        }
    }

    /// The wrapped readers/writer lock.
    pub fn inner(&self) -> &Arc<ReadWriteLock> {
        &self.inner
    }

    /// Acquire the read lock with the configured timeout and poll interval.
    pub async fn read(&self) -> Result<AsyncLockGuard> {
        let side = self.inner.shared_side();
        self.acquire_read(side.timeout(), side.poll_interval()).await
    }

    /// Acquire the write lock with the configured timeout and poll interval.
    pub async fn write(&self) -> Result<AsyncLockGuard> {
        let side = self.inner.exclusive_side();
        self.acquire_write(side.timeout(), side.poll_interval()).await
    }

    /// Acquire the read lock; refused while the caller holds the write lock.
    pub async fn acquire_read(
        &self,
        timeout: Option<Duration>,
        poll_interval: Duration,
    ) -> Result<AsyncLockGuard> {
        self.inner.check_read()?;
        let side = self.inner.shared_side();
        let owner = drive(side, timeout, poll_interval).await?;
        Ok(AsyncLockGuard::new(side.clone(), owner))
    }

    /// Acquire the write lock; refused while the caller holds the read lock.
    pub async fn acquire_write(
        &self,
        timeout: Option<Duration>,
        poll_interval: Duration,
    ) -> Result<AsyncLockGuard> {
        self.inner.check_write()?;
        let side = self.inner.exclusive_side();
        let owner = drive(side, timeout, poll_interval).await?;
        Ok(AsyncLockGuard::new(side.clone(), owner))
    }
}

/// Owning RAII guard for one level of a lock acquired asynchronously.
#[must_use = "the lock is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct AsyncLockGuard {
    lock: Arc<FileLock>,
    owner: Owner,

    /// Whether the guard has been released or detached manually.
    released: bool,
}

impl AsyncLockGuard {
    fn new(lock: Arc<FileLock>, owner: Owner) -> Self {
        Self {
            lock,
            owner,
            released: false,
        }
    }

    /// The lock this guard belongs to.
    pub fn lock(&self) -> &FileLock {
        &self.lock
    }

    /// Manually release this level of the lock.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        self.lock.release_as(self.owner, false)
    }

    /// Keep the acquisition held without a guard.
    pub fn detach(mut self) {
        self.released = true;
    }
}

impl Drop for AsyncLockGuard {
    fn drop(&mut self) {
        if !self.released
            && let Err(e) = self.lock.release_as(self.owner, false)
        {
            warn!("failed to release async lock guard: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend;
    use crate::config::{BackendKind, Mode, Reentrancy};
    use crate::error::LockError;
    use crate::test_support::{CountingBackend, temp_lock_path};
    use std::path::Path;

    const POLL: Duration = Duration::from_millis(5);

    fn native_lock(path: &Path) -> FileLock {
        FileLock::with_backend(path, Mode::Exclusive, backend::select(BackendKind::Native, 0o644))
    }

    #[tokio::test]
    async fn test_acquire_and_release() {
        let (_temp_dir, path) = temp_lock_path("a.lock");
        let lock = AsyncFileLock::new(native_lock(&path));

        let guard = lock.acquire().await.unwrap();
        assert!(lock.is_locked());
        assert_eq!(guard.lock().lock_counter(), 1);

        let nested = lock.acquire().await.unwrap();
        assert_eq!(lock.inner().lock_counter(), 2);
        drop(nested);
        guard.release().unwrap();
        assert!(!lock.is_locked());
    }

    #[tokio::test]
    async fn test_timeout_against_held_lock() {
        let (_temp_dir, path) = temp_lock_path("a.lock");
        let holder = native_lock(&path);
        let _held = holder.acquire().unwrap();

        let contender = AsyncFileLock::new(native_lock(&path));
        let err = contender
            .acquire_with(Some(Duration::from_millis(30)), POLL)
            .await
            .unwrap_err();
        assert!(matches!(err, LockError::Timeout { .. }));
        assert!(!contender.is_locked());

        assert!(contender.try_acquire().await.is_err());
    }

    #[tokio::test]
    async fn test_waiting_task_does_not_block_runtime() {
        let (_temp_dir, path) = temp_lock_path("a.lock");
        let holder = AsyncFileLock::new(native_lock(&path));
        let guard = holder.acquire().await.unwrap();

        let contender = AsyncFileLock::new(native_lock(&path));
        let waiter = tokio::spawn(async move {
            let guard = contender
                .acquire_with(Some(Duration::from_secs(10)), POLL)
                .await
                .unwrap();
            assert!(guard.lock().is_locked());
        });

        // The current-thread runtime keeps running this task while the waiter polls.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());
        drop(guard);

        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_acquire_leaves_lock_unlocked() {
        let (_temp_dir, path) = temp_lock_path("a.lock");
        let holder = native_lock(&path);
        let held = holder.acquire().unwrap();

        let backend = CountingBackend::native();
        let contender = AsyncFileLock::new(FileLock::with_backend(
            &path,
            Mode::Exclusive,
            backend.clone(),
        ));

        let result = tokio::time::timeout(
            Duration::from_millis(40),
            contender.acquire_with(None, POLL),
        )
        .await;
        assert!(result.is_err(), "acquire should have been cancelled");
        assert!(!contender.is_locked());
        assert!(backend.attempts() >= 1);
        assert_eq!(backend.acquisitions(), 0);

        drop(held);
        let guard = contender.try_acquire().await.unwrap();
        drop(guard);
        assert_eq!(backend.releases(), 1);
    }

    #[tokio::test]
    async fn test_zero_poll_interval_yields() {
        let (_temp_dir, path) = temp_lock_path("a.lock");
        let holder = AsyncFileLock::new(native_lock(&path));
        let guard = holder.acquire().await.unwrap();

        let contender = AsyncFileLock::new(native_lock(&path));
        let waiter = tokio::spawn(async move {
            contender
                .acquire_with(Some(Duration::from_secs(10)), Duration::ZERO)
                .await
                .map(drop)
        });

        tokio::task::yield_now().await;
        drop(guard);
        waiter.await.unwrap().unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_shared_reentrancy_on_multi_thread_runtime() {
        let (_temp_dir, path) = temp_lock_path("a.lock");
        let lock = AsyncFileLock::new(native_lock(&path).with_reentrancy(Reentrancy::Shared));

        let guard = lock.acquire().await.unwrap();
        let other = lock.clone();
        tokio::spawn(async move {
            // Any worker thread counts as the same owner.
            let nested = other.acquire().await.unwrap();
            assert_eq!(nested.lock().lock_counter(), 2);
        })
        .await
        .unwrap();

        tokio::task::yield_now().await;
        guard.release().unwrap();
        assert!(!lock.is_locked());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_new_scopes_owner_to_instance() {
        let (_temp_dir, path) = temp_lock_path("a.lock");
        // Default PerThread lock; the wrapper rescopes it.
        let lock = AsyncFileLock::new(native_lock(&path));
        assert_eq!(lock.inner().reentrancy(), Reentrancy::Shared);

        let worker = lock.clone();
        let guard = tokio::spawn(async move { worker.acquire().await.unwrap() })
            .await
            .unwrap();
        drop(guard);

        assert!(!lock.is_locked());
        drop(lock.try_acquire().await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_guard_moved_across_threads_releases_per_thread_lock() {
        let (_temp_dir, path) = temp_lock_path("a.lock");
        let lock = AsyncFileLock::from_arc(Arc::new(native_lock(&path)));
        assert_eq!(lock.inner().reentrancy(), Reentrancy::PerThread);

        // Acquired on a worker thread, dropped on the test's own thread.
        let worker = lock.clone();
        let guard = tokio::spawn(async move { worker.acquire().await.unwrap() })
            .await
            .unwrap();
        drop(guard);

        assert!(!lock.is_locked());
        let again = lock
            .acquire_with(Some(Duration::from_millis(200)), POLL)
            .await
            .unwrap();
        again.release().unwrap();
    }

    #[tokio::test]
    async fn test_rw_new_scopes_owner_to_instance() {
        let (_temp_dir, path) = temp_lock_path("rw.lock");
        let rw = AsyncReadWriteLock::new(ReadWriteLock::with_backend(
            &path,
            backend::select(BackendKind::Native, 0o644),
        ));
        assert_eq!(rw.inner().read_lock().reentrancy(), Reentrancy::Shared);
        assert_eq!(rw.inner().write_lock().reentrancy(), Reentrancy::Shared);
    }

    #[tokio::test]
    async fn test_rw_upgrade_refused() {
        let (_temp_dir, path) = temp_lock_path("rw.lock");
        let rw = AsyncReadWriteLock::new(ReadWriteLock::with_backend(
            &path,
            backend::select(BackendKind::Native, 0o644),
        ));

        let read = rw.read().await.unwrap();
        let err = rw.acquire_write(None, POLL).await.unwrap_err();
        assert!(matches!(err, LockError::UpgradeNotSupported { .. }));
        drop(read);

        let write = rw.write().await.unwrap();
        let err = rw.acquire_read(None, POLL).await.unwrap_err();
        assert!(matches!(err, LockError::DowngradeNotSupported { .. }));
        write.release().unwrap();
        assert!(!rw.inner().is_write_locked());
    }

    #[tokio::test]
    async fn test_rw_readers_share() {
        let (_temp_dir, path) = temp_lock_path("rw.lock");
        let native = backend::select(BackendKind::Native, 0o644);
        let a = AsyncReadWriteLock::new(ReadWriteLock::with_backend(&path, native.clone()));
        let b = AsyncReadWriteLock::new(ReadWriteLock::with_backend(&path, native));

        let ra = a.read().await.unwrap();
        let rb = b.read().await.unwrap();
        let err = b
            .acquire_write(Some(Duration::ZERO), POLL)
            .await
            .unwrap_err();
        // b holds the read side, so this is an upgrade attempt.
        assert!(matches!(err, LockError::UpgradeNotSupported { .. }));
        drop(rb);

        let err = b
            .acquire_write(Some(Duration::ZERO), POLL)
            .await
            .unwrap_err();
        assert!(matches!(err, LockError::Timeout { .. }));
        drop(ra);
    }
}
