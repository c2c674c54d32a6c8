use crate::backend::{Attempt, Backend, LockHandle, NativeBackend, SoftBackend};
use crate::config::{BackendKind, Mode};
use crate::error::{LockError, Result};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard};
use tempfile::TempDir;

static CWD_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

pub(crate) struct DirGuard {
    original: PathBuf,
    _lock: MutexGuard<'static, ()>,
}

impl DirGuard {
    pub(crate) fn new(new_dir: &Path) -> Self {
        // Changing the process current working directory is global and not thread-safe.
        // Lock it so tests don't race even if a #[serial] annotation is missed.
        let lock = CWD_LOCK.lock().unwrap_or_else(|poison| poison.into_inner());
        let original = std::env::current_dir().unwrap();
        std::env::set_current_dir(new_dir).unwrap();
        Self {
            original,
            _lock: lock,
        }
    }
}

impl Drop for DirGuard {
    fn drop(&mut self) {
        let _ = std::env::set_current_dir(&self.original);
    }
}

/// A temp directory plus a lock path inside it.
pub(crate) fn temp_lock_path(name: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join(name);
    (temp_dir, path)
}

/// Backend wrapper that counts calls into the wrapped backend.
#[derive(Debug)]
pub(crate) struct CountingBackend {
    inner: Box<dyn Backend>,
    attempts: AtomicUsize,
    acquisitions: AtomicUsize,
    releases: AtomicUsize,
}

impl CountingBackend {
    pub(crate) fn native() -> Arc<Self> {
        Arc::new(Self::wrap(Box::new(NativeBackend::new(0o644))))
    }

    pub(crate) fn soft() -> Arc<Self> {
        Arc::new(Self::wrap(Box::new(SoftBackend::new(0o644))))
    }

    fn wrap(inner: Box<dyn Backend>) -> Self {
        Self {
            inner,
            attempts: AtomicUsize::new(0),
            acquisitions: AtomicUsize::new(0),
            releases: AtomicUsize::new(0),
        }
    }

    /// Calls to `try_acquire`, successful or not.
    pub(crate) fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Calls to `try_acquire` that returned a handle.
    pub(crate) fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }

    /// Calls to `release`.
    pub(crate) fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

impl Backend for CountingBackend {
    fn kind(&self) -> BackendKind {
        self.inner.kind()
    }

    fn supports_shared(&self) -> bool {
        self.inner.supports_shared()
    }

    fn try_acquire(&self, path: &Path, mode: Mode) -> Result<Attempt> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let attempt = self.inner.try_acquire(path, mode)?;
        if matches!(attempt, Attempt::Acquired(_)) {
            self.acquisitions.fetch_add(1, Ordering::SeqCst);
        }
        Ok(attempt)
    }

    fn release(&self, handle: LockHandle) {
        self.releases.fetch_add(1, Ordering::SeqCst);
        self.inner.release(handle);
    }
}

/// Backend whose every attempt fails with an I/O error.
#[derive(Debug, Default)]
pub(crate) struct FailingBackend {
    attempts: AtomicUsize,
}

impl FailingBackend {
    pub(crate) fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Backend for FailingBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Native
    }

    fn supports_shared(&self) -> bool {
        true
    }

    fn try_acquire(&self, path: &Path, _mode: Mode) -> Result<Attempt> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(LockError::BackendFatal {
            path: path.to_path_buf(),
            source: io::Error::other("disk on fire"),
        })
    }

    fn release(&self, _handle: LockHandle) {}
}
