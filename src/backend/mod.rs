//! Locking backends.
//!
//! A backend makes exactly one non-blocking attempt to take an OS-level lock
//! on a path and knows how to give it back. All waiting, timeouts and
//! reentrancy live in [`crate::lock`]; a backend never sleeps.
//!
//! # Variants
//!
//! - [`NativeBackend`]: `flock`/`LockFileEx` through fs2, exclusive or shared.
//! - [`SoftBackend`]: exclusive file creation, for filesystems where native
//!   locks are missing or unreliable. Exclusive only; the lock file holds
//!   JSON [`LockMetadata`] describing the holder.
//!
//! The variant is picked once, when a lock is constructed, via [`select`].

mod metadata;
mod native;
mod soft;


use crate::config::{BackendKind, Mode};
use crate::error::{LockError, Result};
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

// Re-export public API
pub use metadata::LockMetadata;
pub use native::NativeBackend;
pub use soft::SoftBackend;

/// Outcome of a single non-blocking acquisition attempt.
#[derive(Debug)]
pub enum Attempt {
    /// The lock is now held through this handle.
    Acquired(LockHandle),
    /// Someone else holds the lock right now.
    WouldBlock,
}

/// An OS-held lock on a path.
///
/// Dropping a handle closes its file, which releases a native lock but
/// leaves a soft lock file behind; hand it to [`Backend::release`] instead.
#[derive(Debug)]
pub struct LockHandle {
    file: File,
    path: PathBuf,
    mode: Mode,
}

impl LockHandle {
    /// Wrap an open, locked file.
    pub fn new(file: File, path: impl Into<PathBuf>, mode: Mode) -> Self {
        Self {
            file,
            path: path.into(),
            mode,
        }
    }

    /// Path of the locked file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Mode the lock is actually held in.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub(crate) fn into_parts(self) -> (File, PathBuf) {
        (self.file, self.path)
    }
}

/// Capability contract shared by all backends.
pub trait Backend: Send + Sync + fmt::Debug {
    /// Which backend this is.
    fn kind(&self) -> BackendKind;

    /// Whether `Mode::Shared` gives real shared locking.
    ///
    /// When false, shared requests are served as exclusive locks.
    fn supports_shared(&self) -> bool;

    /// Make one non-blocking attempt to lock `path` in `mode`.
    ///
    /// # Returns
    ///
    /// * `Ok(Attempt::Acquired)` - The lock is held
    /// * `Ok(Attempt::WouldBlock)` - The lock is busy; try again later
    /// * `Err(_)` - Failure unrelated to contention; do not retry
    fn try_acquire(&self, path: &Path, mode: Mode) -> Result<Attempt>;

    /// Give the lock back. Cleanup failures are logged, never returned.
    fn release(&self, handle: LockHandle);
}

/// Build the backend for `kind`, resolving `Auto` for this platform.
pub fn select(kind: BackendKind, file_mode: u32) -> Arc<dyn Backend> {
    match kind.resolve() {
        BackendKind::Soft => Arc::new(SoftBackend::new(file_mode)),
        _ => Arc::new(NativeBackend::new(file_mode)),
    }
}

/// Create the parent directory of a lock file if it is missing.
fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| fatal(path, e))?;
    }
    Ok(())
}

/// Open options with the configured permission bits applied on creation.
fn open_options(file_mode: u32) -> OpenOptions {
    #[allow(unused_mut)]
    let mut options = OpenOptions::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(file_mode);
    }
    #[cfg(not(unix))]
    let _ = file_mode;
    options
}

/// Force the permission bits past the umask. A file owned by someone else
/// cannot be chmod-ed; that is not an error.
#[cfg(unix)]
fn apply_file_mode(file: &File, path: &Path, file_mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    match file.set_permissions(fs::Permissions::from_mode(file_mode)) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => Ok(()),
        Err(e) => Err(fatal(path, e)),
    }
}

#[cfg(not(unix))]
fn apply_file_mode(_file: &File, _path: &Path, _file_mode: u32) -> Result<()> {
    Ok(())
}

fn fatal(path: &Path, source: io::Error) -> LockError {
    LockError::BackendFatal {
        path: path.to_path_buf(),
        source,
    }
}
