//! Native OS advisory locks via fs2.
//!
//! `flock` on Unix and `LockFileEx` on Windows. Locks belong to the open
//! file description, so two handles on the same path conflict even inside
//! one process.

use super::{Attempt, Backend, LockHandle, apply_file_mode, ensure_parent_dir, fatal, open_options};
use crate::config::{BackendKind, Mode};
use crate::error::{LockError, Result};
use fs2::FileExt;
use log::{trace, warn};
use std::io;
use std::path::Path;

/// Backend using native exclusive and shared OS locks.
#[derive(Debug, Clone)]
pub struct NativeBackend {
    file_mode: u32,
}

impl NativeBackend {
    /// Create a native backend that creates lock files with `file_mode`.
    pub fn new(file_mode: u32) -> Self {
        Self { file_mode }
    }
}

impl Backend for NativeBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Native
    }

    fn supports_shared(&self) -> bool {
        true
    }

    fn try_acquire(&self, path: &Path, mode: Mode) -> Result<Attempt> {
        ensure_parent_dir(path)?;

        let file = match open_options(self.file_mode)
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
        {
            Ok(file) => file,
            // Windows denies the open while another holder is deleting the file.
            #[cfg(windows)]
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                return Ok(Attempt::WouldBlock);
            }
            Err(e) => return Err(fatal(path, e)),
        };
        apply_file_mode(&file, path, self.file_mode)?;

        // Fully qualified: std::fs::File has inherent methods with the same names.
        let locked = match mode {
            Mode::Exclusive => FileExt::try_lock_exclusive(&file),
            Mode::Shared => FileExt::try_lock_shared(&file),
        };

        match locked {
            Ok(()) => Ok(Attempt::Acquired(LockHandle::new(file, path, mode))),
            Err(e) if is_contended(&e) => {
                trace!("{} lock on '{}' is busy", mode, path.display());
                Ok(Attempt::WouldBlock)
            }
            Err(e) if e.kind() == io::ErrorKind::Unsupported => Err(LockError::Unsupported {
                path: path.to_path_buf(),
                reason: format!("{}; use the soft backend instead", e),
            }),
            Err(e) => Err(fatal(path, e)),
        }
    }

    fn release(&self, handle: LockHandle) {
        let (file, path) = handle.into_parts();
        if let Err(e) = FileExt::unlock(&file) {
            warn!("failed to unlock '{}': {}", path.display(), e);
        }
        drop(file);

        // Windows keeps no stale file behind; another holder may already own it.
        #[cfg(windows)]
        let _ = std::fs::remove_file(&path);
    }
}

fn is_contended(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::WouldBlock
        || e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}
