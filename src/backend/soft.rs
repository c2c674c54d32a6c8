//! Portable lock based on exclusive file creation.
//!
//! The existence of the lock file is the lock. Creation uses `create_new`
//! semantics, so only one process can succeed; the file is deleted again on
//! release. There is no shared mode: every holder excludes every other.
//!
//! A process that dies while holding a soft lock leaves the file behind.
//! The JSON metadata inside lets a human (or `pathlock status`) tell who
//! created it and when.

use super::metadata::LockMetadata;
use super::{Attempt, Backend, LockHandle, apply_file_mode, ensure_parent_dir, fatal, open_options};
use crate::config::{BackendKind, Mode};
use crate::error::Result;
use log::{debug, trace};
use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Backend that locks by creating the lock file exclusively.
#[derive(Debug, Clone)]
pub struct SoftBackend {
    file_mode: u32,
}

impl SoftBackend {
    /// Create a soft backend that creates lock files with `file_mode`.
    pub fn new(file_mode: u32) -> Self {
        Self { file_mode }
    }
}

impl Backend for SoftBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Soft
    }

    fn supports_shared(&self) -> bool {
        false
    }

    fn try_acquire(&self, path: &Path, mode: Mode) -> Result<Attempt> {
        ensure_parent_dir(path)?;

        let mut file = match open_options(self.file_mode)
            .write(true)
            .create_new(true)
            .open(path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                trace!("soft lock '{}' already exists", path.display());
                return Ok(Attempt::WouldBlock);
            }
            // Windows denies the create while the previous holder is deleting it.
            #[cfg(windows)]
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                return Ok(Attempt::WouldBlock);
            }
            Err(e) => return Err(fatal(path, e)),
        };

        let written = apply_file_mode(&file, path, self.file_mode).and_then(|()| {
            let json = LockMetadata::new(mode)
                .to_json()
                .map_err(|e| fatal(path, e.into()))?;
            file.write_all(json.as_bytes())
                .and_then(|()| file.sync_all())
                .map_err(|e| fatal(path, e))
        });
        if let Err(e) = written {
            // Clean up so the half-written file does not look held.
            drop(file);
            let _ = fs::remove_file(path);
            return Err(e);
        }

        Ok(Attempt::Acquired(LockHandle::new(file, path, Mode::Exclusive)))
    }

    fn release(&self, handle: LockHandle) {
        let (file, path) = handle.into_parts();
        drop(file);

        // The file may already be gone if the lock was cleared by hand.
        if let Err(e) = fs::remove_file(&path) {
            debug!("soft lock '{}' not removed: {}", path.display(), e);
        }
    }
}
