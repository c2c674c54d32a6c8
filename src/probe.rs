//! Fail-fast check for lock paths that can never be acquired.
//!
//! Separates "this file will never be writable" from "this file is writable
//! but currently locked", so the poll loop does not spin on a permission
//! problem until the timeout expires.

use crate::error::{LockError, Result};
use std::fs;
use std::path::Path;
use std::time::SystemTime;

/// Check whether acquiring a lock on `path` would definitely fail.
///
/// Performs a single `stat` and never touches the file. A missing path or a
/// failing `stat` is reported as `Ok(())`; the real open will surface the
/// error if there is one.
///
/// # Returns
///
/// * `Ok(())` - Acquisition may succeed
/// * `Err(LockError::PermissionDenied)` - The file exists and is not writable
/// * `Err(LockError::IsADirectory)` - The path is a directory (Windows reports
///   `PermissionDenied` here, matching its native open failure)
pub fn check_would_fail(path: &Path) -> Result<()> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(_) => return Ok(()),
    };

    // A zero mtime marks a bogus stat result on some filesystems.
    if metadata.modified().ok() == Some(SystemTime::UNIX_EPOCH) {
        return Ok(());
    }

    if !owner_writable(&metadata) {
        return Err(LockError::PermissionDenied {
            path: path.to_path_buf(),
        });
    }

    if metadata.is_dir() {
        if cfg!(windows) {
            return Err(LockError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        return Err(LockError::IsADirectory {
            path: path.to_path_buf(),
        });
    }

    Ok(())
}

#[cfg(unix)]
fn owner_writable(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o200 != 0
}

#[cfg(not(unix))]
fn owner_writable(metadata: &fs::Metadata) -> bool {
    !metadata.permissions().readonly()
}
