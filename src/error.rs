//! Error types for pathlock.
//!
//! Uses thiserror for derive macros. Every variant carries the lock path so
//! messages stay actionable when several locks are in play.

use crate::exit_codes;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Broad category of a [`LockError`].
///
/// Callers that retry on their own should only retry `Contention`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The path can never be locked (permissions, wrong file type).
    Unactionable,
    /// The lock is held elsewhere and the wait budget ran out.
    Contention,
    /// The environment failed (I/O error, unsupported filesystem).
    Fatal,
    /// The caller broke the acquire/release protocol.
    Misuse,
    /// Invalid configuration.
    Config,
}

/// Main error type for lock operations.
#[derive(Error, Debug)]
pub enum LockError {
    /// The lock file exists but is not writable by the current user.
    #[error("permission denied: '{}'", .path.display())]
    PermissionDenied { path: PathBuf },

    /// The lock path points at a directory.
    #[error("is a directory: '{}'", .path.display())]
    IsADirectory { path: PathBuf },

    /// The lock stayed busy for the whole timeout.
    #[error("timed out after {:.3}s waiting for lock '{}'", .waited.as_secs_f64(), .path.display())]
    Timeout { path: PathBuf, waited: Duration },

    /// The backend hit an OS error unrelated to contention.
    #[error("failed to lock '{}': {source}", .path.display())]
    BackendFatal {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The filesystem cannot provide the requested locking primitive.
    #[error("locking not supported for '{}': {reason}", .path.display())]
    Unsupported { path: PathBuf, reason: String },

    /// Release was called while the lock is not held.
    #[error("lock '{}' is not held", .path.display())]
    NotLocked { path: PathBuf },

    /// Release was called from a thread that does not own the lock.
    #[error("lock '{}' is held by another thread", .path.display())]
    WrongOwner { path: PathBuf },

    /// A write lock was requested while the same owner holds the read lock.
    #[error("cannot upgrade read lock to write lock on '{}'; release the read lock first", .path.display())]
    UpgradeNotSupported { path: PathBuf },

    /// A read lock was requested while the same owner holds the write lock.
    #[error("cannot take read lock on '{}' while holding its write lock", .path.display())]
    DowngradeNotSupported { path: PathBuf },

    /// The registry already holds an instance with different parameters.
    #[error("lock '{}' already registered with different settings: {reason}", .path.display())]
    RegistryConflict { path: PathBuf, reason: String },

    /// Invalid configuration value or unreadable config file.
    #[error("config error: {0}")]
    Config(String),
}

impl LockError {
    /// Returns the category of this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            LockError::PermissionDenied { .. } | LockError::IsADirectory { .. } => {
                ErrorClass::Unactionable
            }
            LockError::Timeout { .. } => ErrorClass::Contention,
            LockError::BackendFatal { .. } | LockError::Unsupported { .. } => ErrorClass::Fatal,
            LockError::NotLocked { .. }
            | LockError::WrongOwner { .. }
            | LockError::UpgradeNotSupported { .. }
            | LockError::DowngradeNotSupported { .. }
            | LockError::RegistryConflict { .. } => ErrorClass::Misuse,
            LockError::Config(_) => ErrorClass::Config,
        }
    }

    /// Returns the CLI exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self.class() {
            ErrorClass::Unactionable => exit_codes::UNUSABLE_PATH,
            ErrorClass::Contention => exit_codes::TIMEOUT,
            ErrorClass::Fatal => exit_codes::BACKEND_FAILURE,
            ErrorClass::Misuse => exit_codes::PROTOCOL_MISUSE,
            ErrorClass::Config => exit_codes::USER_ERROR,
        }
    }

    /// Whether another attempt could succeed later.
    pub fn is_retryable(&self) -> bool {
        self.class() == ErrorClass::Contention
    }
}

/// Result type alias for lock operations.
pub type Result<T> = std::result::Result<T, LockError>;
