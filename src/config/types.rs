//! Configuration types and defaults for pathlock.
//!
//! This module defines the enums shared by the config file, the lock core
//! and the backends, plus the default value functions used by `LockConfig`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Locking mode of a single lock instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Single holder system-wide (default).
    #[default]
    Exclusive,
    /// Many concurrent holders, excluded only by an exclusive holder.
    Shared,
}

impl Mode {
    /// Get the lowercase name of this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Exclusive => "exclusive",
            Mode::Shared => "shared",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which locking backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Native OS locks where the platform has them, soft locks elsewhere.
    #[default]
    Auto,
    /// OS advisory locks (`flock` on Unix, `LockFileEx` on Windows).
    Native,
    /// Portable lock based on exclusive file creation. Exclusive only.
    Soft,
}

impl BackendKind {
    /// Resolve `Auto` to the concrete backend for this platform.
    pub fn resolve(self) -> BackendKind {
        match self {
            BackendKind::Auto if cfg!(any(unix, windows)) => BackendKind::Native,
            BackendKind::Auto => BackendKind::Soft,
            other => other,
        }
    }

    /// Get the lowercase name of this backend kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Auto => "auto",
            BackendKind::Native => "native",
            BackendKind::Soft => "soft",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scope of reentrancy tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Reentrancy {
    /// Each thread has its own depth; only the acquiring thread may release.
    #[default]
    PerThread,
    /// One depth for the whole instance; any thread may release.
    ///
    /// Use this with async runtimes whose tasks migrate between threads.
    Shared,
}

// Default value functions for serde
pub(crate) fn default_timeout_secs() -> f64 {
    -1.0
}
pub(crate) fn default_poll_interval_secs() -> f64 {
    0.05
}
pub(crate) fn default_file_mode() -> u32 {
    0o644
}
