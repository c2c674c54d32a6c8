//! LockConfig struct definition and default implementation.

use super::types::*;
use serde::{Deserialize, Serialize};

/// Configuration for a lock instance.
///
/// Unknown fields in the YAML are ignored for forward compatibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    // =========================================================================
    // Acquisition settings
    // =========================================================================
    /// Seconds to wait for the lock. Any negative value waits forever.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: f64,

    /// Seconds between acquisition attempts while the lock is busy.
    /// Zero retries immediately.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: f64,

    // =========================================================================
    // Lock settings
    // =========================================================================
    /// Exclusive or shared locking.
    #[serde(default)]
    pub mode: Mode,

    /// Backend used to hold the lock.
    #[serde(default)]
    pub backend: BackendKind,

    /// Permission bits for newly created lock files (Unix only).
    #[serde(default = "default_file_mode")]
    pub file_mode: u32,

    /// Whether reentrancy is tracked per thread or per instance.
    #[serde(default)]
    pub reentrancy: Reentrancy,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            poll_interval_secs: default_poll_interval_secs(),
            mode: Mode::default(),
            backend: BackendKind::default(),
            file_mode: default_file_mode(),
            reentrancy: Reentrancy::default(),
        }
    }
}
