//! Holder record written into soft lock files.
//!
//! The record is informational: the soft lock is the file's existence, not
//! its content, so a missing or garbled record never affects acquisition.

use crate::config::Mode;
use crate::error::{LockError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Who holds a soft lock, and since when.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockMetadata {
    /// `user@host` of the holder.
    pub owner: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,

    /// Acquisition time (RFC3339 on disk).
    pub created_at: DateTime<Utc>,

    pub mode: Mode,
}

impl LockMetadata {
    /// Record for the current process.
    pub fn new(mode: Mode) -> Self {
        Self {
            owner: get_owner_string(),
            pid: Some(std::process::id()),
            created_at: Utc::now(),
            mode,
        }
    }

    /// Read the record of a held soft lock.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let fatal = |source: std::io::Error| LockError::BackendFatal {
            path: path.to_path_buf(),
            source,
        };

        let content = std::fs::read_to_string(path).map_err(fatal)?;
        serde_json::from_str(&content).map_err(|e| fatal(e.into()))
    }

    /// Serialize the record as it is written into the lock file.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Time since the lock was taken; negative if the holder's clock is ahead.
    pub fn age(&self) -> Duration {
        Utc::now().signed_duration_since(self.created_at)
    }

    /// Age in its two largest units, e.g. `3d 4h`, `2h 10m`, `5m`, `12s`.
    pub fn age_string(&self) -> String {
        let age = self.age();
        match (age.num_days(), age.num_hours(), age.num_minutes()) {
            (days, hours, _) if days > 0 => format!("{}d {}h", days, hours % 24),
            (_, hours, minutes) if hours > 0 => format!("{}h {}m", hours, minutes % 60),
            (_, _, minutes) if minutes > 0 => format!("{}m", minutes),
            _ => format!("{}s", age.num_seconds()),
        }
    }
}

/// `user@host` for the current process, with `unknown` for missing parts.
pub(crate) fn get_owner_string() -> String {
    let user = ["USER", "USERNAME"]
        .iter()
        .find_map(|var| std::env::var(var).ok())
        .unwrap_or_else(|| "unknown".to_string());
    let host = hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string());

    format!("{}@{}", user, host)
}
