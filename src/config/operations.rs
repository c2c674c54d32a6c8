//! Config loading, validation, and conversion operations.

use super::model::LockConfig;
use super::types::{BackendKind, Mode};
use crate::error::{LockError, Result};
use std::path::Path;
use std::time::Duration;

impl LockConfig {
    /// Load config from a YAML file.
    ///
    /// # Returns
    ///
    /// * `Ok(LockConfig)` - Successfully loaded and validated config
    /// * `Err(LockError::Config)` - Read error, parse error or validation failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            LockError::Config(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: LockConfig = serde_yaml::from_str(yaml)
            .map_err(|e| LockError::Config(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| LockError::Config(format!("failed to serialize config to YAML: {}", e)))
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `timeout_secs` must be finite
    /// - `poll_interval_secs` must be finite and non-negative
    /// - `file_mode` must fit in the permission bits (`<= 0o7777`)
    pub fn validate(&self) -> Result<()> {
        if !self.timeout_secs.is_finite() {
            return Err(LockError::Config(
                "config validation failed: timeout_secs must be a finite number".to_string(),
            ));
        }

        if !self.poll_interval_secs.is_finite() || self.poll_interval_secs < 0.0 {
            return Err(LockError::Config(format!(
                "config validation failed: poll_interval_secs must be >= 0 (found {})",
                self.poll_interval_secs
            )));
        }

        if self.file_mode > 0o7777 {
            return Err(LockError::Config(format!(
                "config validation failed: file_mode {:#o} exceeds 0o7777",
                self.file_mode
            )));
        }

        Ok(())
    }

    /// The acquisition timeout, or `None` to wait forever.
    pub fn timeout(&self) -> Option<Duration> {
        timeout_from_secs(self.timeout_secs)
    }

    /// The delay between acquisition attempts.
    pub fn poll_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.poll_interval_secs).unwrap_or_default()
    }

    /// Copy of this config with a different mode.
    pub fn with_mode(&self, mode: Mode) -> Self {
        Self {
            mode,
            ..self.clone()
        }
    }

    /// Copy of this config with a different backend.
    pub fn with_backend(&self, backend: BackendKind) -> Self {
        Self {
            backend,
            ..self.clone()
        }
    }
}

/// Convert a timeout in seconds to a `Duration`.
///
/// Negative values mean "wait forever" and map to `None`.
pub fn timeout_from_secs(secs: f64) -> Option<Duration> {
    if secs < 0.0 {
        None
    } else {
        Duration::try_from_secs_f64(secs).ok()
    }
}
