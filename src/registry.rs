//! Process-wide identity cache for locks.
//!
//! Two `FileLock`s built separately on the same path are independent: the
//! second one blocks on the first like another process would. Code that
//! wants repeated lookups of one path to share reentrancy state asks a
//! [`LockRegistry`] instead of constructing locks directly.
//!
//! The registry holds weak references only. An entry dies with the last
//! `Arc` handed out; dropping that `Arc` releases whatever the lock still
//! held, so a dead entry always has depth zero.

use crate::config::LockConfig;
use crate::error::{LockError, Result};
use crate::lock::FileLock;
use log::debug;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, Weak};

static GLOBAL: LazyLock<LockRegistry> = LazyLock::new(LockRegistry::new);

/// Map from canonical lock path to the live lock instance for that path.
#[derive(Debug, Default)]
pub struct LockRegistry {
    entries: Mutex<HashMap<PathBuf, Weak<FileLock>>>,
}

impl LockRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared process-wide registry.
    pub fn global() -> &'static LockRegistry {
        &GLOBAL
    }

    /// Get the live lock for `path`, or create one from `config`.
    ///
    /// # Returns
    ///
    /// * `Ok(Arc<FileLock>)` - The shared instance for this path
    /// * `Err(LockError::RegistryConflict)` - A live instance exists with a
    ///   different mode, backend or reentrancy scope
    /// * `Err(LockError::Config)` - `config` is invalid
    pub fn get_or_create(&self, path: impl AsRef<Path>, config: &LockConfig) -> Result<Arc<FileLock>> {
        let key = canonical_key(path.as_ref());
        let mut entries = self.entries();

        if let Some(existing) = entries.get(&key).and_then(Weak::upgrade) {
            check_compatible(&existing, config)?;
            return Ok(existing);
        }

        let lock = Arc::new(FileLock::with_config(key.clone(), config)?);
        debug!("registered lock '{}'", key.display());
        entries.insert(key, Arc::downgrade(&lock));
        Ok(lock)
    }

    /// Look up the live lock for `path` without creating one.
    pub fn get(&self, path: impl AsRef<Path>) -> Option<Arc<FileLock>> {
        let key = canonical_key(path.as_ref());
        self.entries().get(&key).and_then(Weak::upgrade)
    }

    /// Drop entries whose lock instances are gone. Returns how many were removed.
    pub fn prune(&self) -> usize {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|_, weak| weak.strong_count() > 0);
        before - entries.len()
    }

    /// Number of entries, including dead ones not yet pruned.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// Whether the registry has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<PathBuf, Weak<FileLock>>> {
        self.entries
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}

fn check_compatible(existing: &FileLock, config: &LockConfig) -> Result<()> {
    let mut mismatches = Vec::new();
    if existing.mode() != config.mode {
        mismatches.push(format!("mode {} != {}", existing.mode(), config.mode));
    }
    if existing.backend_kind() != config.backend.resolve() {
        mismatches.push(format!(
            "backend {} != {}",
            existing.backend_kind(),
            config.backend.resolve()
        ));
    }
    if existing.reentrancy() != config.reentrancy {
        mismatches.push(format!(
            "reentrancy {:?} != {:?}",
            existing.reentrancy(),
            config.reentrancy
        ));
    }

    if mismatches.is_empty() {
        Ok(())
    } else {
        Err(LockError::RegistryConflict {
            path: existing.path().to_path_buf(),
            reason: mismatches.join(", "),
        })
    }
}

/// Canonical form of a lock path that may not exist yet.
///
/// The parent directory is resolved through symlinks when it exists; the
/// file name is kept as given.
fn canonical_key(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    match (absolute.parent(), absolute.file_name()) {
        (Some(parent), Some(name)) => match parent.canonicalize() {
            Ok(parent) => parent.join(name),
            Err(_) => absolute,
        },
        _ => absolute,
    }
}
