//! pathlock: reentrant cross-process file locks.
//!
//! A [`FileLock`] coordinates threads and processes through a path on disk.
//! It prefers native OS locks (exclusive or shared) and falls back to a
//! "soft" lock, the atomic creation of the file itself, where native locks
//! are unavailable. Acquisition polls with a timeout and is reentrant per
//! owner.
//!
//! On top of the core:
//! - [`ReadWriteLock`] pairs a shared and an exclusive lock on one path
//! - [`LockRegistry`] hands out one instance per canonical path
//! - [`AsyncFileLock`] drives the same poll loop on tokio

pub mod asyncio;
pub mod backend;
pub mod config;
pub mod error;
pub mod exit_codes;
pub mod lock;
pub mod probe;
pub mod registry;
pub mod rwlock;

#[cfg(test)]
mod test_support;

pub use asyncio::{AsyncFileLock, AsyncLockGuard, AsyncReadWriteLock};
pub use backend::{Backend, LockMetadata};
pub use config::{BackendKind, LockConfig, Mode, Reentrancy};
pub use error::{ErrorClass, LockError, Result};
pub use lock::{FileLock, LockGuard};
pub use registry::LockRegistry;
pub use rwlock::{ReadGuard, ReadWriteLock, WriteGuard};
