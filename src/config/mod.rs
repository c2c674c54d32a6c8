//! Configuration model for pathlock.
//!
//! This module defines the `LockConfig` struct, which can be loaded from a
//! YAML file or built in code. Unknown fields are ignored for forward
//! compatibility, and every field has a default so an empty file is valid.

mod model;
mod operations;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export public API
pub use model::LockConfig;
pub use operations::timeout_from_secs;
pub use types::{BackendKind, Mode, Reentrancy};
