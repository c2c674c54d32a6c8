//! Command implementations for pathlock.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations, plus the error type the binary reports.

mod probe;
mod run;
mod status;

use crate::cli::Command;
use pathlock::LockError;
use pathlock::exit_codes;
use thiserror::Error;

/// Errors surfaced by CLI commands.
#[derive(Error, Debug)]
pub enum CommandError {
    /// A lock operation failed.
    #[error(transparent)]
    Lock(#[from] LockError),

    /// The child command could not be started.
    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl CommandError {
    /// Returns the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CommandError::Lock(err) => err.exit_code(),
            CommandError::Spawn { .. } => exit_codes::USER_ERROR,
        }
    }
}

pub type Result<T> = std::result::Result<T, CommandError>;

/// Narrow an exit code to the byte a process can report.
///
/// Codes outside `0..=255` (possible for Windows children) become
/// `USER_ERROR` instead of wrapping, so 256 never reads as success.
pub fn process_exit_code(code: i32) -> u8 {
    u8::try_from(code).unwrap_or(exit_codes::USER_ERROR as u8)
}

/// Dispatch a command to its implementation.
///
/// Returns the exit code to report on success; `run` forwards the child's.
pub fn dispatch(command: Command) -> Result<i32> {
    match command {
        Command::Run(args) => run::cmd_run(args),
        Command::Probe(args) => probe::cmd_probe(args),
        Command::Status(args) => status::cmd_status(args),
    }
}
