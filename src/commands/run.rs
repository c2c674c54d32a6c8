//! Implementation of the `pathlock run` command.
//!
//! Holds the lock for the lifetime of a child process. The lock file
//! descriptor is opened close-on-exec, so the child never inherits it.

use super::{CommandError, Result};
use crate::cli::RunArgs;
use log::debug;
use pathlock::{BackendKind, FileLock, LockConfig, LockError, Mode};
use std::process::{Command, ExitStatus};

/// Execute the `pathlock run` command.
///
/// Flags override values from `--config`. Returns the child's exit code.
pub fn cmd_run(args: RunArgs) -> Result<i32> {
    let (program, rest) = match args.command.split_first() {
        Some(split) => split,
        None => return Err(LockError::Config("no command given".to_string()).into()),
    };

    let config = build_config(&args)?;
    let lock = FileLock::with_config(&args.path, &config)?;
    let guard = lock.acquire()?;

    debug!("running '{}' under lock '{}'", program, args.path.display());
    let status = Command::new(program)
        .args(rest)
        .status()
        .map_err(|source| CommandError::Spawn {
            program: program.clone(),
            source,
        })?;

    guard.release()?;
    Ok(exit_code_of(status))
}

/// Merge the config file (if any) with command-line overrides.
fn build_config(args: &RunArgs) -> Result<LockConfig> {
    let mut config = match &args.config {
        Some(path) => LockConfig::load(path)?,
        None => LockConfig::default(),
    };

    if args.shared {
        config.mode = Mode::Shared;
    }
    if args.soft {
        config.backend = BackendKind::Soft;
    }
    if let Some(timeout) = args.timeout {
        config.timeout_secs = timeout;
    }
    if let Some(poll_interval) = args.poll_interval {
        config.poll_interval_secs = poll_interval;
    }

    config.validate()?;
    Ok(config)
}

/// Child exit code; a signal death maps to `128 + signal` like a shell.
fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}
