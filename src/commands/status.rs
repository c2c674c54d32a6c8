//! Implementation of the `pathlock status` command.
//!
//! Makes one non-blocking attempt on the path and releases it immediately,
//! so the command never holds the lock past its own return.

use super::Result;
use crate::cli::StatusArgs;
use pathlock::exit_codes;
use pathlock::{BackendKind, FileLock, LockConfig, LockError, LockMetadata};

/// Execute the `pathlock status` command.
///
/// Prints one of:
/// - `free` when no lock file exists or the attempt succeeds
/// - `held` when the attempt finds another holder, followed by the holder's
///   metadata for soft locks
pub fn cmd_status(args: StatusArgs) -> Result<i32> {
    if !args.path.exists() {
        println!("{}: free (no lock file)", args.path.display());
        return Ok(exit_codes::SUCCESS);
    }

    let config = LockConfig {
        backend: if args.soft {
            BackendKind::Soft
        } else {
            BackendKind::Native
        },
        ..LockConfig::default()
    };
    let lock = FileLock::with_config(&args.path, &config)?;

    match lock.try_acquire() {
        Ok(guard) => {
            guard.release()?;
            println!("{}: free", args.path.display());
        }
        Err(LockError::Timeout { .. }) => {
            println!("{}: held", args.path.display());
            if args.soft {
                print_holder(&args.path);
            }
        }
        Err(e) => return Err(e.into()),
    }

    Ok(exit_codes::SUCCESS)
}

fn print_holder(path: &std::path::Path) {
    match LockMetadata::from_file(path) {
        Ok(metadata) => {
            println!("  Owner:   {}", metadata.owner);
            if let Some(pid) = metadata.pid {
                println!("  PID:     {}", pid);
            }
            println!("  Mode:    {}", metadata.mode);
            println!(
                "  Created: {} ({} ago)",
                metadata.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
                metadata.age_string()
            );
        }
        Err(e) => {
            // The holder may still be writing its metadata.
            println!("  (metadata unavailable: {})", e);
        }
    }
}
