//! Implementation of the `pathlock probe` command.

use super::Result;
use crate::cli::ProbeArgs;
use pathlock::exit_codes;
use pathlock::probe::check_would_fail;

/// Execute the `pathlock probe` command.
///
/// An unusable path is reported as an error (exit code 3); otherwise the
/// path may be lockable and the command succeeds.
pub fn cmd_probe(args: ProbeArgs) -> Result<i32> {
    check_would_fail(&args.path)?;
    println!("{}: lockable", args.path.display());
    Ok(exit_codes::SUCCESS)
}
