//! pathlock: hold cross-process file locks from the shell.
//!
//! This is the main entry point for the `pathlock` CLI. It parses arguments,
//! dispatches to the appropriate command handler, and handles errors with
//! proper exit codes.

mod cli;
mod commands;

use cli::Cli;
use env_logger::{Builder, Env};
use std::process::ExitCode;

fn init_logger() {
    // Level comes from RUST_LOG, e.g. RUST_LOG=debug pathlock run ...
    Builder::from_env(Env::default().default_filter_or("warn"))
        .format_timestamp_millis()
        .init();
}

fn main() -> ExitCode {
    init_logger();
    let cli = Cli::parse_args();

    match commands::dispatch(cli.command) {
        Ok(code) => ExitCode::from(commands::process_exit_code(code)),
        Err(err) => {
            // Print user-actionable error message to stderr
            eprintln!("Error: {}", err);

            ExitCode::from(commands::process_exit_code(err.exit_code()))
        }
    }
}
