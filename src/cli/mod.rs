//! CLI argument parsing for pathlock.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// pathlock: hold a cross-process file lock from the shell.
///
/// Locks are native OS locks where available, with a portable "soft"
/// fallback that treats the existence of the lock file as the lock.
#[derive(Parser, Debug)]
#[command(name = "pathlock")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for pathlock.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a command while holding a lock.
    ///
    /// Acquires the lock, runs the command, releases the lock and exits
    /// with the command's exit code.
    Run(RunArgs),

    /// Check whether a lock path can never be acquired.
    ///
    /// Reports read-only files and directories without touching the path.
    Probe(ProbeArgs),

    /// Report whether a lock is currently free or held.
    ///
    /// Makes a single attempt; prints holder metadata for soft locks.
    Status(StatusArgs),
}

/// Arguments for the `run` command.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path of the lock file.
    pub path: PathBuf,

    /// Take a shared (reader) lock instead of an exclusive one.
    #[arg(long)]
    pub shared: bool,

    /// Use the soft backend (lock file existence) instead of native locks.
    #[arg(long)]
    pub soft: bool,

    /// Seconds to wait for the lock; negative waits forever.
    #[arg(long, allow_negative_numbers = true)]
    pub timeout: Option<f64>,

    /// Seconds between acquisition attempts.
    #[arg(long)]
    pub poll_interval: Option<f64>,

    /// YAML config file with lock defaults; flags override it.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Command to run, given after `--`.
    #[arg(last = true, required = true, num_args = 1..)]
    pub command: Vec<String>,
}

/// Arguments for the `probe` command.
#[derive(Parser, Debug)]
pub struct ProbeArgs {
    /// Path of the lock file.
    pub path: PathBuf,
}

/// Arguments for the `status` command.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Path of the lock file.
    pub path: PathBuf,

    /// Check a soft lock instead of a native one.
    #[arg(long)]
    pub soft: bool,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
