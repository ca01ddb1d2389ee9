//! CLI command definitions and handlers.

pub mod check;
pub mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Face QC - Quality gate for facial photographs
#[derive(Parser)]
#[command(name = "face-qc")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Shared check arguments (paths, thresholds, flags).
    #[command(flatten)]
    pub check: check::CheckArgs,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Extra config file, applied after the XDG and project files
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Check photos and report whether they are suitable for analysis
    Check(check::CheckArgs),
    /// Inspect the effective configuration
    Config(config::ConfigArgs),
}

/// Process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Every photo is suitable.
    Success,
    /// At least one photo was rejected.
    Rejected,
    /// A file could not be processed or the command failed.
    Error,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        match code {
            ExitCode::Success => Self::SUCCESS,
            ExitCode::Rejected => Self::from(1),
            ExitCode::Error => Self::from(2),
        }
    }
}
