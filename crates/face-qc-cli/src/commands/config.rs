//! Config command - show the effective configuration.

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use crate::config::{layer_paths, AppConfig};

/// Arguments for `face-qc config`.
#[derive(Args, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// What to show.
#[derive(Subcommand, Clone, Copy)]
pub enum ConfigAction {
    /// Print the merged configuration as TOML
    Show,
    /// List the config files in use, lowest priority first
    Paths,
}

/// Run the config command.
///
/// # Errors
///
/// Returns an error if a config file is unreadable or the merged
/// configuration is invalid.
pub fn run(args: &ConfigArgs, explicit: Option<&Path>) -> Result<()> {
    match args.action {
        ConfigAction::Show => {
            let config = AppConfig::load(explicit)?;
            config.pipeline.validate().context("Invalid configuration")?;
            print!("{}", config.to_toml()?);
        }
        ConfigAction::Paths => {
            for path in layer_paths(explicit)? {
                println!("{}", path.display());
            }
        }
    }
    Ok(())
}
