//! Face QC CLI - Quality gate for facial photographs.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;

use commands::{Cli, Commands, ExitCode};
use config::AppConfig;

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let explicit = cli.config.as_deref();
    let outcome = match cli.command {
        Some(Commands::Config(ref args)) => {
            commands::config::run(args, explicit).map(|()| ExitCode::Success)
        }
        Some(Commands::Check(ref args)) => run_check(args, explicit),
        None => {
            // Default behavior: run check with flattened args
            if cli.check.paths.is_empty() {
                eprintln!("error: No paths specified. Use --help for usage information.");
                return ExitCode::Error.into();
            }
            run_check(&cli.check, explicit)
        }
    };

    match outcome {
        Ok(code) => code.into(),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::Error.into()
        }
    }
}

fn run_check(
    args: &commands::check::CheckArgs,
    explicit: Option<&std::path::Path>,
) -> anyhow::Result<ExitCode> {
    let config = AppConfig::load(explicit)?;
    let args = commands::check::CheckArgs::with_config(args.clone(), &config);
    commands::check::run(&args).map(|result| result.exit_code)
}
