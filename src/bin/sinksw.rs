//! SINKSW binary entry point
//!
//! Loads config, applies CLI overrides, and runs the switch or a subcommand.

use clap::Parser;
use color_eyre::eyre::Result;
use sinksw::{cli::Args, cli::Command, commands, config::Config};

/// Initialize logging to stderr
///
/// `RUST_LOG` wins; otherwise only this crate logs, at the configured level.
fn init_logging(log_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("sinksw={log_level}"))),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    config.apply_overrides(&args)?;

    init_logging(&config.log_level);

    match args.command {
        None => commands::switch(&config),
        Some(Command::ListSinks { json }) => commands::list_sinks(&config, json),
    }
}
