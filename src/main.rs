// ABOUTME: Entry point for the bluegreen CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use bluegreen::config::{self, Config};
use bluegreen::error::{Error, Result};
use bluegreen::output::{Output, OutputMode};
use clap::Parser;
use cli::{Cli, Commands};
use commands::DeployOptions;
use std::env;
use std::path::Path;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };

    if let Err(e) = run(cli, mode).await {
        Output::new(mode).error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, mode: OutputMode) -> Result<()> {
    let cwd = env::current_dir()?;
    let output = Output::new(mode);

    match cli.command {
        Commands::Init { force } => {
            config::init_config(&cwd, force)?;
            output.success(&format!("Created {}", config::CONFIG_FILENAME));
            Ok(())
        }
        Commands::Deploy {
            tag,
            keep_previous,
            monitor,
            hold,
        } => {
            let config = load_config(&cwd)?;
            let options = DeployOptions {
                tag,
                keep_previous,
                monitor,
                hold,
            };
            commands::deploy(config, options, output).await
        }
        Commands::Check { target } => {
            let config = load_config(&cwd)?;
            commands::check(&config, &target, &output).await
        }
    }
}

/// Discover the config file, falling back to defaults, then apply env overrides.
fn load_config(cwd: &Path) -> Result<Config> {
    let config = match Config::discover(cwd) {
        Ok(config) => config,
        Err(Error::ConfigNotFound(_)) => {
            tracing::debug!("no config file found, using defaults");
            Config::default()
        }
        Err(e) => return Err(e),
    };
    config.with_env_overrides()
}
