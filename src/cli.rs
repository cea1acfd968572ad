// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bluegreen")]
#[command(about = "Blue/green deployments for HTTP services")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print final results
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Print JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new bluegreen.yml configuration file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Deploy the built-in service into the standby color and switch traffic to it
    Deploy {
        /// Version tag for the new deployment (defaults to the current time)
        #[arg(short, long)]
        tag: Option<String>,

        /// Leave the previous environment running after the switch
        #[arg(long)]
        keep_previous: bool,

        /// Monitor the new environment and roll back automatically on failure
        #[arg(long)]
        monitor: bool,

        /// Keep serving until interrupted
        #[arg(long)]
        hold: bool,
    },

    /// Probe an environment's health endpoint once
    Check {
        /// Color (blue, green) or port number
        target: String,
    },
}
