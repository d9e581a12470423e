//! rznap CLI - policy-driven ZFS snapshots

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use rznap_cli::config::DEFAULT_CONFIG_PATH;
use rznap_cli::logging;
use std::path::PathBuf;

mod cmd;

/// rznap - take ZFS snapshots according to per-dataset retention policies
#[derive(Parser)]
#[command(name = "rznap")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, env = "RZNAP_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Append log lines to this file instead of stdout
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take all snapshots that are due
    Snap {
        /// Process dataset entries concurrently
        #[arg(long)]
        parallel: bool,
    },
    /// Show which snapshots are due without taking them
    Plan,
    /// Inspect the configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Parse and validate the configuration file
    Check,
    /// Print an annotated example configuration
    Example,
    /// Print the configuration file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _guard = logging::init(cli.verbose, cli.log_file.as_deref())?;

    match cli.command {
        Commands::Snap { parallel } => cmd::snap::run(&cli.config, parallel).await,
        Commands::Plan => cmd::plan::run(&cli.config).await,
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::Check => cmd::config::run_check(&cli.config).await,
            ConfigCommands::Example => cmd::config::run_example().await,
            ConfigCommands::Path => cmd::config::run_path(&cli.config).await,
        },
    }
}
