//! GPIO Proxy command-line interface.

pub mod commands;

use clap::{Parser, Subcommand};
use gpioproxy_core::config::{Config, LogLevel, DEFAULT_CONFIG_FILE};
use gpioproxy_core::env::vars;
use std::path::PathBuf;

/// GPIO Proxy - JSON-RPC over WebSocket access to GPIO devices
#[derive(Parser)]
#[command(name = "gpioproxy")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, env = vars::CONFIG, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<LogLevel>,

    /// Command to run; serves the proxy when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Start the proxy server
    Run(commands::run::RunArgs),

    /// Validate the configuration and try to initialize every device
    Check,

    /// Show version information
    Version,
}

/// Effective log level: the flag, else the config file, else info.
pub fn log_level(cli: &Cli) -> LogLevel {
    cli.log_level
        .or_else(|| Config::load(&cli.config).ok().map(|c| c.logging.level))
        .unwrap_or_default()
}

/// Run the CLI with the given arguments.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        None => commands::run::run(&cli.config, commands::run::RunArgs::default()).await,
        Some(Commands::Run(args)) => commands::run::run(&cli.config, args).await,
        Some(Commands::Check) => commands::check::run(&cli.config),
        Some(Commands::Version) => {
            println!("gpioproxy {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
