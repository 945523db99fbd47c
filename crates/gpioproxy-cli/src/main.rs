//! GPIO Proxy CLI entry point.

use clap::Parser;
use gpioproxy_cli::{log_level, run, Cli};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over flag and config
    let level = log_level(&cli);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| level.as_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Run the command
    run(cli).await
}
