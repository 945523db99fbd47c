//! Run command.

use anyhow::Context;
use clap::Args;
use gpioproxy_core::config::Config;
use gpioproxy_devices::{DeviceFactory, DeviceManager};
use gpioproxy_gateway::{Gateway, GatewayConfig};
use std::path::Path;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

/// Run command arguments.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Host address to bind (overrides config and GPIOPROXY_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port number (overrides config and GPIOPROXY_PORT)
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Load the config file and apply environment, then flag, overrides.
pub fn load_config(path: &Path, args: &RunArgs) -> anyhow::Result<Config> {
    let mut config = Config::load(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;

    config.apply_env_overrides();
    if let Some(host) = &args.host {
        config.server.host = host.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Run the proxy until Ctrl+C or SIGTERM.
pub async fn run(config_path: &Path, args: RunArgs) -> anyhow::Result<()> {
    let config = match load_config(config_path, &args) {
        Ok(config) => config,
        Err(e) => {
            error!("{:#}", e);
            return Err(e);
        }
    };

    let factory = DeviceFactory::default();
    let devices = Arc::new(DeviceManager::from_configs(&config.devices, &factory));
    info!(
        "{} of {} configured devices ready",
        devices.len(),
        config.devices.len()
    );

    let gateway = Gateway::new(
        GatewayConfig::from(&config.server),
        devices.clone(),
        config.catalog(),
    );
    let result = gateway.run_until(shutdown_signal()).await;

    devices.close_all();
    info!("Cleanup complete");

    result.context("Gateway failed")
}

/// Resolve on Ctrl+C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Received shutdown signal, shutting down gracefully...");
}
