//! Check command.

use gpioproxy_core::config::Config;
use gpioproxy_devices::{DeviceFactory, DeviceManager};
use std::path::Path;

/// Validate the config and instantiate every device, printing a summary.
pub fn run(config_path: &Path) -> anyhow::Result<()> {
    println!("GPIO Proxy configuration check\n");

    let config = Config::load(config_path)?;
    println!("  Loaded {}", config_path.display());

    if let Err(e) = config.validate() {
        println!("  Configuration invalid: {}", e);
        anyhow::bail!("configuration is invalid");
    }
    println!(
        "  Listening on {}:{} (outbound buffer {})",
        config.server.host, config.server.port, config.server.outbound_buffer
    );

    let factory = DeviceFactory::default();
    let manager = DeviceManager::from_configs(&config.devices, &factory);
    println!("\nDevices:");
    let mut failed = 0;
    for device in &config.devices {
        match manager.get(&device.id) {
            Some(live) => println!("  ok      {} ({})", device.id, live.class_name()),
            None => {
                failed += 1;
                println!("  FAILED  {} ({})", device.id, device.class_name);
            }
        }
    }
    manager.close_all();

    println!("\nAvailable classes: {}", factory.classes().join(", "));

    if failed > 0 {
        anyhow::bail!("{} of {} devices failed to initialize", failed, config.devices.len());
    }
    println!("\nAll {} devices initialized", config.devices.len());
    Ok(())
}
