//! Device manager.

use crate::error::DeviceError;
use crate::factory::DeviceFactory;
use crate::Result;
use gpioproxy_core::config::DeviceConfig;
use gpioproxy_core::{Device, DeviceLookup};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Owns the live devices, keyed by configured ID.
#[derive(Default)]
pub struct DeviceManager {
    devices: RwLock<HashMap<String, Arc<dyn Device>>>,
    /// Device IDs in registration order.
    order: RwLock<Vec<String>>,
}

impl DeviceManager {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Instantiate every configured device.
    ///
    /// Devices that fail to construct are logged and skipped; they are simply
    /// absent from later lookups.
    pub fn from_configs(configs: &[DeviceConfig], factory: &DeviceFactory) -> Self {
        debug!("Initializing {} devices...", configs.len());
        let manager = Self::new();

        for config in configs {
            match factory.create(config) {
                Ok(device) => match manager.insert(&config.id, device) {
                    Ok(()) => info!(
                        "Initialized device '{}' of class '{}'",
                        config.id, config.class_name
                    ),
                    Err(e) => error!("Error initializing device '{}': {}", config.id, e),
                },
                Err(DeviceError::UnknownClass(class)) => {
                    error!("Error: device class '{}' not found.", class)
                }
                Err(e) => error!("Error initializing device '{}': {}", config.id, e),
            }
        }

        manager
    }

    /// Register a device under `id`.
    pub fn insert(&self, id: impl Into<String>, device: Arc<dyn Device>) -> Result<()> {
        let id = id.into();
        let mut devices = self.devices.write();
        if devices.contains_key(&id) {
            return Err(DeviceError::AlreadyExists(id));
        }
        devices.insert(id.clone(), device);
        self.order.write().push(id);
        Ok(())
    }

    /// Get a device by ID.
    pub fn get(&self, id: &str) -> Option<Arc<dyn Device>> {
        self.devices.read().get(id).cloned()
    }

    /// Device IDs in registration order.
    pub fn ids(&self) -> Vec<String> {
        self.order.read().clone()
    }

    pub fn len(&self) -> usize {
        self.devices.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.read().is_empty()
    }

    /// Close every device, releasing pins and stopping background work.
    pub fn close_all(&self) {
        let devices: Vec<(String, Arc<dyn Device>)> = self
            .devices
            .read()
            .iter()
            .map(|(id, device)| (id.clone(), device.clone()))
            .collect();

        for (id, device) in devices {
            device.close();
            debug!("Closed device '{}'", id);
        }
        info!("Closed {} devices", self.len());
    }
}

impl DeviceLookup for DeviceManager {
    fn get(&self, device_id: &str) -> Option<Arc<dyn Device>> {
        DeviceManager::get(self, device_id)
    }
}
