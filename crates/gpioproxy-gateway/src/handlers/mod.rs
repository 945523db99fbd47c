//! RPC method handlers.
//!
//! This module contains implementations for all gateway RPC methods.

pub mod catalog;
pub mod device;
pub mod events;

use crate::connections::ConnectionRegistry;
use crate::error::GatewayError;
use crate::hooks::HookManager;
use crate::methods::MethodRegistry;
use crate::Result;
use gpioproxy_core::{Device, DeviceDescriptor, DeviceLookup};
use serde_json::{Map, Value};
use std::sync::Arc;

pub use catalog::ListDevicesHandler;
pub use device::{CallHandler, ReadHandler, WriteHandler};
pub use events::SubscribeHandler;

/// Shared context for handlers.
pub struct HandlerContext {
    /// Live device lookup.
    pub devices: Arc<dyn DeviceLookup>,

    /// Configured device list served by `list_devices`.
    pub catalog: Vec<DeviceDescriptor>,

    /// Connected clients and their subscriptions.
    pub connections: Arc<ConnectionRegistry>,

    /// Event hooks attached so far.
    pub hooks: Arc<HookManager>,
}

impl HandlerContext {
    /// Create a new handler context with an empty catalog.
    pub fn new(
        devices: Arc<dyn DeviceLookup>,
        connections: Arc<ConnectionRegistry>,
        hooks: Arc<HookManager>,
    ) -> Self {
        Self {
            devices,
            catalog: Vec::new(),
            connections,
            hooks,
        }
    }

    /// Set the configured device list.
    pub fn with_catalog(mut self, catalog: Vec<DeviceDescriptor>) -> Self {
        self.catalog = catalog;
        self
    }

    /// Look up a device, failing with invalid params when it is absent.
    pub fn device(&self, device_id: &str) -> Result<Arc<dyn Device>> {
        self.devices
            .get(device_id)
            .ok_or_else(|| GatewayError::InvalidParams(format!("Device '{}' not found", device_id)))
    }
}

/// Require `params` to be a JSON object.
pub(crate) fn object_params(params: Option<Value>) -> Result<Map<String, Value>> {
    match params {
        Some(Value::Object(map)) => Ok(map),
        _ => Err(GatewayError::invalid_params("Params must be an object")),
    }
}

/// Non-empty string field, or `None` when absent, empty, or not a string.
pub(crate) fn non_empty_str<'a>(params: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    params
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Register all built-in method handlers.
pub async fn register_all(registry: &MethodRegistry, context: HandlerContext) {
    let ctx = Arc::new(context);

    // Device member access
    registry
        .register("call", Arc::new(CallHandler::new(ctx.clone())))
        .await;
    registry
        .register("read", Arc::new(ReadHandler::new(ctx.clone())))
        .await;
    registry
        .register("write", Arc::new(WriteHandler::new(ctx.clone())))
        .await;

    // Events
    registry
        .register("subscribe", Arc::new(SubscribeHandler::new(ctx.clone())))
        .await;

    // Catalog
    registry
        .register("list_devices", Arc::new(ListDevicesHandler::new(ctx)))
        .await;
}
