//! Device catalog handler.

use super::HandlerContext;
use crate::methods::MethodHandler;
use crate::Result;
use async_trait::async_trait;
use gpioproxy_core::ConnectionId;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// `list_devices` handler.
///
/// Answers from the configured list, so devices that failed to initialize
/// are still listed.
pub struct ListDevicesHandler {
    context: Arc<HandlerContext>,
}

impl ListDevicesHandler {
    pub fn new(context: Arc<HandlerContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl MethodHandler for ListDevicesHandler {
    async fn call(&self, _conn: ConnectionId, _params: Option<Value>) -> Result<Value> {
        debug!("Listing {} configured devices", self.context.catalog.len());
        Ok(serde_json::to_value(&self.context.catalog)?)
    }
}
