//! Event subscription handler.

use super::{non_empty_str, object_params, HandlerContext};
use crate::error::GatewayError;
use crate::methods::MethodHandler;
use crate::Result;
use async_trait::async_trait;
use gpioproxy_core::{ConnectionId, SubscriptionKey};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Subscribe handler.
///
/// Records the connection's interest first, then makes sure the device event
/// is hooked. Subscribing to an event the device does not have still
/// succeeds; it simply never fires.
pub struct SubscribeHandler {
    context: Arc<HandlerContext>,
}

impl SubscribeHandler {
    pub fn new(context: Arc<HandlerContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl MethodHandler for SubscribeHandler {
    async fn call(&self, conn: ConnectionId, params: Option<Value>) -> Result<Value> {
        let params = object_params(params)?;
        let (device_id, event) = match (
            non_empty_str(&params, "device_id"),
            non_empty_str(&params, "event"),
        ) {
            (Some(device_id), Some(event)) => (device_id, event),
            _ => {
                return Err(GatewayError::invalid_params(
                    "device_id and event are required",
                ))
            }
        };

        let device = self.context.device(device_id)?;
        let key = SubscriptionKey::new(device_id, event);
        if self.context.connections.subscribe(conn, key.clone()).await {
            info!("Client {} subscribed to {}", conn, key);
        } else {
            debug!("Client {} left before subscribing to {}", conn, key);
        }

        self.context.hooks.ensure_hooked(device_id, event, &device);
        Ok(Value::String("subscribed".to_string()))
    }
}
