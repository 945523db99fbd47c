//! Device member access RPC method handlers.
//!
//! Handles `call`, `read` and `write` against any configured device.

use super::{non_empty_str, object_params, HandlerContext};
use crate::error::GatewayError;
use crate::methods::MethodHandler;
use crate::proxy;
use crate::Result;
use async_trait::async_trait;
use gpioproxy_core::ConnectionId;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

/// Device method call handler.
pub struct CallHandler {
    context: Arc<HandlerContext>,
}

impl CallHandler {
    pub fn new(context: Arc<HandlerContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl MethodHandler for CallHandler {
    async fn call(&self, _conn: ConnectionId, params: Option<Value>) -> Result<Value> {
        let params = object_params(params)?;
        let (device_id, method) = match (
            non_empty_str(&params, "device_id"),
            non_empty_str(&params, "method"),
        ) {
            (Some(device_id), Some(method)) => (device_id, method),
            _ => {
                return Err(GatewayError::invalid_params(
                    "device_id and method are required",
                ))
            }
        };

        let args = match params.get("args") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(args)) => args.clone(),
            Some(_) => return Err(GatewayError::invalid_params("args must be an array")),
        };
        let kwargs = match params.get("kwargs") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(kwargs)) => kwargs.clone(),
            Some(_) => return Err(GatewayError::invalid_params("kwargs must be an object")),
        };

        let device = self.context.device(device_id)?;
        debug!("Calling {}.{} with {} args", device_id, method, args.len());
        proxy::invoke(device.as_ref(), method, &args, &kwargs)
    }
}

/// Property read handler.
pub struct ReadHandler {
    context: Arc<HandlerContext>,
}

impl ReadHandler {
    pub fn new(context: Arc<HandlerContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl MethodHandler for ReadHandler {
    async fn call(&self, _conn: ConnectionId, params: Option<Value>) -> Result<Value> {
        let params = object_params(params)?;
        let (device_id, property) = match (
            non_empty_str(&params, "device_id"),
            non_empty_str(&params, "property"),
        ) {
            (Some(device_id), Some(property)) => (device_id, property),
            _ => {
                return Err(GatewayError::invalid_params(
                    "device_id and property are required",
                ))
            }
        };

        let device = self.context.device(device_id)?;
        debug!("Reading {}.{}", device_id, property);
        proxy::read_property(device.as_ref(), property)
    }
}

/// Property write handler.
pub struct WriteHandler {
    context: Arc<HandlerContext>,
}

impl WriteHandler {
    pub fn new(context: Arc<HandlerContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl MethodHandler for WriteHandler {
    async fn call(&self, _conn: ConnectionId, params: Option<Value>) -> Result<Value> {
        let mut params = object_params(params)?;
        let value = params.remove("value").unwrap_or(Value::Null);
        let (device_id, property) = match (
            non_empty_str(&params, "device_id"),
            non_empty_str(&params, "property"),
        ) {
            (Some(device_id), Some(property)) => (device_id, property),
            _ => {
                return Err(GatewayError::invalid_params(
                    "device_id and property are required",
                ))
            }
        };

        let device = self.context.device(device_id)?;
        debug!("Writing {}.{} = {}", device_id, property, value);
        proxy::write_property(device.as_ref(), property, value)?;
        Ok(Value::String("ok".to_string()))
    }
}
