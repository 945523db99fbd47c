//! Inbound message dispatch.
//!
//! Turns one text frame into at most one response. Envelope problems are
//! always answered, with a `null` id when none could be read. Once the
//! envelope is valid, requests without an id are notifications and get no
//! response at all, not even on failure.

use crate::error::GatewayError;
use crate::methods::MethodRegistry;
use crate::rpc::{JsonRpcRequest, JsonRpcResponse, JSONRPC_VERSION};
use gpioproxy_core::ConnectionId;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Routes JSON-RPC requests to registered method handlers.
#[derive(Clone)]
pub struct Dispatcher {
    methods: Arc<MethodRegistry>,
}

impl Dispatcher {
    pub fn new(methods: Arc<MethodRegistry>) -> Self {
        Self { methods }
    }

    /// Handle one inbound message from `conn`.
    pub async fn dispatch(&self, conn: ConnectionId, text: &str) -> Option<JsonRpcResponse> {
        let message: Value = match serde_json::from_str(text) {
            Ok(message) => message,
            Err(e) => {
                debug!("Unparseable message from {}: {}", conn, e);
                return Some(error_response(Value::Null, GatewayError::Parse));
            }
        };

        let envelope = match message {
            Value::Object(map) => map,
            _ => {
                return Some(error_response(
                    Value::Null,
                    GatewayError::InvalidRequest("Invalid Request".to_string()),
                ))
            }
        };
        let id = envelope.get("id").cloned().unwrap_or(Value::Null);

        if envelope.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
            return Some(error_response(
                id,
                GatewayError::InvalidRequest("Invalid Request".to_string()),
            ));
        }

        match envelope.get("method") {
            None | Some(Value::Null) => {
                return Some(error_response(
                    id,
                    GatewayError::InvalidRequest("Method is required".to_string()),
                ))
            }
            Some(Value::String(_)) => {}
            Some(_) => {
                return Some(error_response(
                    id,
                    GatewayError::InvalidRequest("Method must be a string".to_string()),
                ))
            }
        }

        let request: JsonRpcRequest = match serde_json::from_value(Value::Object(envelope)) {
            Ok(request) => request,
            Err(e) => {
                debug!("Malformed request from {}: {}", conn, e);
                return Some(error_response(
                    id,
                    GatewayError::InvalidRequest("Invalid Request".to_string()),
                ));
            }
        };
        if request.method.is_empty() {
            return Some(error_response(
                id,
                GatewayError::InvalidRequest("Method is required".to_string()),
            ));
        }

        debug!("Received RPC request: {} (client: {})", request.method, conn);
        let notification = request.is_notification();
        let result = self
            .methods
            .call(&request.method, conn, request.params)
            .await;

        if notification {
            if let Err(e) = result {
                warn!("Notification '{}' from {} failed: {}", request.method, conn, e);
            }
            return None;
        }

        Some(match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => {
                debug!("Request '{}' from {} failed: {}", request.method, conn, e);
                error_response(id, e)
            }
        })
    }
}

fn error_response(id: Value, error: GatewayError) -> JsonRpcResponse {
    JsonRpcResponse::error(id, error.to_rpc_error())
}
