//! Gateway error types.

use crate::rpc::JsonRpcError;
use thiserror::Error;

/// Errors that can occur in the gateway.
///
/// The protocol-facing variants display exactly the message sent to the
/// client in the JSON-RPC error object.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Inbound text was not valid JSON.
    #[error("Parse error")]
    Parse,

    /// The envelope is not a valid JSON-RPC 2.0 request.
    #[error("{0}")]
    InvalidRequest(String),

    /// Method not found.
    #[error("Method '{0}' not found")]
    MethodNotFound(String),

    /// Invalid parameters.
    #[error("{0}")]
    InvalidParams(String),

    /// Internal error, carrying the failure's own message.
    #[error("{0}")]
    Internal(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GatewayError {
    /// Get the JSON-RPC error code.
    pub fn code(&self) -> i32 {
        match self {
            Self::Parse => -32700,
            Self::InvalidRequest(_) => -32600,
            Self::MethodNotFound(_) => -32601,
            Self::InvalidParams(_) => -32602,
            _ => -32603,
        }
    }

    /// Create an invalid params error.
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams(message.into())
    }

    /// The error object sent on the wire.
    pub fn to_rpc_error(&self) -> JsonRpcError {
        JsonRpcError::new(self.code(), self.to_string())
    }
}
