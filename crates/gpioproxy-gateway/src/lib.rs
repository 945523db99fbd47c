//! WebSocket gateway server for GPIO Proxy.
//!
//! This crate provides:
//! - JSON-RPC 2.0 over WebSocket
//! - Generic `call`/`read`/`write` access to any device member
//! - Event subscriptions with `gpio.event` broadcasts

pub mod broadcast;
pub mod connections;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod hooks;
pub mod methods;
pub mod proxy;
pub mod rpc;
pub mod server;

#[cfg(test)]
pub(crate) mod test_support;

pub use broadcast::{Broadcaster, DeviceEvent, EventPublisher};
pub use connections::ConnectionRegistry;
pub use dispatcher::Dispatcher;
pub use error::GatewayError;
pub use handlers::HandlerContext;
pub use hooks::HookManager;
pub use methods::{MethodHandler, MethodRegistry};
pub use rpc::{JsonRpcError, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};
pub use server::{Gateway, GatewayConfig, GatewayHandle};

/// Result type for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;
