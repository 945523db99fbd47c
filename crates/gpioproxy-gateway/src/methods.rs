//! RPC method registry and handlers.

use crate::error::GatewayError;
use crate::Result;
use async_trait::async_trait;
use gpioproxy_core::ConnectionId;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Trait for RPC method handlers.
#[async_trait]
pub trait MethodHandler: Send + Sync {
    /// Handle the method call made on connection `conn`.
    async fn call(&self, conn: ConnectionId, params: Option<Value>) -> Result<Value>;
}

/// Registry for RPC methods.
pub struct MethodRegistry {
    /// Registered methods.
    methods: RwLock<HashMap<String, Arc<dyn MethodHandler>>>,
}

impl Default for MethodRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MethodRegistry {
    /// Create a new method registry.
    pub fn new() -> Self {
        Self {
            methods: RwLock::new(HashMap::new()),
        }
    }

    /// Register a method handler.
    pub async fn register(&self, name: impl Into<String>, handler: Arc<dyn MethodHandler>) {
        let mut methods = self.methods.write().await;
        methods.insert(name.into(), handler);
    }

    /// Call a method.
    pub async fn call(&self, name: &str, conn: ConnectionId, params: Option<Value>) -> Result<Value> {
        let handler = {
            let methods = self.methods.read().await;
            methods
                .get(name)
                .cloned()
                .ok_or_else(|| GatewayError::MethodNotFound(name.to_string()))?
        };

        debug!("Calling method: {}", name);
        handler.call(conn, params).await
    }

    /// List registered methods, sorted.
    pub async fn list(&self) -> Vec<String> {
        let methods = self.methods.read().await;
        let mut names: Vec<String> = methods.keys().cloned().collect();
        names.sort();
        names
    }
}
