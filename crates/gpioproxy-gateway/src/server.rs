//! WebSocket gateway server.

use crate::broadcast::{Broadcaster, EventPublisher};
use crate::connections::ConnectionRegistry;
use crate::dispatcher::Dispatcher;
use crate::error::GatewayError;
use crate::handlers::{register_all, HandlerContext};
use crate::hooks::HookManager;
use crate::methods::MethodRegistry;
use crate::rpc::JsonRpcResponse;
use crate::Result;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        ConnectInfo, State, WebSocketUpgrade,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use gpioproxy_core::config::ServerConfig;
use gpioproxy_core::{ConnectionId, DeviceDescriptor, DeviceLookup};
use serde_json::Value;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Default gateway port.
pub const DEFAULT_PORT: u16 = 8765;

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Host address to bind.
    pub host: String,

    /// Port number; 0 picks a free port.
    pub port: u16,

    /// Capacity of each connection's outbound queue.
    pub outbound_buffer: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            outbound_buffer: 256,
        }
    }
}

impl From<&ServerConfig> for GatewayConfig {
    fn from(server: &ServerConfig) -> Self {
        Self {
            host: server.host.clone(),
            port: server.port,
            outbound_buffer: server.outbound_buffer,
        }
    }
}

/// Gateway server state.
pub struct GatewayState {
    /// Request dispatcher.
    pub dispatcher: Dispatcher,

    /// Connected clients.
    pub connections: Arc<ConnectionRegistry>,

    /// Configuration.
    pub config: GatewayConfig,

    /// Number of configured devices.
    pub device_count: usize,

    shutdown: watch::Receiver<bool>,
}

/// The WebSocket gateway server.
pub struct Gateway {
    config: GatewayConfig,
    devices: Arc<dyn DeviceLookup>,
    catalog: Vec<DeviceDescriptor>,
}

impl Gateway {
    /// Create a gateway serving `devices`, listing `catalog` in `list_devices`.
    pub fn new(
        config: GatewayConfig,
        devices: Arc<dyn DeviceLookup>,
        catalog: Vec<DeviceDescriptor>,
    ) -> Self {
        Self {
            config,
            devices,
            catalog,
        }
    }

    /// Bind the listener and start serving in the background.
    pub async fn start(self) -> Result<GatewayHandle> {
        let connections = Arc::new(ConnectionRegistry::new());
        let (publisher, events) = EventPublisher::channel();
        let hooks = Arc::new(HookManager::new(publisher));

        let device_count = self.catalog.len();
        let methods = Arc::new(MethodRegistry::new());
        let context = HandlerContext::new(self.devices, connections.clone(), hooks)
            .with_catalog(self.catalog);
        register_all(&methods, context).await;

        let listener =
            tokio::net::TcpListener::bind((self.config.host.as_str(), self.config.port))
                .await
                .map_err(GatewayError::Io)?;
        let local_addr = listener.local_addr()?;

        let pump = tokio::spawn(Broadcaster::new(connections.clone()).run(events));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let state = Arc::new(GatewayState {
            dispatcher: Dispatcher::new(methods),
            connections,
            config: self.config,
            device_count,
            shutdown: shutdown_rx.clone(),
        });

        info!("Starting gateway server on {}", local_addr);

        let app = create_router(state.clone());
        let mut signal = shutdown_rx;
        let server = tokio::spawn(async move {
            let result = axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async move { wait_for_shutdown(&mut signal).await })
            .await;
            if let Err(e) = result {
                error!("Gateway server error: {}", e);
            }
        });

        Ok(GatewayHandle {
            local_addr,
            state,
            shutdown_tx,
            server,
            pump,
        })
    }

    /// Serve until `signal` resolves, then shut down.
    pub async fn run_until<F>(self, signal: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let handle = self.start().await?;
        signal.await;
        info!("Shutting down gateway");
        handle.shutdown().await;
        Ok(())
    }
}

/// Handle to a running gateway.
pub struct GatewayHandle {
    local_addr: SocketAddr,
    state: Arc<GatewayState>,
    shutdown_tx: watch::Sender<bool>,
    server: JoinHandle<()>,
    pump: JoinHandle<()>,
}

impl GatewayHandle {
    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Get connected client count.
    pub async fn client_count(&self) -> usize {
        self.state.connections.len().await
    }

    /// Close every connection and stop the server.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.server.await {
            error!("Gateway server task failed: {}", e);
        }
        self.pump.abort();
        info!("Gateway stopped");
    }
}

/// Resolve once shutdown is signalled. Never resolves if the sender is gone.
async fn wait_for_shutdown(rx: &mut watch::Receiver<bool>) {
    while !*rx.borrow() {
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Create the Axum router.
fn create_router(state: Arc<GatewayState>) -> Router {
    Router::new()
        .route("/", get(ws_handler))
        .route("/ws", get(ws_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// WebSocket upgrade handler.
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<GatewayState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, addr))
}

/// Handle a WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<GatewayState>, remote_addr: SocketAddr) {
    let conn = ConnectionId::new();
    let (outbound, mut queue) = mpsc::channel::<String>(state.config.outbound_buffer.max(1));
    state.connections.register(conn, outbound.clone()).await;

    info!("Client connected: {} from {}", conn, remote_addr);

    let (mut sender, mut receiver) = socket.split();

    // Single writer: responses and broadcasts share the queue.
    let writer = tokio::spawn(async move {
        while let Some(text) = queue.recv().await {
            if let Err(e) = sender.send(Message::Text(text)).await {
                debug!("Failed to send to client: {}", e);
                break;
            }
        }
        let _ = sender.close().await;
    });

    let mut shutdown = state.shutdown.clone();
    loop {
        let msg = tokio::select! {
            msg = receiver.next() => msg,
            _ = wait_for_shutdown(&mut shutdown) => {
                debug!("Closing client {} for shutdown", conn);
                break;
            }
        };

        let response = match msg {
            Some(Ok(Message::Text(text))) => state.dispatcher.dispatch(conn, &text).await,
            Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                Ok(text) => state.dispatcher.dispatch(conn, &text).await,
                Err(_) => Some(JsonRpcResponse::error(
                    Value::Null,
                    GatewayError::Parse.to_rpc_error(),
                )),
            },
            Some(Ok(Message::Close(_))) | None => {
                debug!("Client {} closed connection", conn);
                break;
            }
            Some(Ok(_)) => continue,
            Some(Err(e)) => {
                warn!("WebSocket error: {}", e);
                break;
            }
        };

        let Some(response) = response else {
            continue;
        };
        match serde_json::to_string(&response) {
            Ok(text) => {
                if outbound.send(text).await.is_err() {
                    break;
                }
            }
            Err(e) => error!("Failed to encode response: {}", e),
        }
    }

    // Removes the connection and its subscriptions in one step.
    state.connections.unregister(conn).await;
    drop(outbound);
    let _ = writer.await;

    info!("Client disconnected: {}", conn);
}

/// Health check handler.
async fn health_handler(State(state): State<Arc<GatewayState>>) -> impl IntoResponse {
    let clients = state.connections.len().await;
    serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "clients": clients,
        "devices": state.device_count,
    })
    .to_string()
}
