//! Shared helpers for the GPIO Proxy integration tests.
//!
//! Starts a real gateway on a free loopback port over simulated pins and
//! talks to it with a `tokio-tungstenite` client.

use futures::{SinkExt, StreamExt};
use gpioproxy_core::config::DeviceConfig;
use gpioproxy_core::{Device, DeviceDescriptor, EventHandler, MemberError, MemberTable, PropertyValue};
use gpioproxy_devices::{DeviceFactory, DeviceManager, MockPinFactory};
use gpioproxy_gateway::{Gateway, GatewayConfig, GatewayHandle};
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

/// Upper bound for anything expected to arrive.
pub const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// A running gateway over simulated hardware.
pub struct TestServer {
    handle: GatewayHandle,
    pub devices: Arc<DeviceManager>,
    pub pins: Arc<MockPinFactory>,
}

impl TestServer {
    /// Start a gateway serving `configs`, plus any `extra` custom devices.
    pub async fn start(configs: Vec<DeviceConfig>, extra: Vec<(&str, Arc<dyn Device>)>) -> Self {
        let pins = Arc::new(MockPinFactory::new());
        let factory = DeviceFactory::new(pins.clone());
        let devices = Arc::new(DeviceManager::from_configs(&configs, &factory));

        let mut catalog: Vec<DeviceDescriptor> = configs
            .iter()
            .map(|c| DeviceDescriptor::new(&c.id, &c.class_name))
            .collect();
        for (id, device) in extra {
            catalog.push(DeviceDescriptor::new(id, device.class_name()));
            devices.insert(id, device).unwrap();
        }

        let config = GatewayConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            outbound_buffer: 64,
        };
        let handle = Gateway::new(config, devices.clone(), catalog)
            .start()
            .await
            .unwrap();

        Self {
            handle,
            devices,
            pins,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.handle.local_addr()
    }

    pub fn url(&self) -> String {
        format!("ws://{}/", self.addr())
    }

    /// Open a new client connection.
    pub async fn connect(&self) -> Client {
        Client::connect(&self.url()).await
    }

    /// Wait until the server has seen exactly `n` live clients.
    pub async fn wait_for_clients(&self, n: usize) {
        let deadline = tokio::time::Instant::now() + RECV_TIMEOUT;
        while self.handle.client_count().await != n {
            assert!(
                tokio::time::Instant::now() < deadline,
                "expected {} clients",
                n
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    pub async fn shutdown(self) {
        self.handle.shutdown().await;
        self.devices.close_all();
    }
}

/// A JSON-RPC WebSocket client.
pub struct Client {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl Client {
    pub async fn connect(url: &str) -> Self {
        let (ws, _) = connect_async(url).await.unwrap();
        Self { ws }
    }

    /// Send a JSON message without waiting for anything.
    pub async fn send(&mut self, message: Value) {
        self.send_text(message.to_string()).await;
    }

    /// Send a raw text frame.
    pub async fn send_text(&mut self, text: String) {
        self.ws.send(Message::Text(text)).await.unwrap();
    }

    /// Send a raw binary frame.
    pub async fn send_binary(&mut self, bytes: Vec<u8>) {
        self.ws.send(Message::Binary(bytes)).await.unwrap();
    }

    /// Send a request and wait for the next message.
    pub async fn request(&mut self, message: Value) -> Value {
        self.send(message).await;
        self.recv().await
    }

    /// Shorthand for a request with an id.
    pub async fn rpc(&mut self, id: u64, method: &str, params: Value) -> Value {
        self.request(json!({"jsonrpc": "2.0", "method": method, "params": params, "id": id}))
            .await
    }

    /// Next JSON text message, failing after [`RECV_TIMEOUT`].
    pub async fn recv(&mut self) -> Value {
        self.recv_within(RECV_TIMEOUT)
            .await
            .expect("timed out waiting for a message")
    }

    /// Next JSON text message, or `None` if nothing arrives within `wait`.
    pub async fn recv_within(&mut self, wait: Duration) -> Option<Value> {
        let deadline = tokio::time::Instant::now() + wait;
        loop {
            let next = tokio::time::timeout_at(deadline, self.ws.next()).await.ok()?;
            match next {
                Some(Ok(Message::Text(text))) => return Some(serde_json::from_str(&text).unwrap()),
                Some(Ok(Message::Close(_))) | None => return None,
                Some(Ok(_)) => continue,
                Some(Err(e)) => panic!("websocket error: {}", e),
            }
        }
    }

    pub async fn close(mut self) {
        let _ = self.ws.close(None).await;
    }
}

#[derive(Default)]
struct CountingState {
    value: Mutex<Value>,
    handler: Mutex<Option<EventHandler>>,
    attaches: Mutex<usize>,
}

/// A device whose `activated` slot counts how often it is hooked.
///
/// `fire(value)` stores the value and runs the attached handler on the
/// calling thread.
pub struct CountingDevice {
    members: MemberTable<CountingState>,
    state: CountingState,
}

impl CountingDevice {
    pub fn new() -> Self {
        let members = MemberTable::<CountingState>::new("CountingDevice")
            .property("value", |s| Ok(PropertyValue::Plain(s.value.lock().clone())))
            .method("fire", |s, args| {
                *s.value.lock() = args.get(0, "value").cloned().unwrap_or(Value::Null);
                let handler = s.handler.lock().clone();
                if let Some(handler) = handler {
                    handler();
                }
                Ok(Value::Null)
            })
            .event("activated", |s, handler| {
                *s.attaches.lock() += 1;
                *s.handler.lock() = Some(handler);
            });
        Self {
            members,
            state: CountingState::default(),
        }
    }

    /// How many times a handler was attached.
    pub fn attaches(&self) -> usize {
        *self.state.attaches.lock()
    }
}

impl Default for CountingDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl Device for CountingDevice {
    fn class_name(&self) -> &str {
        self.members.class_name()
    }

    fn invoke(
        &self,
        name: &str,
        args: &[Value],
        kwargs: &Map<String, Value>,
    ) -> Result<Value, MemberError> {
        self.members.invoke(&self.state, name, args, kwargs)
    }

    fn read(&self, name: &str) -> Result<PropertyValue, MemberError> {
        self.members.read(&self.state, name)
    }

    fn write(&self, name: &str, value: Value) -> Result<(), MemberError> {
        self.members.write(&self.state, name, value)
    }

    fn hook(&self, slot: &str, handler: EventHandler) -> Result<(), MemberError> {
        self.members.hook(&self.state, slot, handler)
    }
}

/// A plain LED on GPIO17 and a button on GPIO4.
pub fn standard_devices() -> Vec<DeviceConfig> {
    vec![
        DeviceConfig::new("led1", "LED").with_arg(17),
        DeviceConfig::new("button1", "Button").with_kwarg("pin", 4),
    ]
}
