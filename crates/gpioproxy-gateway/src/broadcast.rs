//! Broadcast of device events to subscribed connections.
//!
//! Devices raise events on their own threads. [`EventPublisher::publish`]
//! only enqueues the event and returns; the [`Broadcaster`] task running on
//! the gateway's runtime drains the queue and fans each event out to the
//! outbound queue of every subscribed connection.

use crate::connections::ConnectionRegistry;
use crate::rpc::JsonRpcNotification;
use gpioproxy_core::SubscriptionKey;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, error, warn};

/// An event raised by a device.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceEvent {
    pub device_id: String,
    pub event: String,
    /// The device's current value when the event fired.
    pub data: Value,
}

impl DeviceEvent {
    /// Broadcast address of this event.
    pub fn key(&self) -> SubscriptionKey {
        SubscriptionKey::new(&self.device_id, &self.event)
    }
}

/// Thread-safe handle for publishing device events.
#[derive(Clone)]
pub struct EventPublisher {
    tx: mpsc::UnboundedSender<DeviceEvent>,
}

impl EventPublisher {
    /// Create a publisher and the receiving end consumed by a [`Broadcaster`].
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<DeviceEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Schedule delivery of an event. Never blocks; callable from any thread.
    pub fn publish(&self, device_id: &str, event: &str, data: Value) {
        let event = DeviceEvent {
            device_id: device_id.to_string(),
            event: event.to_string(),
            data,
        };
        if let Err(mpsc::error::SendError(event)) = self.tx.send(event) {
            debug!("Broadcaster stopped; dropping {}", event.key());
        }
    }
}

/// Fans device events out to subscribed connections.
pub struct Broadcaster {
    connections: Arc<ConnectionRegistry>,
}

impl Broadcaster {
    pub fn new(connections: Arc<ConnectionRegistry>) -> Self {
        Self { connections }
    }

    /// Deliver one event. Returns the number of connections it was queued for.
    ///
    /// Each delivery is a non-blocking enqueue, so a slow or dead connection
    /// never holds up the others.
    pub async fn deliver(&self, event: &DeviceEvent) -> usize {
        let key = event.key();
        let notification =
            JsonRpcNotification::device_event(&event.device_id, &event.event, event.data.clone());
        let text = match serde_json::to_string(&notification) {
            Ok(text) => text,
            Err(e) => {
                error!("Failed to encode event {}: {}", key, e);
                return 0;
            }
        };

        let mut delivered = 0;
        for (id, outbound) in self.connections.subscribers_of(&key).await {
            match outbound.try_send(text.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    warn!("Outbound queue full for client {}; dropping {}", id, key)
                }
                Err(TrySendError::Closed(_)) => {
                    debug!("Client {} gone; dropping {}", id, key)
                }
            }
        }
        debug!("Broadcast {} to {} clients", key, delivered);
        delivered
    }

    /// Deliver events until every publisher is dropped.
    pub async fn run(self, mut events: mpsc::UnboundedReceiver<DeviceEvent>) {
        while let Some(event) = events.recv().await {
            self.deliver(&event).await;
        }
        debug!("Broadcast pump stopped");
    }
}
