//! Connection registry.
//!
//! Tracks live client connections, their outbound queues, and the
//! subscription keys each one holds. A connection and its subscriptions live
//! in one entry, so removing the entry drops both in the same step and the
//! broadcaster never sees a half-removed connection.

use gpioproxy_core::{ConnectionId, SubscriptionKey};
use std::collections::{HashMap, HashSet};
use tokio::sync::{mpsc, RwLock};

/// Queue of serialized messages awaiting the connection's writer task.
pub type Outbound = mpsc::Sender<String>;

struct ConnectionEntry {
    outbound: Outbound,
    subscriptions: HashSet<SubscriptionKey>,
}

/// Registry of connected clients.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<ConnectionId, ConnectionEntry>>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection with its outbound queue.
    pub async fn register(&self, id: ConnectionId, outbound: Outbound) {
        let mut connections = self.connections.write().await;
        connections.insert(
            id,
            ConnectionEntry {
                outbound,
                subscriptions: HashSet::new(),
            },
        );
    }

    /// Remove a connection together with its subscriptions.
    pub async fn unregister(&self, id: ConnectionId) -> bool {
        let mut connections = self.connections.write().await;
        connections.remove(&id).is_some()
    }

    /// Record interest in `key`. Returns false if the connection is gone.
    pub async fn subscribe(&self, id: ConnectionId, key: SubscriptionKey) -> bool {
        let mut connections = self.connections.write().await;
        match connections.get_mut(&id) {
            Some(entry) => {
                entry.subscriptions.insert(key);
                true
            }
            None => false,
        }
    }

    /// Subscriptions held by a connection.
    pub async fn subscriptions_of(&self, id: ConnectionId) -> HashSet<SubscriptionKey> {
        let connections = self.connections.read().await;
        connections
            .get(&id)
            .map(|entry| entry.subscriptions.clone())
            .unwrap_or_default()
    }

    /// Snapshot of the connections subscribed to `key`.
    pub async fn subscribers_of(&self, key: &SubscriptionKey) -> Vec<(ConnectionId, Outbound)> {
        let connections = self.connections.read().await;
        connections
            .iter()
            .filter(|(_, entry)| entry.subscriptions.contains(key))
            .map(|(id, entry)| (*id, entry.outbound.clone()))
            .collect()
    }

    /// IDs of all live connections.
    pub async fn ids(&self) -> Vec<ConnectionId> {
        let connections = self.connections.read().await;
        connections.keys().copied().collect()
    }

    /// Number of live connections.
    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.connections.read().await.is_empty()
    }
}
