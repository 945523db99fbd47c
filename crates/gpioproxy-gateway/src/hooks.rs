//! Event hook manager.

use crate::broadcast::EventPublisher;
use gpioproxy_core::device::event_slot;
use gpioproxy_core::{Device, EventHandler, SubscriptionKey};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

/// Attaches at most one broadcast callback per `deviceId:eventName`.
///
/// Hooks are never removed: once attached, a key keeps broadcasting for the
/// lifetime of the device, whether or not anyone is still subscribed.
pub struct HookManager {
    hooked: Mutex<HashSet<SubscriptionKey>>,
    publisher: EventPublisher,
}

impl HookManager {
    pub fn new(publisher: EventPublisher) -> Self {
        Self {
            hooked: Mutex::new(HashSet::new()),
            publisher,
        }
    }

    /// Hook `event` on `device` unless already hooked. Returns whether the key
    /// is hooked afterwards.
    ///
    /// A device without a `when_<event>` slot is logged and left unhooked.
    pub fn ensure_hooked(&self, device_id: &str, event: &str, device: &Arc<dyn Device>) -> bool {
        let key = SubscriptionKey::new(device_id, event);
        // Held across the attach so concurrent subscribers cannot both hook.
        let mut hooked = self.hooked.lock();
        if hooked.contains(&key) {
            return true;
        }

        let slot = event_slot(event);
        let weak = Arc::downgrade(device);
        let publisher = self.publisher.clone();
        let (id, name) = (device_id.to_string(), event.to_string());
        let handler: EventHandler = Arc::new(move || {
            let data = weak
                .upgrade()
                .map(|device| device.current_value())
                .unwrap_or(Value::Null);
            publisher.publish(&id, &name, data);
        });

        match device.hook(&slot, handler) {
            Ok(()) => {
                hooked.insert(key);
                info!("Hooked event {} for {}", slot, device_id);
                true
            }
            Err(_) => {
                warn!("Device {} has no event {}", device_id, slot);
                false
            }
        }
    }

    /// Whether a key has a broadcast callback attached.
    pub fn is_hooked(&self, key: &SubscriptionKey) -> bool {
        self.hooked.lock().contains(key)
    }

    /// Number of hooked keys.
    pub fn len(&self) -> usize {
        self.hooked.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooked.lock().is_empty()
    }
}
