//! Event slots of a device.

use gpioproxy_core::EventHandler;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Handlers attached to a device's `when_<event>` slots.
///
/// Each slot holds at most one handler; assigning replaces the previous one.
#[derive(Default)]
pub struct EventSlots {
    handlers: Mutex<HashMap<&'static str, EventHandler>>,
}

impl EventSlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign the handler for `event`.
    pub fn set(&self, event: &'static str, handler: EventHandler) {
        self.handlers.lock().insert(event, handler);
    }

    /// Drop every handler.
    pub fn clear(&self) {
        self.handlers.lock().clear();
    }

    /// Run the handler for `event`, if any, on the calling thread.
    pub fn fire(&self, event: &str) {
        // Clone out so the handler runs without the slot lock held.
        let handler = self.handlers.lock().get(event).cloned();
        if let Some(handler) = handler {
            handler();
        }
    }
}
