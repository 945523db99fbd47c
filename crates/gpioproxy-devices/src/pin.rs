//! Simulated GPIO pins.
//!
//! Every device reserves its pin from a shared [`MockPinFactory`]. Input pins
//! are driven from the outside with [`Pin::drive`], which runs the owning
//! device's edge callback on the calling thread the way a hardware interrupt
//! handler would.

use crate::error::DeviceError;
use crate::Result;
use gpioproxy_core::device::ValueHolder;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Callback run on a level change, with the new level (`true` = high).
pub type EdgeCallback = Arc<dyn Fn(bool) + Send + Sync>;

/// Default PWM frequency in Hz.
pub const DEFAULT_FREQUENCY: f64 = 100.0;

struct PinState {
    /// Duty cycle in `[0, 1]`; digital pins only use 0 and 1.
    level: f64,
    frequency: f64,
    edge: Option<EdgeCallback>,
}

/// One simulated GPIO pin.
pub struct Pin {
    number: u32,
    state: Mutex<PinState>,
}

impl std::fmt::Debug for Pin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pin")
            .field("number", &self.number)
            .field("level", &self.level())
            .finish()
    }
}

impl Pin {
    fn new(number: u32) -> Self {
        Self {
            number,
            state: Mutex::new(PinState {
                level: 0.0,
                frequency: DEFAULT_FREQUENCY,
                edge: None,
            }),
        }
    }

    /// GPIO number.
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Current level as a duty cycle.
    pub fn level(&self) -> f64 {
        self.state.lock().level
    }

    /// Whether the pin reads high.
    pub fn is_high(&self) -> bool {
        self.level() > 0.0
    }

    /// Set the output level without triggering edge callbacks.
    pub fn set_level(&self, level: f64) {
        self.state.lock().level = level;
    }

    /// PWM frequency in Hz.
    pub fn frequency(&self) -> f64 {
        self.state.lock().frequency
    }

    pub fn set_frequency(&self, frequency: f64) {
        self.state.lock().frequency = frequency;
    }

    /// Install or clear the edge callback.
    pub fn on_edge(&self, callback: Option<EdgeCallback>) {
        self.state.lock().edge = callback;
    }

    /// Drive the pin from outside, as external hardware would.
    ///
    /// Runs the edge callback on the calling thread when the level changes.
    pub fn drive(&self, high: bool) {
        let level = if high { 1.0 } else { 0.0 };
        let callback = {
            let mut state = self.state.lock();
            if state.level == level {
                return;
            }
            state.level = level;
            state.edge.clone()
        };

        debug!("GPIO{} driven {}", self.number, if high { "high" } else { "low" });
        if let Some(callback) = callback {
            callback(high);
        }
    }
}

/// Pin reference exposed as a device's `pin` property; reads as its number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinNumber(pub u32);

impl ValueHolder for PinNumber {
    fn value(&self) -> serde_json::Value {
        serde_json::Value::from(self.0)
    }
}

/// Factory handing out exclusive pin reservations.
#[derive(Default)]
pub struct MockPinFactory {
    reserved: Mutex<HashMap<u32, Arc<Pin>>>,
}

impl MockPinFactory {
    /// Create an empty factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a pin for exclusive use.
    pub fn reserve(&self, number: u32) -> Result<Arc<Pin>> {
        let mut reserved = self.reserved.lock();
        if reserved.contains_key(&number) {
            return Err(DeviceError::PinInUse(number));
        }
        let pin = Arc::new(Pin::new(number));
        reserved.insert(number, pin.clone());
        Ok(pin)
    }

    /// Release a reservation. Releasing a free pin is a no-op.
    pub fn release(&self, number: u32) {
        if let Some(pin) = self.reserved.lock().remove(&number) {
            pin.on_edge(None);
        }
    }

    /// Get a reserved pin, e.g. to drive it.
    pub fn pin(&self, number: u32) -> Option<Arc<Pin>> {
        self.reserved.lock().get(&number).cloned()
    }

    /// Reserved pin numbers, sorted.
    pub fn reserved(&self) -> Vec<u32> {
        let mut numbers: Vec<u32> = self.reserved.lock().keys().copied().collect();
        numbers.sort_unstable();
        numbers
    }
}
