//! Stub devices shared by the unit tests.

use gpioproxy_core::device::ValueHolder;
use gpioproxy_core::{
    Device, DeviceLookup, EventHandler, MemberError, MemberTable, PropertyValue,
};
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug)]
struct PinHolder(u32);

impl ValueHolder for PinHolder {
    fn value(&self) -> Value {
        json!(self.0)
    }
}

#[derive(Default)]
struct StubState {
    value: Mutex<Value>,
    handlers: Mutex<HashMap<String, EventHandler>>,
    hooks: Mutex<HashMap<String, usize>>,
}

impl StubState {
    fn attach(&self, slot: &str, handler: EventHandler) {
        *self.hooks.lock().entry(slot.to_string()).or_default() += 1;
        self.handlers.lock().insert(slot.to_string(), handler);
    }
}

/// A device with a writable `value`, a read-only `pin` holder, a failing
/// `explode()` method and `activated`/`deactivated` slots that count hooks.
pub struct StubDevice {
    members: MemberTable<StubState>,
    state: StubState,
}

impl StubDevice {
    pub fn new() -> Self {
        let members = MemberTable::<StubState>::new("Stub")
            .property_rw(
                "value",
                |s| Ok(PropertyValue::Plain(s.value.lock().clone())),
                |s, v| {
                    *s.value.lock() = v;
                    Ok(())
                },
            )
            .property("pin", |_| Ok(PropertyValue::Holder(Arc::new(PinHolder(17)))))
            .method("explode", |_, _| Err("pin exploded".to_string()))
            .method("echo", |_, args| {
                Ok(args.get(0, "value").cloned().unwrap_or(Value::Null))
            })
            .event("activated", |s, h| s.attach("when_activated", h))
            .event("deactivated", |s, h| s.attach("when_deactivated", h));

        let state = StubState::default();
        *state.value.lock() = json!(0);
        Self { members, state }
    }

    /// How many times a handler was attached to `slot`.
    pub fn hook_count(&self, slot: &str) -> usize {
        self.state.hooks.lock().get(slot).copied().unwrap_or(0)
    }

    /// Run the handler attached to `slot`, if any.
    pub fn fire(&self, slot: &str) {
        let handler = self.state.handlers.lock().get(slot).cloned();
        if let Some(handler) = handler {
            handler();
        }
    }
}

impl Device for StubDevice {
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

/// Fixed lookup over a map of devices.
#[derive(Default)]
pub struct StaticLookup {
    devices: HashMap<String, Arc<dyn Device>>,
}

impl StaticLookup {
    pub fn with(mut self, id: &str, device: Arc<dyn Device>) -> Self {
        self.devices.insert(id.to_string(), device);
        self
    }
}

impl DeviceLookup for StaticLookup {
    fn get(&self, device_id: &str) -> Option<Arc<dyn Device>> {
        self.devices.get(device_id).cloned()
    }
}
