//! Device capability interface.
//!
//! The proxy never knows what a device physically is. Every device exposes
//! the same three generic operations (invoke a method, read a property,
//! write a property) plus event hooking, each answering with a tagged
//! [`MemberError`] when the named member is missing or of the wrong kind.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Callback attached to a device event slot.
///
/// Devices invoke it synchronously from whatever thread raised the event.
pub type EventHandler = Arc<dyn Fn() + Send + Sync>;

/// Prefix of the member naming an event slot (`when_pressed`, ...).
pub const EVENT_SLOT_PREFIX: &str = "when_";

/// Name of the event slot member for an event.
pub fn event_slot(event: &str) -> String {
    format!("{}{}", EVENT_SLOT_PREFIX, event)
}

/// Outcome of a member lookup that did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemberError {
    /// No member with that name.
    #[error("member not found")]
    NotFound,

    /// The member exists but cannot be invoked.
    #[error("member is not callable")]
    NotCallable,

    /// The member exists but is not a readable property.
    #[error("member is not a readable property")]
    NotReadable,

    /// The member exists but is not a writable property.
    #[error("member is not a writable property")]
    NotWritable,

    /// The property has no setter.
    #[error("can't set attribute")]
    ReadOnly,

    /// The member ran and failed.
    #[error("{0}")]
    Failed(String),
}

impl MemberError {
    /// Build a [`MemberError::Failed`] from any displayable error.
    pub fn failed(message: impl fmt::Display) -> Self {
        Self::Failed(message.to_string())
    }
}

/// An object that wraps a primitive behind a nested `value`.
pub trait ValueHolder: Send + Sync + fmt::Debug {
    /// The wrapped primitive.
    fn value(&self) -> Value;
}

/// The raw result of reading a property.
#[derive(Debug, Clone)]
pub enum PropertyValue {
    /// A JSON value ready for the wire.
    Plain(Value),

    /// A wrapper object; readers unwrap one level to its `value`.
    Holder(Arc<dyn ValueHolder>),
}

impl PropertyValue {
    /// Flatten to the primitive that goes on the wire.
    pub fn into_value(self) -> Value {
        match self {
            Self::Plain(value) => value,
            Self::Holder(holder) => holder.value(),
        }
    }
}

impl From<Value> for PropertyValue {
    fn from(value: Value) -> Self {
        Self::Plain(value)
    }
}

/// A proxied device.
pub trait Device: Send + Sync {
    /// Class name the device was constructed from.
    fn class_name(&self) -> &str;

    /// Invoke the method `name`.
    fn invoke(&self, name: &str, args: &[Value], kwargs: &Map<String, Value>)
        -> Result<Value, MemberError>;

    /// Read the property `name`.
    fn read(&self, name: &str) -> Result<PropertyValue, MemberError>;

    /// Assign `value` to the property `name`.
    fn write(&self, name: &str, value: Value) -> Result<(), MemberError>;

    /// Attach `handler` to the event slot `slot`, replacing any previous one.
    fn hook(&self, slot: &str, handler: EventHandler) -> Result<(), MemberError>;

    /// Current value reported alongside events.
    fn current_value(&self) -> Value {
        self.read("value")
            .map(PropertyValue::into_value)
            .unwrap_or(Value::Null)
    }

    /// Release the device's resources.
    fn close(&self) {}
}

/// Lookup from device ID to device.
pub trait DeviceLookup: Send + Sync {
    /// Get a device by ID.
    fn get(&self, device_id: &str) -> Option<Arc<dyn Device>>;
}

/// Entry of the static device catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// Device ID.
    pub id: String,

    /// Configured class name.
    #[serde(rename = "class")]
    pub class_name: String,
}

impl DeviceDescriptor {
    pub fn new(id: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            class_name: class_name.into(),
        }
    }
}
