//! Generic member access on proxied devices.
//!
//! Translates the tagged [`MemberError`] a device reports into the
//! JSON-RPC error the caller sees: lookup failures become invalid params,
//! failures raised by the member itself become internal errors carrying
//! the member's own message. Reading a method or event slot finds the
//! member but cannot encode it, so it is an internal error too.

use crate::error::GatewayError;
use crate::Result;
use gpioproxy_core::{Device, MemberError};
use serde_json::{Map, Value};

/// Invoke the method `method` on `device`.
pub fn invoke(
    device: &dyn Device,
    method: &str,
    args: &[Value],
    kwargs: &Map<String, Value>,
) -> Result<Value> {
    device.invoke(method, args, kwargs).map_err(|e| match e {
        MemberError::NotFound => {
            GatewayError::InvalidParams(format!("Method '{}' not found on device", method))
        }
        MemberError::NotCallable => {
            GatewayError::InvalidParams(format!("'{}' is not callable", method))
        }
        other => internal(other),
    })
}

/// Read the property `property` of `device`, unwrapping value holders.
pub fn read_property(device: &dyn Device, property: &str) -> Result<Value> {
    device
        .read(property)
        .map(|value| value.into_value())
        .map_err(|e| match e {
            MemberError::NotFound => not_found(property),
            MemberError::NotReadable => {
                GatewayError::Internal(format!("'{}' is not JSON serializable", property))
            }
            other => internal(other),
        })
}

/// Assign `value` to the property `property` of `device`.
pub fn write_property(device: &dyn Device, property: &str, value: Value) -> Result<()> {
    device.write(property, value).map_err(|e| match e {
        MemberError::NotFound => not_found(property),
        MemberError::NotWritable => {
            GatewayError::InvalidParams(format!("'{}' is not a writable property", property))
        }
        other => internal(other),
    })
}

fn not_found(property: &str) -> GatewayError {
    GatewayError::InvalidParams(format!("Property '{}' not found on device", property))
}

fn internal(error: MemberError) -> GatewayError {
    match error {
        MemberError::Failed(message) => GatewayError::Internal(message),
        other => GatewayError::Internal(other.to_string()),
    }
}
