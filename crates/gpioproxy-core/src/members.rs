//! Per-class member tables.
//!
//! A [`MemberTable`] maps member names of one device class to methods,
//! properties and event slots. Device implementations build their table once
//! and forward the [`Device`](crate::device::Device) operations to it, so any
//! member of any device is reachable by name without open-ended reflection.

use crate::device::{event_slot, EventHandler, MemberError, PropertyValue};
use serde_json::{Map, Value};
use std::collections::HashMap;

type MethodFn<S> = Box<dyn Fn(&S, &Args<'_>) -> Result<Value, String> + Send + Sync>;
type GetterFn<S> = Box<dyn Fn(&S) -> Result<PropertyValue, String> + Send + Sync>;
type SetterFn<S> = Box<dyn Fn(&S, Value) -> Result<(), String> + Send + Sync>;
type SlotFn<S> = Box<dyn Fn(&S, EventHandler) + Send + Sync>;

enum Member<S> {
    Method(MethodFn<S>),
    Property {
        get: GetterFn<S>,
        set: Option<SetterFn<S>>,
    },
    Event(SlotFn<S>),
}

/// Member lookup table for one device class.
pub struct MemberTable<S> {
    class_name: String,
    members: HashMap<String, Member<S>>,
}

impl<S> MemberTable<S> {
    /// Create an empty table for `class_name`.
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            members: HashMap::new(),
        }
    }

    /// Register a callable method.
    pub fn method<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(&S, &Args<'_>) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.members.insert(name.to_string(), Member::Method(Box::new(f)));
        self
    }

    /// Register a read-only property.
    pub fn property<G>(mut self, name: &str, get: G) -> Self
    where
        G: Fn(&S) -> Result<PropertyValue, String> + Send + Sync + 'static,
    {
        self.members.insert(
            name.to_string(),
            Member::Property {
                get: Box::new(get),
                set: None,
            },
        );
        self
    }

    /// Register a read-write property.
    pub fn property_rw<G, W>(mut self, name: &str, get: G, set: W) -> Self
    where
        G: Fn(&S) -> Result<PropertyValue, String> + Send + Sync + 'static,
        W: Fn(&S, Value) -> Result<(), String> + Send + Sync + 'static,
    {
        self.members.insert(
            name.to_string(),
            Member::Property {
                get: Box::new(get),
                set: Some(Box::new(set)),
            },
        );
        self
    }

    /// Register the event slot `when_<event>`.
    pub fn event<F>(mut self, event: &str, attach: F) -> Self
    where
        F: Fn(&S, EventHandler) + Send + Sync + 'static,
    {
        self.members.insert(event_slot(event), Member::Event(Box::new(attach)));
        self
    }

    /// Class name this table describes.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Whether a member with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.members.contains_key(name)
    }

    /// Sorted member names.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.members.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Invoke the method `name` on `target`.
    pub fn invoke(
        &self,
        target: &S,
        name: &str,
        args: &[Value],
        kwargs: &Map<String, Value>,
    ) -> Result<Value, MemberError> {
        match self.members.get(name) {
            None => Err(MemberError::NotFound),
            Some(Member::Method(f)) => f(target, &Args::new(args, kwargs)).map_err(MemberError::Failed),
            Some(_) => Err(MemberError::NotCallable),
        }
    }

    /// Read the property `name` of `target`.
    pub fn read(&self, target: &S, name: &str) -> Result<PropertyValue, MemberError> {
        match self.members.get(name) {
            None => Err(MemberError::NotFound),
            Some(Member::Property { get, .. }) => get(target).map_err(MemberError::Failed),
            Some(_) => Err(MemberError::NotReadable),
        }
    }

    /// Assign `value` to the property `name` of `target`.
    pub fn write(&self, target: &S, name: &str, value: Value) -> Result<(), MemberError> {
        match self.members.get(name) {
            None => Err(MemberError::NotFound),
            Some(Member::Property { set: Some(set), .. }) => {
                set(target, value).map_err(MemberError::Failed)
            }
            Some(Member::Property { set: None, .. }) => Err(MemberError::ReadOnly),
            Some(_) => Err(MemberError::NotWritable),
        }
    }

    /// Attach `handler` to the event slot `slot` of `target`.
    pub fn hook(&self, target: &S, slot: &str, handler: EventHandler) -> Result<(), MemberError> {
        match self.members.get(slot) {
            Some(Member::Event(attach)) => {
                attach(target, handler);
                Ok(())
            }
            _ => Err(MemberError::NotFound),
        }
    }
}

/// Positional and named arguments of a method call.
#[derive(Debug, Clone, Copy)]
pub struct Args<'a> {
    positional: &'a [Value],
    named: &'a Map<String, Value>,
}

impl<'a> Args<'a> {
    pub fn new(positional: &'a [Value], named: &'a Map<String, Value>) -> Self {
        Self { positional, named }
    }

    /// Check the call against a parameter list.
    ///
    /// Rejects surplus positional arguments, unknown keywords, and
    /// parameters passed both positionally and by name.
    pub fn check(&self, params: &[&str]) -> Result<(), String> {
        if self.positional.len() > params.len() {
            return Err(format!(
                "takes {} positional arguments but {} were given",
                params.len(),
                self.positional.len()
            ));
        }
        for key in self.named.keys() {
            match params.iter().position(|p| p == key) {
                None => return Err(format!("got an unexpected keyword argument '{}'", key)),
                Some(i) if i < self.positional.len() => {
                    return Err(format!("got multiple values for argument '{}'", key))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Argument at `index`, or the keyword `name`.
    pub fn get(&self, index: usize, name: &str) -> Option<&'a Value> {
        self.positional
            .get(index)
            .or_else(|| self.named.get(name))
    }

    /// Float argument with a default; `null` means the default.
    pub fn f64_or(&self, index: usize, name: &str, default: f64) -> Result<f64, String> {
        match self.get(index, name) {
            None | Some(Value::Null) => Ok(default),
            Some(v) => v
                .as_f64()
                .ok_or_else(|| format!("argument '{}' must be a number", name)),
        }
    }

    /// Boolean argument with a default; numbers are truthy when non-zero.
    pub fn bool_or(&self, index: usize, name: &str, default: bool) -> Result<bool, String> {
        match self.get(index, name) {
            None | Some(Value::Null) => Ok(default),
            Some(v) => as_bool(v).ok_or_else(|| format!("argument '{}' must be a boolean", name)),
        }
    }

    /// Optional non-negative integer argument.
    pub fn opt_u64(&self, index: usize, name: &str) -> Result<Option<u64>, String> {
        match self.get(index, name) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => as_u64(v)
                .map(Some)
                .ok_or_else(|| format!("argument '{}' must be a non-negative integer", name)),
        }
    }
}

/// Interpret a JSON number as a non-negative integer, accepting integral floats.
pub fn as_u64(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u64::MAX as f64)
            .map(|f| f as u64)
    })
}

/// Interpret a JSON value as a boolean: `true`/`false` or any number.
pub fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        _ => None,
    }
}

/// Convert a float to JSON, failing for values JSON cannot represent.
pub fn number(value: f64) -> Result<Value, String> {
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .ok_or_else(|| format!("Object of value {} is not JSON serializable", value))
}
