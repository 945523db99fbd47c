//! Device class registry.
//!
//! Maps configured class names to constructors taking the configured
//! positional and named arguments.

use crate::error::DeviceError;
use crate::input::{DigitalInputDevice, InputKind};
use crate::output::{DigitalOutputDevice, OutputKind, OutputOptions};
use crate::pin::MockPinFactory;
use crate::pwm::{PwmKind, PwmOptions, PwmOutputDevice};
use crate::Result;
use gpioproxy_core::config::DeviceConfig;
use gpioproxy_core::members::as_u64;
use gpioproxy_core::{Args, Device};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Constructor for one device class.
pub type Constructor =
    Arc<dyn Fn(&Args<'_>, &Arc<MockPinFactory>) -> Result<Arc<dyn Device>> + Send + Sync>;

/// Registry of constructible device classes.
pub struct DeviceFactory {
    pins: Arc<MockPinFactory>,
    classes: HashMap<String, Constructor>,
}

impl Default for DeviceFactory {
    fn default() -> Self {
        Self::new(Arc::new(MockPinFactory::new()))
    }
}

impl DeviceFactory {
    /// Create a factory with the built-in classes, reserving pins from `pins`.
    pub fn new(pins: Arc<MockPinFactory>) -> Self {
        let mut factory = Self {
            pins,
            classes: HashMap::new(),
        };
        factory.register_builtin();
        factory
    }

    /// The pin factory devices reserve from.
    pub fn pins(&self) -> &Arc<MockPinFactory> {
        &self.pins
    }

    /// Register a class constructor, replacing any previous one.
    pub fn register(&mut self, class_name: impl Into<String>, constructor: Constructor) {
        let class_name = class_name.into();
        debug!("Registering device class: {}", class_name);
        self.classes.insert(class_name, constructor);
    }

    /// Registered class names, sorted.
    pub fn classes(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.classes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Construct the device described by `config`.
    pub fn create(&self, config: &DeviceConfig) -> Result<Arc<dyn Device>> {
        let constructor = self
            .classes
            .get(&config.class_name)
            .ok_or_else(|| DeviceError::UnknownClass(config.class_name.clone()))?;
        constructor(&Args::new(&config.args, &config.kwargs), &self.pins)
    }

    fn register_builtin(&mut self) {
        for kind in [OutputKind::DigitalOutputDevice, OutputKind::Led, OutputKind::Buzzer] {
            self.register(
                kind.class_name(),
                Arc::new(move |args: &Args<'_>, pins: &Arc<MockPinFactory>| -> Result<Arc<dyn Device>> {
                    let class = kind.class_name();
                    let parsed = Parsed::new(class, args, &["pin", "active_high", "initial_value"])?;
                    let options = OutputOptions {
                        active_high: parsed.bool_or(1, "active_high", true)?,
                        initial_value: parsed.bool_or(2, "initial_value", false)?,
                    };
                    let device = DigitalOutputDevice::new(kind, pins.clone(), parsed.pin()?, options)?;
                    Ok(Arc::new(device) as Arc<dyn Device>)
                }),
            );
        }

        for kind in [PwmKind::PwmOutputDevice, PwmKind::PwmLed] {
            self.register(
                kind.class_name(),
                Arc::new(move |args: &Args<'_>, pins: &Arc<MockPinFactory>| -> Result<Arc<dyn Device>> {
                    let class = kind.class_name();
                    let parsed = Parsed::new(
                        class,
                        args,
                        &["pin", "active_high", "initial_value", "frequency"],
                    )?;
                    let defaults = PwmOptions::default();
                    let options = PwmOptions {
                        active_high: parsed.bool_or(1, "active_high", defaults.active_high)?,
                        initial_value: parsed.f64_or(2, "initial_value", defaults.initial_value)?,
                        frequency: parsed.f64_or(3, "frequency", defaults.frequency)?,
                    };
                    let device = PwmOutputDevice::new(kind, pins.clone(), parsed.pin()?, options)?;
                    Ok(Arc::new(device) as Arc<dyn Device>)
                }),
            );
        }

        for kind in [InputKind::DigitalInputDevice, InputKind::Button, InputKind::MotionSensor] {
            self.register(
                kind.class_name(),
                Arc::new(move |args: &Args<'_>, pins: &Arc<MockPinFactory>| -> Result<Arc<dyn Device>> {
                    let class = kind.class_name();
                    let parsed = Parsed::new(class, args, &["pin", "pull_up"])?;
                    let pull_up = match args.get(1, "pull_up") {
                        None | Some(Value::Null) => None,
                        Some(_) => Some(parsed.bool_or(1, "pull_up", kind.default_pull_up())?),
                    };
                    let device = DigitalInputDevice::new(kind, pins.clone(), parsed.pin()?, pull_up)?;
                    Ok(Arc::new(device) as Arc<dyn Device>)
                }),
            );
        }
    }
}

/// Constructor arguments checked against a parameter list.
struct Parsed<'a, 'b> {
    class: &'static str,
    args: &'b Args<'a>,
}

impl<'a, 'b> Parsed<'a, 'b> {
    fn new(class: &'static str, args: &'b Args<'a>, params: &[&str]) -> Result<Self> {
        args.check(params)
            .map_err(|message| DeviceError::invalid_argument(class, message))?;
        Ok(Self { class, args })
    }

    fn invalid(&self, message: String) -> DeviceError {
        DeviceError::invalid_argument(self.class, message)
    }

    /// The pin, as an integer or a `GPIO<n>`/`BCM<n>` name.
    fn pin(&self) -> Result<u32> {
        let value = self
            .args
            .get(0, "pin")
            .filter(|v| !v.is_null())
            .ok_or_else(|| self.invalid("missing required argument 'pin'".to_string()))?;
        parse_pin(value).ok_or_else(|| self.invalid(format!("got an invalid pin {}", value)))
    }

    fn bool_or(&self, index: usize, name: &str, default: bool) -> Result<bool> {
        self.args
            .bool_or(index, name, default)
            .map_err(|message| self.invalid(message))
    }

    fn f64_or(&self, index: usize, name: &str, default: f64) -> Result<f64> {
        self.args
            .f64_or(index, name, default)
            .map_err(|message| self.invalid(message))
    }
}

fn parse_pin(value: &Value) -> Option<u32> {
    let number = match value {
        Value::String(name) => {
            let upper = name.trim().to_ascii_uppercase();
            let digits = upper
                .strip_prefix("GPIO")
                .or_else(|| upper.strip_prefix("BCM"))
                .unwrap_or(&upper);
            digits.parse::<u64>().ok()?
        }
        other => as_u64(other)?,
    };
    u32::try_from(number).ok()
}
