//! PWM output devices: `PWMOutputDevice`, `PWMLED`.

use crate::events::EventSlots;
use crate::pin::{MockPinFactory, Pin, PinNumber};
use crate::Result;
use gpioproxy_core::members::{as_bool, number};
use gpioproxy_core::{MemberTable, PropertyValue};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// The class a PWM device was constructed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PwmKind {
    PwmOutputDevice,
    PwmLed,
}

impl PwmKind {
    pub fn class_name(&self) -> &'static str {
        self.members().class_name()
    }

    fn members(&self) -> &'static MemberTable<PwmOutputDevice> {
        match self {
            Self::PwmOutputDevice => &PWM_OUTPUT_MEMBERS,
            Self::PwmLed => &PWM_LED_MEMBERS,
        }
    }
}

/// Construction options for PWM devices.
#[derive(Debug, Clone, Copy)]
pub struct PwmOptions {
    pub active_high: bool,
    /// Starting duty cycle in `[0, 1]`.
    pub initial_value: f64,
    /// PWM frequency in Hz.
    pub frequency: f64,
}

impl Default for PwmOptions {
    fn default() -> Self {
        Self {
            active_high: true,
            initial_value: 0.0,
            frequency: crate::pin::DEFAULT_FREQUENCY,
        }
    }
}

/// A device driving one pin with a variable duty cycle.
pub struct PwmOutputDevice {
    members: &'static MemberTable<PwmOutputDevice>,
    pin: Arc<Pin>,
    pins: Arc<MockPinFactory>,
    active_high: bool,
    value: Mutex<f64>,
    events: EventSlots,
    closed: AtomicBool,
}

impl PwmOutputDevice {
    /// Reserve `pin` and create the device.
    pub fn new(
        kind: PwmKind,
        pins: Arc<MockPinFactory>,
        pin: u32,
        options: PwmOptions,
    ) -> Result<Self> {
        check_duty_cycle(options.initial_value)
            .and_then(|_| check_frequency(options.frequency))
            .map_err(|message| crate::DeviceError::invalid_argument(kind.class_name(), message))?;

        let pin = pins.reserve(pin)?;
        pin.set_frequency(options.frequency);
        let device = Self {
            members: kind.members(),
            pin,
            pins,
            active_high: options.active_high,
            value: Mutex::new(options.initial_value),
            events: EventSlots::new(),
            closed: AtomicBool::new(false),
        };
        device.pin.set_level(device.level_for(options.initial_value));
        Ok(device)
    }

    fn level_for(&self, value: f64) -> f64 {
        if self.active_high {
            value
        } else {
            1.0 - value
        }
    }

    pub fn value(&self) -> f64 {
        *self.value.lock()
    }

    pub fn is_active(&self) -> bool {
        self.value() > 0.0
    }

    pub fn pin_number(&self) -> u32 {
        self.pin.number()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Set the duty cycle, firing `activated`/`deactivated` when crossing zero.
    pub fn set_value(&self, value: f64) -> std::result::Result<(), String> {
        if self.is_closed() {
            return Err("Device is closed".to_string());
        }
        check_duty_cycle(value)?;

        let previous = {
            let mut current = self.value.lock();
            let previous = *current;
            *current = value;
            self.pin.set_level(self.level_for(value));
            previous
        };

        if previous == 0.0 && value > 0.0 {
            self.events.fire("activated");
        } else if previous > 0.0 && value == 0.0 {
            self.events.fire("deactivated");
        }
        Ok(())
    }

    pub fn frequency(&self) -> f64 {
        self.pin.frequency()
    }

    pub fn set_frequency(&self, frequency: f64) -> std::result::Result<(), String> {
        check_frequency(frequency)?;
        self.pin.set_frequency(frequency);
        Ok(())
    }

    /// Detach handlers and release the pin.
    pub fn shutdown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.events.clear();
        *self.value.lock() = 0.0;
        self.pin.set_level(self.level_for(0.0));
        self.pins.release(self.pin_number());
        debug!("Closed {} on GPIO{}", self.members.class_name(), self.pin_number());
    }
}

impl Drop for PwmOutputDevice {
    fn drop(&mut self) {
        self.shutdown();
    }
}

forward_device_to_members!(PwmOutputDevice);

fn check_duty_cycle(value: f64) -> std::result::Result<(), String> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err("PWM value must be between 0 and 1".to_string())
    }
}

fn check_frequency(frequency: f64) -> std::result::Result<(), String> {
    if frequency.is_finite() && frequency > 0.0 {
        Ok(())
    } else {
        Err("frequency must be greater than 0".to_string())
    }
}

fn duty_cycle_arg(value: &Value) -> std::result::Result<f64, String> {
    value
        .as_f64()
        .or_else(|| as_bool(value).map(|on| if on { 1.0 } else { 0.0 }))
        .ok_or_else(|| "value must be a number".to_string())
}

fn pwm_members(class_name: &str) -> MemberTable<PwmOutputDevice> {
    MemberTable::<PwmOutputDevice>::new(class_name)
        .property_rw(
            "value",
            |d| number(d.value()).map(PropertyValue::from),
            |d, v| d.set_value(duty_cycle_arg(&v)?),
        )
        .property("is_active", |d| Ok(json!(d.is_active()).into()))
        .property("active_high", |d| Ok(json!(d.active_high).into()))
        .property("closed", |d| Ok(json!(d.is_closed()).into()))
        .property("pin", |d| {
            Ok(PropertyValue::Holder(Arc::new(PinNumber(d.pin_number()))))
        })
        .property_rw(
            "frequency",
            |d| number(d.frequency()).map(PropertyValue::from),
            |d, v| {
                let frequency = v.as_f64().ok_or("frequency must be a number")?;
                d.set_frequency(frequency)
            },
        )
        .method("on", |d, args| {
            args.check(&[])?;
            d.set_value(1.0).map(|_| Value::Null)
        })
        .method("off", |d, args| {
            args.check(&[])?;
            d.set_value(0.0).map(|_| Value::Null)
        })
        .method("toggle", |d, args| {
            args.check(&[])?;
            d.set_value(1.0 - d.value()).map(|_| Value::Null)
        })
        .method("close", |d, args| {
            args.check(&[])?;
            d.shutdown();
            Ok(Value::Null)
        })
        .event("activated", |d, handler| d.events.set("activated", handler))
        .event("deactivated", |d, handler| d.events.set("deactivated", handler))
}

static PWM_OUTPUT_MEMBERS: Lazy<MemberTable<PwmOutputDevice>> =
    Lazy::new(|| pwm_members("PWMOutputDevice"));

static PWM_LED_MEMBERS: Lazy<MemberTable<PwmOutputDevice>> = Lazy::new(|| {
    pwm_members("PWMLED").property("is_lit", |d| Ok(json!(d.is_active()).into()))
});
