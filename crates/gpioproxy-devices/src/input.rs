//! Digital input devices: `DigitalInputDevice`, `Button`, `MotionSensor`.

use crate::events::EventSlots;
use crate::pin::{MockPinFactory, Pin, PinNumber};
use crate::Result;
use gpioproxy_core::{MemberTable, PropertyValue};
use once_cell::sync::Lazy;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// The class an input device was constructed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    DigitalInputDevice,
    Button,
    MotionSensor,
}

impl InputKind {
    pub fn class_name(&self) -> &'static str {
        self.members().class_name()
    }

    /// Whether the pin is pulled up unless configured otherwise.
    pub fn default_pull_up(&self) -> bool {
        matches!(self, Self::Button)
    }

    /// Class-specific names fired alongside `activated`/`deactivated`.
    fn aliases(&self) -> Option<(&'static str, &'static str)> {
        match self {
            Self::DigitalInputDevice => None,
            Self::Button => Some(("pressed", "released")),
            Self::MotionSensor => Some(("motion", "no_motion")),
        }
    }

    fn members(&self) -> &'static MemberTable<DigitalInputDevice> {
        match self {
            Self::DigitalInputDevice => &DIGITAL_INPUT_MEMBERS,
            Self::Button => &BUTTON_MEMBERS,
            Self::MotionSensor => &MOTION_SENSOR_MEMBERS,
        }
    }
}

/// A device reading one digital input pin.
pub struct DigitalInputDevice {
    members: &'static MemberTable<DigitalInputDevice>,
    pin: Arc<Pin>,
    pins: Arc<MockPinFactory>,
    pull_up: bool,
    events: Arc<EventSlots>,
    closed: AtomicBool,
}

impl DigitalInputDevice {
    /// Reserve `pin` and create the device. `pull_up` falls back to the
    /// class default.
    pub fn new(
        kind: InputKind,
        pins: Arc<MockPinFactory>,
        pin: u32,
        pull_up: Option<bool>,
    ) -> Result<Self> {
        let pull_up = pull_up.unwrap_or_else(|| kind.default_pull_up());
        let pin = pins.reserve(pin)?;
        // Idle level follows the pull resistor; active is the opposite level.
        pin.set_level(if pull_up { 1.0 } else { 0.0 });

        let events = Arc::new(EventSlots::new());
        let slots = events.clone();
        let aliases = kind.aliases();
        let active_high = !pull_up;
        pin.on_edge(Some(Arc::new(move |high| {
            let active = high == active_high;
            slots.fire(if active { "activated" } else { "deactivated" });
            if let Some((on, off)) = aliases {
                slots.fire(if active { on } else { off });
            }
        })));

        Ok(Self {
            members: kind.members(),
            pin,
            pins,
            pull_up,
            events,
            closed: AtomicBool::new(false),
        })
    }

    pub fn is_active(&self) -> bool {
        self.pin.is_high() != self.pull_up
    }

    pub fn pull_up(&self) -> bool {
        self.pull_up
    }

    pub fn pin_number(&self) -> u32 {
        self.pin.number()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Detach handlers and release the pin.
    pub fn shutdown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.events.clear();
        self.pins.release(self.pin_number());
        debug!("Closed {} on GPIO{}", self.members.class_name(), self.pin_number());
    }
}

impl Drop for DigitalInputDevice {
    fn drop(&mut self) {
        self.shutdown();
    }
}

forward_device_to_members!(DigitalInputDevice);

fn input_members(class_name: &str) -> MemberTable<DigitalInputDevice> {
    MemberTable::<DigitalInputDevice>::new(class_name)
        .property("value", |d| Ok(json!(u8::from(d.is_active())).into()))
        .property("is_active", |d| Ok(json!(d.is_active()).into()))
        .property("pull_up", |d| Ok(json!(d.pull_up()).into()))
        .property("closed", |d| Ok(json!(d.is_closed()).into()))
        .property("pin", |d| {
            Ok(PropertyValue::Holder(Arc::new(PinNumber(d.pin_number()))))
        })
        .method("close", |d, args| {
            args.check(&[])?;
            d.shutdown();
            Ok(Value::Null)
        })
        .event("activated", |d, handler| d.events.set("activated", handler))
        .event("deactivated", |d, handler| d.events.set("deactivated", handler))
}

static DIGITAL_INPUT_MEMBERS: Lazy<MemberTable<DigitalInputDevice>> =
    Lazy::new(|| input_members("DigitalInputDevice"));

static BUTTON_MEMBERS: Lazy<MemberTable<DigitalInputDevice>> = Lazy::new(|| {
    input_members("Button")
        .property("is_pressed", |d| Ok(json!(d.is_active()).into()))
        .event("pressed", |d, handler| d.events.set("pressed", handler))
        .event("released", |d, handler| d.events.set("released", handler))
});

static MOTION_SENSOR_MEMBERS: Lazy<MemberTable<DigitalInputDevice>> = Lazy::new(|| {
    input_members("MotionSensor")
        .property("motion_detected", |d| Ok(json!(d.is_active()).into()))
        .event("motion", |d, handler| d.events.set("motion", handler))
        .event("no_motion", |d, handler| d.events.set("no_motion", handler))
});
