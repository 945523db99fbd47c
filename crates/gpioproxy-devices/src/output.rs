//! Digital output devices: `DigitalOutputDevice`, `LED`, `Buzzer`.

use crate::events::EventSlots;
use crate::pin::{MockPinFactory, Pin, PinNumber};
use crate::Result;
use gpioproxy_core::members::as_bool;
use gpioproxy_core::{Args, MemberTable, PropertyValue};
use once_cell::sync::Lazy;
use parking_lot::{Condvar, Mutex};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::debug;

/// The class an output device was constructed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    DigitalOutputDevice,
    Led,
    Buzzer,
}

impl OutputKind {
    pub fn class_name(&self) -> &'static str {
        self.members().class_name()
    }

    fn members(&self) -> &'static MemberTable<DigitalOutputDevice> {
        match self {
            Self::DigitalOutputDevice => &DIGITAL_OUTPUT_MEMBERS,
            Self::Led => &LED_MEMBERS,
            Self::Buzzer => &BUZZER_MEMBERS,
        }
    }
}

/// Construction options for output devices.
#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    /// Whether "on" drives the pin high.
    pub active_high: bool,
    /// Whether the device starts on.
    pub initial_value: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            active_high: true,
            initial_value: false,
        }
    }
}

struct OutputCore {
    pin: Arc<Pin>,
    active_high: bool,
    active: Mutex<bool>,
    events: EventSlots,
}

impl OutputCore {
    fn level_for(&self, active: bool) -> f64 {
        if active == self.active_high {
            1.0
        } else {
            0.0
        }
    }

    fn is_active(&self) -> bool {
        *self.active.lock()
    }

    /// Switch state, firing `activated`/`deactivated` on a transition.
    fn set_active(&self, active: bool) {
        {
            let mut current = self.active.lock();
            if *current == active {
                return;
            }
            *current = active;
            self.pin.set_level(self.level_for(active));
        }
        self.events
            .fire(if active { "activated" } else { "deactivated" });
    }
}

#[derive(Default)]
struct StopSignal {
    stopped: Mutex<bool>,
    cond: Condvar,
}

impl StopSignal {
    fn stop(&self) {
        *self.stopped.lock() = true;
        self.cond.notify_all();
    }

    /// Sleep for `duration` unless stopped first. Returns whether stopped.
    fn wait(&self, duration: Duration) -> bool {
        let mut stopped = self.stopped.lock();
        match Instant::now().checked_add(duration) {
            Some(deadline) => {
                while !*stopped {
                    if self.cond.wait_until(&mut stopped, deadline).timed_out() {
                        break;
                    }
                }
            }
            // Past any representable instant: wait for stop only.
            None => {
                while !*stopped {
                    self.cond.wait(&mut stopped);
                }
            }
        }
        *stopped
    }
}

struct Blinker {
    stop: Arc<StopSignal>,
    handle: JoinHandle<()>,
}

/// A device driving one digital output pin.
pub struct DigitalOutputDevice {
    members: &'static MemberTable<DigitalOutputDevice>,
    core: Arc<OutputCore>,
    pins: Arc<MockPinFactory>,
    blinker: Mutex<Option<Blinker>>,
    closed: AtomicBool,
}

impl DigitalOutputDevice {
    /// Reserve `pin` and create the device.
    pub fn new(
        kind: OutputKind,
        pins: Arc<MockPinFactory>,
        pin: u32,
        options: OutputOptions,
    ) -> Result<Self> {
        let pin = pins.reserve(pin)?;
        let core = OutputCore {
            pin,
            active_high: options.active_high,
            active: Mutex::new(options.initial_value),
            events: EventSlots::new(),
        };
        core.pin.set_level(core.level_for(options.initial_value));

        Ok(Self {
            members: kind.members(),
            core: Arc::new(core),
            pins,
            blinker: Mutex::new(None),
            closed: AtomicBool::new(false),
        })
    }

    pub fn is_active(&self) -> bool {
        self.core.is_active()
    }

    pub fn active_high(&self) -> bool {
        self.core.active_high
    }

    pub fn pin_number(&self) -> u32 {
        self.core.pin.number()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn on(&self) -> std::result::Result<(), String> {
        self.check_open()?;
        self.stop_blink();
        self.core.set_active(true);
        Ok(())
    }

    pub fn off(&self) -> std::result::Result<(), String> {
        self.check_open()?;
        self.stop_blink();
        self.core.set_active(false);
        Ok(())
    }

    pub fn toggle(&self) -> std::result::Result<(), String> {
        self.check_open()?;
        self.stop_blink();
        self.core.set_active(!self.core.is_active());
        Ok(())
    }

    /// Assign the `value` property.
    pub fn set_value(&self, value: &Value) -> std::result::Result<(), String> {
        let active = as_bool(value).ok_or("value must be a boolean or a number")?;
        if active {
            self.on()
        } else {
            self.off()
        }
    }

    /// Repeatedly switch on and off in the background.
    ///
    /// Runs `n` cycles, or until interrupted when `n` is `None`. Any other
    /// state change cancels it.
    pub fn blink(
        &self,
        on_time: f64,
        off_time: f64,
        n: Option<u64>,
    ) -> std::result::Result<(), String> {
        self.check_open()?;
        let on_time = duration_arg("on_time", on_time)?;
        let off_time = duration_arg("off_time", off_time)?;
        self.stop_blink();

        let stop = Arc::new(StopSignal::default());
        let signal = stop.clone();
        let core = self.core.clone();
        let handle = thread::Builder::new()
            .name(format!("blink-gpio{}", self.pin_number()))
            .spawn(move || {
                let mut cycles = 0u64;
                while n.map_or(true, |n| cycles < n) {
                    core.set_active(true);
                    if signal.wait(on_time) {
                        return;
                    }
                    core.set_active(false);
                    if signal.wait(off_time) {
                        return;
                    }
                    cycles += 1;
                }
            })
            .map_err(|e| format!("failed to start blink thread: {}", e))?;

        debug!("GPIO{} blinking", self.pin_number());
        *self.blinker.lock() = Some(Blinker { stop, handle });
        Ok(())
    }

    fn stop_blink(&self) {
        let blinker = self.blinker.lock().take();
        if let Some(blinker) = blinker {
            blinker.stop.stop();
            // A handler running on the blink thread may switch the device.
            if blinker.handle.thread().id() != thread::current().id() {
                let _ = blinker.handle.join();
            }
        }
    }

    fn check_open(&self) -> std::result::Result<(), String> {
        if self.is_closed() {
            Err("Device is closed".to_string())
        } else {
            Ok(())
        }
    }

    /// Stop background activity, detach handlers, and release the pin.
    pub fn shutdown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.stop_blink();
        self.core.events.clear();
        *self.core.active.lock() = false;
        self.core.pin.set_level(self.core.level_for(false));
        self.pins.release(self.pin_number());
        debug!("Closed {} on GPIO{}", self.members.class_name(), self.pin_number());
    }
}

impl Drop for DigitalOutputDevice {
    fn drop(&mut self) {
        self.shutdown();
    }
}

forward_device_to_members!(DigitalOutputDevice);

fn duration_arg(name: &str, seconds: f64) -> std::result::Result<Duration, String> {
    Duration::try_from_secs_f64(seconds)
        .map_err(|_| format!("{} must be a non-negative number of seconds", name))
}

fn blink_method(d: &DigitalOutputDevice, args: &Args<'_>) -> std::result::Result<Value, String> {
    args.check(&["on_time", "off_time", "n"])?;
    let on_time = args.f64_or(0, "on_time", 1.0)?;
    let off_time = args.f64_or(1, "off_time", 1.0)?;
    let n = args.opt_u64(2, "n")?;
    d.blink(on_time, off_time, n)?;
    Ok(Value::Null)
}

fn output_members(class_name: &str) -> MemberTable<DigitalOutputDevice> {
    MemberTable::<DigitalOutputDevice>::new(class_name)
        .property_rw(
            "value",
            |d| Ok(json!(d.is_active()).into()),
            |d, v| d.set_value(&v),
        )
        .property("is_active", |d| Ok(json!(d.is_active()).into()))
        .property("active_high", |d| Ok(json!(d.active_high()).into()))
        .property("closed", |d| Ok(json!(d.is_closed()).into()))
        .property("pin", |d| {
            Ok(PropertyValue::Holder(Arc::new(PinNumber(d.pin_number()))))
        })
        .method("on", |d, args| {
            args.check(&[])?;
            d.on().map(|_| Value::Null)
        })
        .method("off", |d, args| {
            args.check(&[])?;
            d.off().map(|_| Value::Null)
        })
        .method("toggle", |d, args| {
            args.check(&[])?;
            d.toggle().map(|_| Value::Null)
        })
        .method("blink", blink_method)
        .method("close", |d, args| {
            args.check(&[])?;
            d.shutdown();
            Ok(Value::Null)
        })
        .event("activated", |d, handler| d.core.events.set("activated", handler))
        .event("deactivated", |d, handler| {
            d.core.events.set("deactivated", handler)
        })
}

static DIGITAL_OUTPUT_MEMBERS: Lazy<MemberTable<DigitalOutputDevice>> =
    Lazy::new(|| output_members("DigitalOutputDevice"));

static LED_MEMBERS: Lazy<MemberTable<DigitalOutputDevice>> = Lazy::new(|| {
    output_members("LED").property("is_lit", |d| Ok(json!(d.is_active()).into()))
});

static BUZZER_MEMBERS: Lazy<MemberTable<DigitalOutputDevice>> =
    Lazy::new(|| output_members("Buzzer").method("beep", blink_method));
