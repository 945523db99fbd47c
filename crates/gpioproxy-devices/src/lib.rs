//! Simulated GPIO devices for GPIO Proxy.
//!
//! This crate provides:
//! - A mock pin factory standing in for GPIO hardware
//! - Output, PWM, and input device classes with member tables
//! - A class-name factory and the device manager used as the proxy's lookup

/// Implement `Device` by forwarding to the type's `members` table.
macro_rules! forward_device_to_members {
    ($ty:ty) => {
        impl gpioproxy_core::Device for $ty {
            fn class_name(&self) -> &str {
                self.members.class_name()
            }

            fn invoke(
                &self,
                name: &str,
                args: &[serde_json::Value],
                kwargs: &serde_json::Map<String, serde_json::Value>,
            ) -> std::result::Result<serde_json::Value, gpioproxy_core::MemberError> {
                self.members.invoke(self, name, args, kwargs)
            }

            fn read(
                &self,
                name: &str,
            ) -> std::result::Result<gpioproxy_core::PropertyValue, gpioproxy_core::MemberError>
            {
                self.members.read(self, name)
            }

            fn write(
                &self,
                name: &str,
                value: serde_json::Value,
            ) -> std::result::Result<(), gpioproxy_core::MemberError> {
                self.members.write(self, name, value)
            }

            fn hook(
                &self,
                slot: &str,
                handler: gpioproxy_core::EventHandler,
            ) -> std::result::Result<(), gpioproxy_core::MemberError> {
                self.members.hook(self, slot, handler)
            }

            fn close(&self) {
                self.shutdown();
            }
        }
    };
}

pub mod error;
pub mod events;
pub mod factory;
pub mod input;
pub mod manager;
pub mod output;
pub mod pin;
pub mod pwm;

pub use error::DeviceError;
pub use factory::{Constructor, DeviceFactory};
pub use input::{DigitalInputDevice, InputKind};
pub use manager::DeviceManager;
pub use output::{DigitalOutputDevice, OutputKind, OutputOptions};
pub use pin::{MockPinFactory, Pin};
pub use pwm::{PwmKind, PwmOptions, PwmOutputDevice};

/// Result type for device operations.
pub type Result<T> = std::result::Result<T, DeviceError>;
