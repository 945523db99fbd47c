//! # gpioproxy-core
//!
//! Core types, configuration, and device abstractions for GPIO Proxy.
//!
//! This crate provides shared functionality used across all GPIO Proxy crates:
//!
//! - **Configuration**: Loading, validation, and persistence of config files
//! - **Devices**: The capability interface every proxied device implements
//! - **Types**: Connection identifiers and subscription keys

pub mod config;
pub mod device;
pub mod env;
pub mod error;
pub mod members;
pub mod types;

// Re-exports for convenience
pub use config::Config;
pub use device::{Device, DeviceDescriptor, DeviceLookup, EventHandler, MemberError, PropertyValue};
pub use error::{ConfigError, Error, Result};
pub use members::{Args, MemberTable};
pub use types::{ConnectionId, SubscriptionKey};
