//! Device error types.

use thiserror::Error;

/// Errors that can occur while constructing or managing devices.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// No device class registered under this name.
    #[error("Device class '{0}' not found")]
    UnknownClass(String),

    /// Constructor arguments were rejected.
    #[error("{class}() {message}")]
    InvalidArgument {
        /// Class being constructed.
        class: String,
        /// What was wrong.
        message: String,
    },

    /// The pin is already reserved by another device.
    #[error("Pin GPIO{0} is already in use")]
    PinInUse(u32),

    /// A device with this ID is already registered.
    #[error("Device '{0}' already exists")]
    AlreadyExists(String),
}

impl DeviceError {
    /// Create an invalid argument error.
    pub fn invalid_argument(class: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            class: class.into(),
            message: message.into(),
        }
    }
}
