//! Configuration schema definitions.

use crate::device::DeviceDescriptor;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Main GPIO Proxy configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Devices exposed through the proxy, in declaration order.
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
}

impl Config {
    /// The static device catalog served by `list_devices`.
    pub fn catalog(&self) -> Vec<DeviceDescriptor> {
        self.devices
            .iter()
            .map(|d| DeviceDescriptor::new(&d.id, &d.class_name))
            .collect()
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port number.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Capacity of each connection's outbound message queue.
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            outbound_buffer: default_outbound_buffer(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8765
}

fn default_outbound_buffer() -> usize {
    256
}

/// One configured device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Unique device identifier.
    pub id: String,

    /// Device class name (e.g. `LED`, `Button`).
    #[serde(rename = "class")]
    pub class_name: String,

    /// Positional constructor arguments.
    #[serde(default)]
    pub args: Vec<Value>,

    /// Named constructor arguments.
    #[serde(default)]
    pub kwargs: Map<String, Value>,
}

impl DeviceConfig {
    /// Create a device entry with no constructor arguments.
    pub fn new(id: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            class_name: class_name.into(),
            args: Vec::new(),
            kwargs: Map::new(),
        }
    }

    /// Append a positional constructor argument.
    pub fn with_arg(mut self, arg: impl Into<Value>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Set a named constructor argument.
    pub fn with_kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(name.into(), value.into());
        self
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level.
    #[serde(default)]
    pub level: LogLevel,
}

/// Log level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// The directive understood by `tracing_subscriber::EnvFilter`.
    pub fn as_filter(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" | "critical" => Ok(Self::Error),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}
