//! Configuration loading and validation.

use super::Config;
use crate::env;
use crate::error::ConfigError;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Default configuration file name, resolved against the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "gpioproxy.json5";

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        debug!("Reading config file: {}", path.display());
        let content = fs::read_to_string(path)?;
        let config = Self::parse(&content)?;
        debug!("Loaded {} devices from config", config.devices.len());
        Ok(config)
    }

    /// Parse configuration from a string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        json5::from_str(content).map_err(|e| ConfigError::Json5(e.to_string()))
    }

    /// Apply `GPIOPROXY_HOST` / `GPIOPROXY_PORT` overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Some(host) = env::get_var(env::vars::HOST) {
            self.server.host = host;
        }
        if let Some(port) = env::get_u16(env::vars::PORT) {
            self.server.port = port;
        }
    }

    /// Validate the configuration, collecting all errors before returning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push("Server port cannot be 0".to_string());
        }

        if self.server.host.trim().is_empty() {
            errors.push("Server host cannot be empty".to_string());
        }

        if self.server.outbound_buffer == 0 {
            errors.push("Server outbound_buffer must be greater than 0".to_string());
        }

        let mut seen = HashSet::new();
        for (i, device) in self.devices.iter().enumerate() {
            if device.id.trim().is_empty() {
                errors.push(format!("Device [{}]: id must not be empty", i));
            } else if !seen.insert(device.id.as_str()) {
                errors.push(format!("Device [{}]: duplicate id '{}'", i, device.id));
            }
            if device.class_name.trim().is_empty() {
                errors.push(format!("Device [{}]: class must not be empty", i));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors.join("; ")))
        }
    }
}
