//! Environment variable handling.

use std::env;

/// Environment variable names recognised by GPIO Proxy.
pub mod vars {
    /// Path to the configuration file.
    pub const CONFIG: &str = "GPIOPROXY_CONFIG";
    /// Listener host override.
    pub const HOST: &str = "GPIOPROXY_HOST";
    /// Listener port override.
    pub const PORT: &str = "GPIOPROXY_PORT";
}

/// Get an environment variable, returning None if not set or empty.
pub fn get_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable as a u16 (e.g., for ports).
pub fn get_u16(name: &str) -> Option<u16> {
    get_var(name).and_then(|v| v.parse().ok())
}
