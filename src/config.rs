//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every section and field is optional; an empty file yields the defaults.
//!
//! ```toml
//! [connection]
//! host = "camera-pi.local"
//! port = 2222
//!
//! [controller]
//! poll_interval_ms = 50
//!
//! [buttons]
//! debounce_ms = 250
//! bindings = [
//!     { button = "left_thumb", command = "center" },
//!     { button = "south", command = "press_a" },
//! ]
//! ```

use serde::de::Error;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::controller::bindings::{ButtonBinding, DEFAULT_BINDINGS};
use crate::error::{BridgeError, Result};
use crate::transport::{DEFAULT_HOST, DEFAULT_PORT};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub controller: ControllerConfig,
    #[serde(default)]
    pub buttons: ButtonConfig,
}

/// CameraVision command port configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ConnectionConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

/// Controller configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ControllerConfig {
    /// Event device to use; empty means auto-detect
    #[serde(default)]
    pub device_path: String,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_invert_pan")]
    pub invert_pan: bool,

    #[serde(default = "default_invert_tilt")]
    pub invert_tilt: bool,
}

/// Button configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ButtonConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Bindings in priority order
    #[serde(default = "default_bindings")]
    pub bindings: Vec<ButtonBinding>,
}

// Default value functions
fn default_host() -> String { DEFAULT_HOST.to_string() }
fn default_port() -> u16 { DEFAULT_PORT }
fn default_connect_timeout_ms() -> u64 { 5000 }

fn default_poll_interval_ms() -> u64 { 100 }
fn default_invert_pan() -> bool { true }
fn default_invert_tilt() -> bool { false }

fn default_debounce_ms() -> u64 { 250 }
fn default_bindings() -> Vec<ButtonBinding> { DEFAULT_BINDINGS.to_vec() }

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            device_path: String::new(),
            poll_interval_ms: default_poll_interval_ms(),
            invert_pan: default_invert_pan(),
            invert_tilt: default_invert_tilt(),
        }
    }
}

impl Default for ButtonConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            bindings: default_bindings(),
        }
    }
}

impl ConnectionConfig {
    /// Connection timeout as a `Duration`.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl ControllerConfig {
    /// Poll interval as a `Duration`.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl ButtonConfig {
    /// Debounce window as a `Duration`.
    #[must_use]
    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

fn invalid(msg: impl std::fmt::Display) -> BridgeError {
    BridgeError::Config(toml::de::Error::custom(msg))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use camvision_bridge::config::Config;
    ///
    /// let config = Config::load("camvision.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.connection.host.trim().is_empty() {
            return Err(invalid("host cannot be empty"));
        }

        if self.connection.port == 0 {
            return Err(invalid("port must be between 1 and 65535"));
        }

        if self.connection.connect_timeout_ms == 0 || self.connection.connect_timeout_ms > 60000 {
            return Err(invalid("connect_timeout_ms must be between 1 and 60000"));
        }

        if self.controller.poll_interval_ms < 10 || self.controller.poll_interval_ms > 1000 {
            return Err(invalid("poll_interval_ms must be between 10 and 1000"));
        }

        if self.buttons.debounce_ms > 5000 {
            return Err(invalid("debounce_ms must be between 0 and 5000"));
        }

        // A button can only sit at one priority
        let mut seen = HashSet::new();
        for binding in &self.buttons.bindings {
            if !seen.insert(binding.button) {
                return Err(invalid(format!(
                    "button {:?} is bound more than once",
                    binding.button
                )));
            }
        }

        Ok(())
    }
}
