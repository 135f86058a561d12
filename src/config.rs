//! Configuration module for the VPN bridge shim
//!
//! This module provides TOML-based configuration parsing and validation
//! for the relay settings that host applications may tune.

use crate::error::{BridgeError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Progress relay settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Maximum rendered message size in bytes; longer messages are truncated
    #[serde(default = "default_message_capacity")]
    pub message_capacity: usize,
    /// Most verbose severity level forwarded to the sink (0 = errors only)
    #[serde(default = "default_min_level")]
    pub min_level: i32,
    /// Whether messages that render to an empty string reach the sink
    #[serde(default = "default_true")]
    pub forward_empty: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            message_capacity: default_message_capacity(),
            min_level: default_min_level(),
            forward_empty: true,
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Progress relay settings
    #[serde(default)]
    pub relay: RelayConfig,
}

impl BridgeConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| BridgeError::Config(format!("Failed to read config file: {e}")))?;

        <Self as FromStr>::from_str(&contents)
    }

    /// Convert configuration to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| BridgeError::Config(format!("Failed to serialize config: {e}")))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.relay.message_capacity == 0 {
            return Err(BridgeError::Config(
                "Relay message capacity cannot be zero".to_string(),
            ));
        }

        if self.relay.min_level < 0 {
            return Err(BridgeError::Config(
                "Relay level floor cannot be negative".to_string(),
            ));
        }

        Ok(())
    }
}

impl FromStr for BridgeConfig {
    type Err = BridgeError;

    fn from_str(content: &str) -> Result<Self> {
        let config: BridgeConfig = toml::from_str(content)
            .map_err(|e| BridgeError::Config(format!("Failed to parse TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }
}

// Default value functions for serde
fn default_true() -> bool {
    true
}

fn default_message_capacity() -> usize {
    crate::relay::MESSAGE_CAPACITY
}

fn default_min_level() -> i32 {
    crate::relay::LEVEL_TRACE
}
