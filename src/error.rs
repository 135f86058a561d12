//! Error types and handling for the VPN bridge shim

use thiserror::Error;

/// Main error type for bridge operations
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The running executable's path could not be resolved
    #[error("Executable path resolution failed: {0}")]
    ExecutablePath(String),

    /// Authorization acquisition errors
    #[error("Authorization failed: {0}")]
    Authorization(String),

    /// Privileged launch errors
    #[error("Privileged launch failed: {0}")]
    Launch(String),

    /// Operation not available on this platform
    #[error("Unsupported on this platform: {0}")]
    Unsupported(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

impl From<toml::de::Error> for BridgeError {
    fn from(err: toml::de::Error) -> Self {
        BridgeError::Config(format!("TOML parsing error: {err}"))
    }
}
