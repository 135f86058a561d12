//! VPN Bridge - Progress Relay and Privilege Elevation Shim
//!
//! This is a **static library shim** that bridges a native VPN client
//! library into host applications written in other languages.
//!
//! ## What This Shim Provides
//! - A process-wide progress relay: the native library emits status and log
//!   lines, the host registers a single sink that receives them
//! - Bounded message rendering with silent truncation and trailing-newline
//!   stripping
//! - Privileged relaunch of the current executable on platforms with an
//!   authorization service (macOS, Windows), plus elevation checks
//! - TOML-based tuning of the relay (capacity, level floor, empty-message
//!   policy)
//! - C FFI bindings for integration with other languages
//!
//! ## What Your Application Must Implement
//! - The VPN protocol engine itself (tunnel negotiation, reconnects, packet
//!   framing) - this crate only carries its progress output and the
//!   elevation bootstrap
//! - A sink that is safe to call from whatever threads the native library
//!   logs on
//! - Marshalling above the C ABI for your host language
//!
//! ## Integration
//! Register a sink early ([`relay::set_sink`] or
//! `vpnbridge_set_progress_callback`), route the native library's progress
//! output into [`relay::emit`] (or `vpnbridge_emit_progress`), and call
//! [`elevate::relaunch_as_root`] from startup code when the process needs
//! elevated rights.

pub mod config;
pub mod elevate;
pub mod error;
pub mod relay;

// Re-export core types for static library interface
pub use config::{BridgeConfig, RelayConfig};
pub use error::{BridgeError, Result};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// C FFI Interface for cross-platform integration
pub mod ffi;
