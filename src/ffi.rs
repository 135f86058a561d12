//! C FFI Interface for the VPN bridge shim
//!
//! This module provides C-compatible functions for integrating the bridge
//! into applications written in other languages (Swift, Kotlin, C#, etc.).

#![allow(clippy::missing_safety_doc)]

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_void};
use std::ptr;

use crate::{elevate, relay, BridgeConfig, BridgeError};

/// Error codes returned by C FFI functions
#[repr(C)]
pub enum BridgeErrorCode {
    Success = 0,
    InvalidConfig = 1,
    PathResolutionFailed = 2,
    AuthorizationFailed = 3,
    LaunchFailed = 4,
    InvalidParameter = 5,
    Unsupported = 6,
    InternalError = 99,
}

impl From<&BridgeError> for BridgeErrorCode {
    fn from(error: &BridgeError) -> Self {
        match error {
            BridgeError::Config(_) => BridgeErrorCode::InvalidConfig,
            BridgeError::ExecutablePath(_) => BridgeErrorCode::PathResolutionFailed,
            BridgeError::Authorization(_) => BridgeErrorCode::AuthorizationFailed,
            BridgeError::Launch(_) => BridgeErrorCode::LaunchFailed,
            BridgeError::Unsupported(_) => BridgeErrorCode::Unsupported,
            BridgeError::Io(_) => BridgeErrorCode::InternalError,
        }
    }
}

/// Progress callback registered by the host application
///
/// Receives the opaque context pointer the native library handed to the emit
/// call, the native severity level, and the rendered message: NUL-terminated,
/// truncated to the configured capacity, with at most one trailing newline
/// already removed. Called synchronously on the emitting thread.
pub type ProgressCallback =
    unsafe extern "C" fn(privdata: *mut c_void, level: c_int, message: *const c_char);

/// Register where progress messages should go
///
/// Replaces any previously registered callback (last writer wins). Passing
/// NULL clears the registration; subsequent messages are dropped.
#[no_mangle]
pub unsafe extern "C" fn vpnbridge_set_progress_callback(callback: Option<ProgressCallback>) {
    match callback {
        Some(callback) => relay::set_sink(move |privdata, level, message| {
            // A rendered message only contains NUL if the caller formatted one
            // in; deliver an empty string in that case rather than truncating
            // at an arbitrary point.
            let message = CString::new(message).unwrap_or_default();
            unsafe { callback(privdata, level, message.as_ptr()) };
        }),
        None => relay::clear_sink(),
    }
}

/// Forward an already-rendered progress message from the native library
///
/// The message still passes through the relay pipeline: the level floor,
/// capacity truncation and trailing-newline stripping all apply. NULL
/// messages are dropped; invalid UTF-8 is replaced lossily.
#[no_mangle]
pub unsafe extern "C" fn vpnbridge_emit_progress(
    privdata: *mut c_void,
    level: c_int,
    message: *const c_char,
) {
    if message.is_null() {
        return;
    }

    let message = CStr::from_ptr(message).to_string_lossy();
    relay::emit(privdata, level, format_args!("{message}"));
}

/// Parse, validate and apply a TOML bridge configuration
///
/// # Parameters
/// - `config_str`: TOML configuration string
/// - `error_msg`: Output buffer for error messages (nullable)
/// - `error_msg_len`: Size of error message buffer
///
/// # Returns
/// - 0 on success
/// - Error code on failure
#[no_mangle]
pub unsafe extern "C" fn vpnbridge_configure(
    config_str: *const c_char,
    error_msg: *mut c_char,
    error_msg_len: usize,
) -> c_int {
    if config_str.is_null() {
        return BridgeErrorCode::InvalidParameter as c_int;
    }

    let config_str = match CStr::from_ptr(config_str).to_str() {
        Ok(s) => s,
        Err(_) => return BridgeErrorCode::InvalidParameter as c_int,
    };

    match config_str.parse::<BridgeConfig>() {
        Ok(config) => {
            relay::configure(config.relay);
            BridgeErrorCode::Success as c_int
        }
        Err(err) => {
            if !error_msg.is_null() && error_msg_len > 0 {
                let error_str = format!("{err}");
                let error_cstr = CString::new(error_str).unwrap_or_default();
                let error_bytes = error_cstr.as_bytes_with_nul();
                let copy_len = std::cmp::min(error_bytes.len(), error_msg_len - 1);

                ptr::copy_nonoverlapping(
                    error_bytes.as_ptr() as *const c_char,
                    error_msg,
                    copy_len,
                );
                *error_msg.add(copy_len) = 0; // Null terminate
            }
            BridgeErrorCode::from(&err) as c_int
        }
    }
}

/// Re-execute the current binary with elevated privileges
///
/// Blocks until the platform authorization prompt completes; the elevated
/// instance runs independently of the calling process.
///
/// # Returns
/// - 1 if the privileged launch was requested successfully
/// - 0 on any failure; the reason is reported through the progress relay at
///   error level instead of being discarded
#[no_mangle]
pub unsafe extern "C" fn vpnbridge_relaunch_as_root() -> c_int {
    match elevate::relaunch_as_root() {
        Ok(()) => 1,
        Err(err) => {
            relay::emit(ptr::null_mut(), relay::LEVEL_ERR, format_args!("{err}"));
            0
        }
    }
}

/// Whether the current process already runs with elevated rights
///
/// # Returns
/// - 1 if elevated, 0 otherwise
#[no_mangle]
pub unsafe extern "C" fn vpnbridge_is_elevated() -> c_int {
    c_int::from(elevate::is_elevated())
}

/// Get library version
///
/// # Returns
/// - Version string (caller must not free)
#[no_mangle]
pub unsafe extern "C" fn vpnbridge_version() -> *const c_char {
    static VERSION_CSTR: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION_CSTR.as_ptr() as *const c_char
}
