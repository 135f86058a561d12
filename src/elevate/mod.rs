//! Privileged relaunch of the current executable
//!
//! Host startup code calls [`relaunch_as_root`] when the native library needs
//! rights the process does not have (tunnel device creation, route changes).
//! The platform authorization service re-executes the running binary as a new
//! elevated process; the caller keeps running and learns only whether the
//! launch request was accepted.

use crate::error::{BridgeError, Result};
#[cfg(any(target_os = "macos", target_os = "windows", test))]
use std::io;
#[cfg(any(target_os = "macos", target_os = "windows", test))]
use std::path::{Path, PathBuf};

#[cfg(target_os = "macos")]
mod macos;
#[cfg(target_os = "windows")]
mod windows;

/// Acquire-use-release interface over a platform authorization service
///
/// The grant returned by `acquire` gives the credential back when dropped, so
/// release happens on every exit path including execution failure.
#[cfg(any(target_os = "macos", target_os = "windows", test))]
trait PrivilegeBroker {
    type Grant;

    fn acquire(&self) -> Result<Self::Grant>;
    fn execute(&self, grant: &Self::Grant, program: &Path) -> Result<()>;
}

#[cfg(any(target_os = "macos", target_os = "windows", test))]
fn relaunch_via<B, R>(broker: &B, resolve_exe: R) -> Result<()>
where
    B: PrivilegeBroker,
    R: FnOnce() -> io::Result<PathBuf>,
{
    let program = resolve_exe().map_err(|e| BridgeError::ExecutablePath(e.to_string()))?;
    let grant = broker.acquire()?;
    broker.execute(&grant, &program)
}

/// Re-execute the current binary with elevated privileges
///
/// Blocks the calling thread until the platform authorization prompt is
/// answered and the launch request completes, so call it from startup code
/// that tolerates blocking. The elevated instance runs independently: this
/// function does not wait for it, talk to it, or terminate the caller.
///
/// # Errors
/// Reports which stage failed: executable path resolution, authorization
/// acquisition, the launch request itself, or an unsupported platform.
pub fn relaunch_as_root() -> Result<()> {
    #[cfg(target_os = "macos")]
    return relaunch_via(&macos::SecurityAuthorization, std::env::current_exe);

    #[cfg(target_os = "windows")]
    return relaunch_via(&windows::ShellBroker, std::env::current_exe);

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    return Err(BridgeError::Unsupported(
        "no privilege elevation service on this platform".to_string(),
    ));
}

/// Whether the current platform has a privileged relaunch path
pub fn is_supported() -> bool {
    cfg!(any(target_os = "macos", target_os = "windows"))
}

/// Whether the current process already runs with elevated rights
pub fn is_elevated() -> bool {
    #[cfg(unix)]
    // SAFETY: geteuid has no preconditions and cannot fail.
    return unsafe { libc::geteuid() == 0 };

    #[cfg(windows)]
    return windows::is_elevated();

    #[cfg(not(any(unix, windows)))]
    return false;
}
