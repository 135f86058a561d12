//! Windows privileged relaunch via `ShellExecuteW` and the `runas` verb

use super::PrivilegeBroker;
use crate::error::{BridgeError, Result};
use std::ffi::OsStr;
use std::os::windows::ffi::OsStrExt;
use std::path::Path;
use std::ptr;
use winapi::um::shellapi::ShellExecuteW;
use winapi::um::winuser::SW_HIDE;

pub(super) struct ShellBroker;

fn to_wide(s: &OsStr) -> Vec<u16> {
    s.encode_wide().chain(std::iter::once(0)).collect()
}

impl PrivilegeBroker for ShellBroker {
    type Grant = ();

    // The runas verb prompts inline; there is no separate credential handle
    // to hold on Windows.
    fn acquire(&self) -> Result<()> {
        Ok(())
    }

    fn execute(&self, _grant: &(), program: &Path) -> Result<()> {
        let verb = to_wide(OsStr::new("runas"));
        let program = to_wide(program.as_os_str());

        let instance = unsafe {
            ShellExecuteW(
                ptr::null_mut(),
                verb.as_ptr(),
                program.as_ptr(),
                ptr::null(),
                ptr::null(),
                SW_HIDE,
            )
        };

        // Instance values of 32 and below are error codes.
        if instance as usize <= 32 {
            return Err(BridgeError::Launch(format!(
                "ShellExecuteW returned {}",
                instance as usize
            )));
        }

        Ok(())
    }
}

pub(super) fn is_elevated() -> bool {
    use winapi::shared::minwindef::{DWORD, FALSE};
    use winapi::um::handleapi::CloseHandle;
    use winapi::um::processthreadsapi::{GetCurrentProcess, OpenProcessToken};
    use winapi::um::securitybaseapi::GetTokenInformation;
    use winapi::um::winnt::{TokenElevation, HANDLE, TOKEN_ELEVATION, TOKEN_QUERY};

    let mut token: HANDLE = ptr::null_mut();
    let opened = unsafe { OpenProcessToken(GetCurrentProcess(), TOKEN_QUERY, &mut token) };
    if opened == FALSE {
        return false;
    }

    let mut elevation = TOKEN_ELEVATION { TokenIsElevated: 0 };
    let mut size: DWORD = 0;
    let queried = unsafe {
        GetTokenInformation(
            token,
            TokenElevation,
            &mut elevation as *mut TOKEN_ELEVATION as *mut _,
            std::mem::size_of::<TOKEN_ELEVATION>() as DWORD,
            &mut size,
        )
    };

    // SAFETY: the token handle was opened above and is closed exactly once.
    unsafe {
        CloseHandle(token);
    }

    queried != FALSE && elevation.TokenIsElevated != 0
}
