//! macOS privileged relaunch via Authorization Services
//!
//! Binds the three Security.framework calls the relaunch needs. The
//! authorization ref is wrapped in a guard that frees it with rights
//! destruction when dropped.

use super::PrivilegeBroker;
use crate::error::{BridgeError, Result};
use std::ffi::{c_void, CString};
use std::os::raw::c_char;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::ptr;

type AuthorizationRef = *mut c_void;
type AuthorizationFlags = u32;
type OSStatus = i32;

// errAuthorizationSuccess
const STATUS_SUCCESS: OSStatus = 0;
// kAuthorizationFlagDefaults
const FLAG_DEFAULTS: AuthorizationFlags = 0;
// kAuthorizationFlagDestroyRights
const FLAG_DESTROY_RIGHTS: AuthorizationFlags = 1;

#[link(name = "Security", kind = "framework")]
extern "C" {
    fn AuthorizationCreate(
        rights: *const c_void,
        environment: *const c_void,
        flags: AuthorizationFlags,
        authorization: *mut AuthorizationRef,
    ) -> OSStatus;

    fn AuthorizationExecuteWithPrivileges(
        authorization: AuthorizationRef,
        path_to_tool: *const c_char,
        options: AuthorizationFlags,
        arguments: *const *const c_char,
        communications_pipe: *mut *mut libc::FILE,
    ) -> OSStatus;

    fn AuthorizationFree(authorization: AuthorizationRef, flags: AuthorizationFlags) -> OSStatus;
}

pub(super) struct SecurityAuthorization;

/// Owned authorization ref; freed with rights destruction on drop
pub(super) struct AuthorizationGrant(AuthorizationRef);

impl Drop for AuthorizationGrant {
    fn drop(&mut self) {
        // SAFETY: the ref came out of AuthorizationCreate and is freed
        // exactly once.
        unsafe {
            AuthorizationFree(self.0, FLAG_DESTROY_RIGHTS);
        }
    }
}

impl PrivilegeBroker for SecurityAuthorization {
    type Grant = AuthorizationGrant;

    fn acquire(&self) -> Result<AuthorizationGrant> {
        let mut authorization: AuthorizationRef = ptr::null_mut();
        // Empty rights and environment, default flags: rights are requested
        // lazily by the execute call below.
        let status = unsafe {
            AuthorizationCreate(
                ptr::null(),
                ptr::null(),
                FLAG_DEFAULTS,
                &mut authorization,
            )
        };

        if status != STATUS_SUCCESS {
            return Err(BridgeError::Authorization(format!(
                "AuthorizationCreate returned status {status}"
            )));
        }

        Ok(AuthorizationGrant(authorization))
    }

    fn execute(&self, grant: &AuthorizationGrant, program: &Path) -> Result<()> {
        let program = CString::new(program.as_os_str().as_bytes())
            .map_err(|_| BridgeError::Launch("executable path contains a NUL byte".to_string()))?;

        // No arguments, no captured output pipe.
        let argv: [*const c_char; 1] = [ptr::null()];
        let status = unsafe {
            AuthorizationExecuteWithPrivileges(
                grant.0,
                program.as_ptr(),
                FLAG_DEFAULTS,
                argv.as_ptr(),
                ptr::null_mut(),
            )
        };

        if status != STATUS_SUCCESS {
            return Err(BridgeError::Launch(format!(
                "AuthorizationExecuteWithPrivileges returned status {status}"
            )));
        }

        Ok(())
    }
}
