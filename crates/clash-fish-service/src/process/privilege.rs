use nix::unistd::geteuid;

use crate::lifecycle::LifecycleError;

/// Effective user id of this process.
#[must_use]
pub fn current_euid() -> u32 {
    geteuid().as_raw()
}

/// Fails unless `euid` is root.
///
/// # Errors
///
/// Returns [`LifecycleError::Privilege`] for any non-zero `euid`.
pub fn ensure_root(euid: u32) -> Result<(), LifecycleError> {
    if euid == 0 {
        Ok(())
    } else {
        Err(LifecycleError::Privilege { euid })
    }
}
