use std::thread;
use std::time::{Duration, Instant};

use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use tracing::{info, warn};

use super::{POLL_INTERVAL, PROCESS_TARGET};
use crate::lifecycle::LifecycleError;

fn to_pid(pid: u32) -> Result<Pid, LifecycleError> {
    match i32::try_from(pid) {
        Ok(raw) if raw > 0 => Ok(Pid::from_raw(raw)),
        _ => Err(LifecycleError::InvalidPid { pid }),
    }
}

/// Whether a process with `pid` exists.
///
/// A process owned by another user still counts as alive. Pids that cannot
/// name a single process (zero, or beyond `i32::MAX`) are reported dead.
#[must_use]
pub fn is_alive(pid: u32) -> bool {
    let Ok(target) = to_pid(pid) else {
        return false;
    };
    match kill(target, None) {
        Ok(()) | Err(Errno::EPERM) => true,
        Err(_) => false,
    }
}

/// Stops `pid` with `SIGTERM`, escalating to `SIGKILL`.
///
/// Escalation happens when `SIGTERM` cannot be delivered or the process is
/// still alive after `timeout`. A process that vanishes at any point counts
/// as stopped.
///
/// # Errors
///
/// Returns [`LifecycleError::InvalidPid`] for an unusable pid and
/// [`LifecycleError::SignalDelivery`] when `SIGKILL` also fails.
pub(crate) fn terminate(pid: u32, timeout: Duration) -> Result<(), LifecycleError> {
    let target = to_pid(pid)?;
    match kill(target, Signal::SIGTERM) {
        Ok(()) => {
            info!(target: PROCESS_TARGET, pid, "sent SIGTERM");
            if wait_for_exit(pid, timeout) {
                return Ok(());
            }
            warn!(
                target: PROCESS_TARGET,
                pid,
                timeout_ms = timeout.as_millis(),
                "process outlived SIGTERM; escalating"
            );
        }
        Err(Errno::ESRCH) => return Ok(()),
        Err(errno) => {
            warn!(
                target: PROCESS_TARGET,
                pid,
                error = %errno,
                "SIGTERM not delivered; escalating"
            );
        }
    }

    match kill(target, Signal::SIGKILL) {
        Ok(()) => {
            info!(target: PROCESS_TARGET, pid, "sent SIGKILL");
            wait_for_exit(pid, timeout);
            Ok(())
        }
        Err(Errno::ESRCH) => Ok(()),
        Err(source) => Err(LifecycleError::SignalDelivery { pid, source }),
    }
}

fn wait_for_exit(pid: u32, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if !is_alive(pid) {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::process::Command;

    const MISSING_PID: u32 = 99_999_999;

    #[test]
    fn current_process_is_alive() {
        assert!(is_alive(std::process::id()));
    }

    #[rstest]
    #[case(0)]
    #[case(MISSING_PID)]
    #[case(u32::MAX)]
    fn unusable_pids_are_dead(#[case] pid: u32) {
        assert!(!is_alive(pid));
    }

    #[rstest]
    #[case(0)]
    #[case(u32::MAX)]
    fn terminate_rejects_invalid_pids(#[case] pid: u32) {
        let error = terminate(pid, Duration::from_millis(10)).expect_err("invalid pid");
        assert!(matches!(error, LifecycleError::InvalidPid { .. }));
    }

    #[test]
    fn terminate_treats_missing_process_as_stopped() {
        terminate(MISSING_PID, Duration::from_millis(10)).expect("nothing to stop");
    }

    #[test]
    fn terminate_stops_live_child() {
        let mut child = Command::new("sleep").arg("30").spawn().expect("spawn sleep");
        let pid = child.id();
        let reaper = thread::spawn(move || child.wait());

        terminate(pid, Duration::from_secs(5)).expect("terminate");

        let status = reaper.join().expect("reaper").expect("wait");
        assert!(!status.success());
        assert!(!is_alive(pid));
    }
}
