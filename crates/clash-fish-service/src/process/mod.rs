//! Process-level plumbing for the lifecycle manager.
//!
//! Covers the PID record, the lock file serialising lifecycle commands,
//! liveness checks and termination signals, the privilege check, and the
//! signal listener used while supervising in the foreground.

mod lock;
mod privilege;
mod record;
mod shutdown;
mod signal;

use std::time::Duration;

pub(crate) use lock::LifecycleLock;
pub use privilege::{current_euid, ensure_root};
pub use record::PidRecord;
pub use shutdown::{ShutdownError, ShutdownSignal, SupervisorEvent, SystemShutdownSignal};
pub use signal::is_alive;
pub(crate) use signal::terminate;

/// Tracing target for process plumbing.
pub(crate) const PROCESS_TARGET: &str = "clash_fish::process";

/// Bound on the wait between `SIGTERM` and `SIGKILL`.
pub const STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// Interval between liveness polls.
pub const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// How long a lifecycle command waits for a live lock holder.
pub const LOCK_WAIT: Duration = Duration::from_secs(5);
