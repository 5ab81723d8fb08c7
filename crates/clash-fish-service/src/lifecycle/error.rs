use std::io;
use std::path::PathBuf;

use clash_fish_config::ConfigError;
use nix::errno::Errno;
use thiserror::Error;

use crate::engine::EngineError;
use crate::process::ShutdownError;

/// Errors surfaced by lifecycle operations.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// `start` found no configuration file.
    #[error("configuration file not found at '{path}'; run '{init_command}' first")]
    ConfigNotFound {
        /// Expected document path.
        path: PathBuf,
        /// Command that creates the document.
        init_command: &'static str,
    },
    /// Loading or validating the configuration failed.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A live service is already recorded.
    #[error("service is already running (pid {pid})")]
    AlreadyRunning {
        /// Recorded pid.
        pid: u32,
    },
    /// No service is recorded.
    #[error("service is not running")]
    NotRunning,
    /// The record named a process that no longer exists; it was removed.
    #[error("service was not running: removed stale pid file '{path}' (pid {pid})")]
    StaleRecord {
        /// Pid named by the stale record.
        pid: u32,
        /// Record that was removed.
        path: PathBuf,
    },
    /// The operation needs root.
    #[error("this command requires root privileges (effective uid {euid}); retry with sudo")]
    Privilege {
        /// Effective uid of the caller.
        euid: u32,
    },
    /// The recorded pid cannot name a process.
    #[error("invalid pid {pid}")]
    InvalidPid {
        /// Rejected pid.
        pid: u32,
    },
    /// Reading the pid file failed.
    #[error("failed to read pid file '{path}': {source}")]
    PidRead {
        /// Pid file path.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The pid file does not contain a pid.
    #[error("pid file '{path}' contains '{content}', not a process id")]
    PidParse {
        /// Pid file path.
        path: PathBuf,
        /// Trimmed file contents.
        content: String,
    },
    /// Writing the pid file failed.
    #[error("failed to write pid file '{path}': {source}")]
    PidWrite {
        /// Pid file path.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// Removing the pid file failed.
    #[error("failed to remove pid file '{path}': {source}")]
    PidRemove {
        /// Pid file path.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// Opening or locking the lock file failed.
    #[error("failed to acquire lock file '{path}': {source}")]
    LockCreate {
        /// Lock file path.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// Another lifecycle command holds the lock.
    #[error("another clash-fish command holds '{}'{}", path.display(), holder_suffix(*pid))]
    LockHeld {
        /// Lock file path.
        path: PathBuf,
        /// Holder pid, when readable.
        pid: Option<u32>,
    },
    /// Neither `SIGTERM` nor `SIGKILL` could be delivered.
    #[error("failed to stop process {pid}: {source}")]
    SignalDelivery {
        /// Target pid.
        pid: u32,
        /// Errno from the final `SIGKILL`.
        #[source]
        source: Errno,
    },
    /// An engine call failed.
    #[error("engine {operation} failed: {source}")]
    Engine {
        /// Operation that failed (`parse`, `apply`, `reload`, `shutdown`).
        operation: &'static str,
        /// Underlying engine failure.
        #[source]
        source: EngineError,
    },
    /// The foreground signal listener failed.
    #[error(transparent)]
    Shutdown(#[from] ShutdownError),
}

fn holder_suffix(pid: Option<u32>) -> String {
    pid.map(|pid| format!(" (pid {pid})")).unwrap_or_default()
}
