//! Engine backed by an external proxy binary.
//!
//! The binary is started as `<bin> -d <configDir> -f <configPath>` and is
//! driven with signals afterwards: `SIGHUP` reloads its configuration and
//! `SIGTERM` stops it, escalating to `SIGKILL` after a bounded wait.

use std::env;
use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use clash_fish_config::ConfigPaths;
use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use tracing::{debug, info, warn};

use super::{ENGINE_TARGET, EngineConfig, EngineError, EngineHandle, EngineLauncher};
use crate::process::POLL_INTERVAL;

/// Environment variable overriding the engine binary.
pub const ENGINE_BIN_ENV: &str = "CLASH_FISH_ENGINE_BIN";

/// Engine binary used when no override is set.
pub const DEFAULT_ENGINE_BIN: &str = "mihomo";

/// Bound on the wait between `SIGTERM` and `SIGKILL` for the engine child.
///
/// Shorter than [`crate::STOP_TIMEOUT`] so a supervisor asked to stop finishes its
/// own teardown before the stopping command escalates.
pub const ENGINE_STOP_TIMEOUT: Duration = Duration::from_secs(5);

const STARTUP_GRACE: Duration = Duration::from_millis(500);

/// Builds [`ExternalEngine`] handles.
#[derive(Debug, Clone, Default)]
pub struct ExternalEngineLauncher {
    binary: Option<OsString>,
    stop_timeout: Option<Duration>,
}

impl ExternalEngineLauncher {
    /// Resolves the binary from [`ENGINE_BIN_ENV`] or [`DEFAULT_ENGINE_BIN`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `binary` regardless of the environment.
    #[must_use]
    pub fn with_binary(mut self, binary: impl Into<OsString>) -> Self {
        self.binary = Some(binary.into());
        self
    }

    /// Bounds the wait between `SIGTERM` and `SIGKILL`.
    #[must_use]
    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = Some(timeout);
        self
    }

    fn resolve_binary(&self) -> OsString {
        self.binary
            .clone()
            .or_else(|| env::var_os(ENGINE_BIN_ENV))
            .unwrap_or_else(|| OsString::from(DEFAULT_ENGINE_BIN))
    }
}

impl EngineLauncher for ExternalEngineLauncher {
    fn build(&self, paths: &ConfigPaths) -> Box<dyn EngineHandle> {
        let mut engine = ExternalEngine::new(self.resolve_binary(), paths);
        if let Some(timeout) = self.stop_timeout {
            engine.stop_timeout = timeout;
        }
        Box::new(engine)
    }
}

/// A proxy engine running as a child process.
#[derive(Debug)]
pub struct ExternalEngine {
    binary: OsString,
    config_dir: PathBuf,
    config_path: PathBuf,
    child: Option<Child>,
    stop_timeout: Duration,
}

impl ExternalEngine {
    /// Creates a stopped engine bound to `paths`.
    #[must_use]
    pub fn new(binary: impl Into<OsString>, paths: &ConfigPaths) -> Self {
        Self {
            binary: binary.into(),
            config_dir: paths.config_dir().to_path_buf(),
            config_path: paths.config_file().to_path_buf(),
            child: None,
            stop_timeout: ENGINE_STOP_TIMEOUT,
        }
    }

    /// Process id of the running child, if any.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }

    fn spawn(&mut self) -> Result<(), EngineError> {
        let mut command = Command::new(&self.binary);
        command
            .arg("-d")
            .arg(&self.config_dir)
            .arg("-f")
            .arg(&self.config_path)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        let mut child = command.spawn().map_err(|source| EngineError::Launch {
            binary: self.binary.clone(),
            source,
        })?;

        let deadline = Instant::now() + STARTUP_GRACE;
        while Instant::now() < deadline {
            if let Some(status) = child
                .try_wait()
                .map_err(|source| EngineError::Wait { source })?
            {
                return Err(EngineError::ExitedEarly {
                    status: status.to_string(),
                });
            }
            thread::sleep(POLL_INTERVAL);
        }

        info!(
            target: ENGINE_TARGET,
            pid = child.id(),
            binary = %self.binary.to_string_lossy(),
            config = %self.config_path.display(),
            "engine started"
        );
        self.child = Some(child);
        Ok(())
    }

    fn reload(&mut self) -> Result<(), EngineError> {
        let child = self.child.as_mut().ok_or(EngineError::NotStarted)?;
        if let Some(status) = child
            .try_wait()
            .map_err(|source| EngineError::Wait { source })?
        {
            self.child = None;
            return Err(EngineError::ExitedEarly {
                status: status.to_string(),
            });
        }
        let pid = child.id();
        send(pid, Signal::SIGHUP)?;
        info!(target: ENGINE_TARGET, pid, "engine reload requested");
        Ok(())
    }
}

impl EngineHandle for ExternalEngine {
    fn parse(&mut self, bytes: &[u8]) -> Result<EngineConfig, EngineError> {
        let value: serde_yaml::Value =
            serde_yaml::from_slice(bytes).map_err(|source| EngineError::Parse { source })?;
        match value {
            serde_yaml::Value::Mapping(document) => Ok(EngineConfig::new(document)),
            _ => Err(EngineError::NotAMapping),
        }
    }

    fn apply(&mut self, config: &EngineConfig, initial: bool) -> Result<(), EngineError> {
        debug!(
            target: ENGINE_TARGET,
            keys = config.document().len(),
            initial,
            "applying configuration"
        );
        if !initial {
            return self.reload();
        }
        if self.child.is_some() {
            return Err(EngineError::AlreadyStarted);
        }
        self.spawn()
    }

    fn shutdown(&mut self) -> Result<(), EngineError> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        let pid = child.id();
        if let Some(status) = child
            .try_wait()
            .map_err(|source| EngineError::Wait { source })?
        {
            info!(target: ENGINE_TARGET, pid, %status, "engine already exited");
            return Ok(());
        }

        match send(pid, Signal::SIGTERM) {
            Ok(()) | Err(EngineError::Signal { source: Errno::ESRCH, .. }) => {}
            Err(error) => {
                warn!(target: ENGINE_TARGET, pid, error = %error, "graceful stop failed");
            }
        }

        let deadline = Instant::now() + self.stop_timeout;
        while Instant::now() < deadline {
            if let Some(status) = child
                .try_wait()
                .map_err(|source| EngineError::Wait { source })?
            {
                info!(target: ENGINE_TARGET, pid, %status, "engine stopped");
                return Ok(());
            }
            thread::sleep(POLL_INTERVAL);
        }

        warn!(
            target: ENGINE_TARGET,
            pid,
            timeout_ms = self.stop_timeout.as_millis(),
            "engine ignored SIGTERM; killing"
        );
        match child.kill() {
            Ok(()) => {}
            Err(error) if error.kind() == io::ErrorKind::InvalidInput => {}
            Err(source) => return Err(EngineError::Wait { source }),
        }
        let status = child.wait().map_err(|source| EngineError::Wait { source })?;
        info!(target: ENGINE_TARGET, pid, %status, "engine killed");
        Ok(())
    }
}

impl Drop for ExternalEngine {
    fn drop(&mut self) {
        if self.child.is_some()
            && let Err(error) = self.shutdown()
        {
            warn!(target: ENGINE_TARGET, error = %error, "failed to stop engine on drop");
        }
    }
}

fn send(pid: u32, signal: Signal) -> Result<(), EngineError> {
    let raw = i32::try_from(pid).map_err(|_| EngineError::Signal {
        pid,
        source: Errno::EINVAL,
    })?;
    kill(Pid::from_raw(raw), signal).map_err(|source| EngineError::Signal { pid, source })
}
