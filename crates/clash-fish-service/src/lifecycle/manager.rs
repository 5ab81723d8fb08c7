//! State machine driving the engine through start, stop, and restart.
//!
//! The service is `Running` exactly when the PID record exists and names a
//! live process. Nothing else is persisted: transitions complete within one
//! command invocation. Check-then-write sequences run under
//! [`LifecycleLock`] so two concurrent invocations cannot both start.

use std::time::Duration;

use clash_fish_config::{ConfigError, ConfigPaths, ConfigStore, ConfigSummary};
use tracing::{info, warn};

use super::status::{ConfigState, ServiceStatus};
use super::{INIT_COMMAND, LIFECYCLE_TARGET, LifecycleError};
use crate::engine::{EngineHandle, EngineLauncher, ExternalEngineLauncher};
use crate::process::{
    LOCK_WAIT, LifecycleLock, PidRecord, STOP_TIMEOUT, ShutdownSignal, SupervisorEvent,
    is_alive, terminate,
};
use crate::vpn::{InterfaceSource, SystemInterfaces, VpnInfo, detect_or_inactive};

/// Orchestrates the configuration store, VPN detector, and engine.
pub struct ServiceLifecycleManager {
    store: ConfigStore,
    record: PidRecord,
    launcher: Box<dyn EngineLauncher>,
    interfaces: Box<dyn InterfaceSource>,
    engine: Option<Box<dyn EngineHandle>>,
    stop_timeout: Duration,
    lock_wait: Duration,
}

impl ServiceLifecycleManager {
    /// Manager for `paths` driving the external engine binary.
    #[must_use]
    pub fn new(paths: ConfigPaths) -> Self {
        Self {
            record: PidRecord::new(paths.pid_file()),
            store: ConfigStore::new(paths),
            launcher: Box::new(ExternalEngineLauncher::new()),
            interfaces: Box::new(SystemInterfaces),
            engine: None,
            stop_timeout: STOP_TIMEOUT,
            lock_wait: LOCK_WAIT,
        }
    }

    /// Replaces the engine launcher.
    #[must_use]
    pub fn with_launcher(mut self, launcher: impl EngineLauncher + 'static) -> Self {
        self.launcher = Box::new(launcher);
        self
    }

    /// Replaces the interface source used by VPN detection.
    #[must_use]
    pub fn with_interfaces(mut self, interfaces: impl InterfaceSource + 'static) -> Self {
        self.interfaces = Box::new(interfaces);
        self
    }

    /// Bounds the wait between `SIGTERM` and `SIGKILL` in [`Self::stop`].
    #[must_use]
    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    /// Bounds the wait for a lock held by another live invocation.
    #[must_use]
    pub fn with_lock_wait(mut self, wait: Duration) -> Self {
        self.lock_wait = wait;
        self
    }

    /// Layout this manager operates on.
    #[must_use]
    pub fn paths(&self) -> &ConfigPaths {
        self.store.paths()
    }

    /// The PID record.
    #[must_use]
    pub fn record(&self) -> &PidRecord {
        &self.record
    }

    /// Whether the record exists and names a live process.
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self.running_pid(), Ok(Some(_)))
    }

    /// Recorded pid of the running service.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NotRunning`] unless [`Self::is_running`]
    /// holds.
    pub fn pid(&self) -> Result<u32, LifecycleError> {
        self.running_pid()?.ok_or(LifecycleError::NotRunning)
    }

    /// Brings the engine up and records this process as the service.
    ///
    /// Nothing is written when the configuration is missing or the engine
    /// fails to parse or apply it. If the record cannot be written the
    /// engine is stopped again before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::AlreadyRunning`],
    /// [`LifecycleError::ConfigNotFound`], configuration and engine
    /// failures, or lock and record I/O failures.
    pub fn start(&mut self) -> Result<u32, LifecycleError> {
        self.ensure_stopped()?;
        if !self.store.exists() {
            return Err(LifecycleError::ConfigNotFound {
                path: self.store.config_file().to_path_buf(),
                init_command: INIT_COMMAND,
            });
        }

        let _lock = LifecycleLock::acquire(self.paths().lock_file(), self.lock_wait)?;
        self.ensure_stopped()?;
        let config = self.store.load_validated()?;

        let vpn = detect_or_inactive(self.interfaces.as_ref());
        if vpn.active {
            info!(
                target: LIFECYCLE_TARGET,
                interface = vpn.interface_name.as_deref().unwrap_or_default(),
                network = %vpn.network.map(|network| network.to_string()).unwrap_or_default(),
                "vpn tunnel detected; engine will coexist with it"
            );
        }

        let mut engine = self.launcher.build(self.store.paths());
        let bytes = self.store.read_raw()?;
        let parsed = engine
            .parse(&bytes)
            .map_err(|source| LifecycleError::Engine {
                operation: "parse",
                source,
            })?;
        if let Err(source) = engine.apply(&parsed, true) {
            shutdown_quietly(engine.as_mut());
            return Err(LifecycleError::Engine {
                operation: "apply",
                source,
            });
        }

        let pid = std::process::id();
        if let Err(error) = self.record.write(pid) {
            shutdown_quietly(engine.as_mut());
            return Err(error);
        }
        self.engine = Some(engine);
        info!(
            target: LIFECYCLE_TARGET,
            pid,
            mode = %config.mode,
            port = config.http_port,
            socks_port = config.socks_port,
            "service started"
        );
        Ok(pid)
    }

    /// Stops the recorded service and clears the record.
    ///
    /// When the record names this process the engine is torn down in
    /// process. Otherwise the recorded process receives `SIGTERM`, then
    /// `SIGKILL` after the stop timeout.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NotRunning`] without a record,
    /// [`LifecycleError::StaleRecord`] after removing a record whose process
    /// is gone, and [`LifecycleError::SignalDelivery`] when the process
    /// cannot be killed.
    pub fn stop(&mut self) -> Result<u32, LifecycleError> {
        let pid = self.record.read()?.ok_or(LifecycleError::NotRunning)?;
        if pid == std::process::id() {
            return self.shutdown_in_process();
        }

        let _lock = LifecycleLock::acquire(self.paths().lock_file(), self.lock_wait)?;
        let pid = self.record.read()?.ok_or(LifecycleError::NotRunning)?;
        if !is_alive(pid) {
            self.record.remove()?;
            warn!(target: LIFECYCLE_TARGET, pid, "removed stale pid file");
            return Err(LifecycleError::StaleRecord {
                pid,
                path: self.record.path().to_path_buf(),
            });
        }

        terminate(pid, self.stop_timeout)?;
        self.record.remove()?;
        info!(target: LIFECYCLE_TARGET, pid, "service stopped");
        Ok(pid)
    }

    /// Stops the service if it is running, then starts it.
    ///
    /// Not atomic: a failed start leaves the service stopped.
    ///
    /// # Errors
    ///
    /// Propagates failures from [`Self::stop`] and [`Self::start`].
    pub fn restart(&mut self) -> Result<u32, LifecycleError> {
        if self.is_running() {
            self.stop()?;
        }
        self.start()
    }

    /// Re-reads the configuration and hands it to the in-process engine.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NotRunning`] when this process does not own
    /// an engine, and configuration or engine failures otherwise.
    pub fn reload(&mut self) -> Result<(), LifecycleError> {
        let Some(engine) = self.engine.as_mut() else {
            return Err(LifecycleError::NotRunning);
        };
        self.store.load_validated()?;
        let bytes = self.store.read_raw()?;
        let parsed = engine
            .parse(&bytes)
            .map_err(|source| LifecycleError::Engine {
                operation: "parse",
                source,
            })?;
        engine
            .apply(&parsed, false)
            .map_err(|source| LifecycleError::Engine {
                operation: "reload",
                source,
            })?;
        info!(target: LIFECYCLE_TARGET, "configuration reloaded");
        Ok(())
    }

    /// Blocks until `signals` requests shutdown, reloading on request.
    ///
    /// A failed reload is logged and leaves the running configuration in
    /// place.
    ///
    /// # Errors
    ///
    /// Returns listener failures and failures tearing the engine down.
    pub fn supervise(&mut self, signals: &mut dyn ShutdownSignal) -> Result<(), LifecycleError> {
        loop {
            match signals.wait()? {
                SupervisorEvent::Reload => {
                    if let Err(error) = self.reload() {
                        warn!(target: LIFECYCLE_TARGET, error = %error, "reload failed");
                    }
                }
                SupervisorEvent::Shutdown { signal } => {
                    info!(target: LIFECYCLE_TARGET, signal, "shutting down");
                    self.shutdown_in_process()?;
                    return Ok(());
                }
            }
        }
    }

    /// Reports the service state, configuration, and VPN detection result.
    #[must_use]
    pub fn status(&self) -> ServiceStatus {
        let pid = self.running_pid().ok().flatten();
        let config = match self.store.load_validated() {
            Ok(config) => ConfigState::Loaded(ConfigSummary::from(&config)),
            Err(ConfigError::NotFound { .. }) => ConfigState::Missing,
            Err(error) => ConfigState::Invalid {
                error: error.to_string(),
            },
        };
        ServiceStatus {
            running: pid.is_some(),
            pid,
            config_path: self.store.config_file().to_path_buf(),
            config,
            vpn: self.vpn(),
        }
    }

    /// Runs the VPN detector, downgrading failures to an inactive report.
    #[must_use]
    pub fn vpn(&self) -> VpnInfo {
        detect_or_inactive(self.interfaces.as_ref())
    }

    fn running_pid(&self) -> Result<Option<u32>, LifecycleError> {
        match self.record.read() {
            Ok(pid) => Ok(pid.filter(|pid| is_alive(*pid))),
            Err(LifecycleError::PidParse { path, content }) => {
                warn!(
                    target: LIFECYCLE_TARGET,
                    file = %path.display(),
                    content = %content,
                    "ignoring unreadable pid file"
                );
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }

    fn ensure_stopped(&self) -> Result<(), LifecycleError> {
        match self.running_pid()? {
            Some(pid) => Err(LifecycleError::AlreadyRunning { pid }),
            None => Ok(()),
        }
    }

    fn shutdown_in_process(&mut self) -> Result<u32, LifecycleError> {
        let pid = std::process::id();
        if let Some(mut engine) = self.engine.take() {
            engine
                .shutdown()
                .map_err(|source| LifecycleError::Engine {
                    operation: "shutdown",
                    source,
                })?;
        }
        if self.record.read().ok().flatten() == Some(pid) {
            self.record.remove()?;
        }
        info!(target: LIFECYCLE_TARGET, pid, "service stopped");
        Ok(pid)
    }
}

fn shutdown_quietly(engine: &mut dyn EngineHandle) {
    if let Err(error) = engine.shutdown() {
        warn!(target: LIFECYCLE_TARGET, error = %error, "failed to stop engine after start failure");
    }
}
