//! Fake backend driving the runtime without touching the real process.

use std::collections::VecDeque;
use std::ffi::OsString;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clash_fish_config::ConfigPaths;
use clash_fish_service::telemetry::{TelemetryConfig, TelemetryError};
use clash_fish_service::{
    EngineConfig, EngineError, EngineHandle, ServiceLifecycleManager, ShutdownError,
    ShutdownSignal, SupervisorEvent,
};
use tempfile::TempDir;

use crate::{ServiceBackend, run_with_backend};

/// Engine that records its calls instead of spawning a binary.
#[derive(Debug, Clone, Default)]
pub(super) struct FakeEngine {
    calls: Arc<Mutex<Vec<&'static str>>>,
}

impl FakeEngine {
    pub(super) fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().expect("calls lock").clone()
    }

    fn push(&self, call: &'static str) {
        self.calls.lock().expect("calls lock").push(call);
    }
}

impl EngineHandle for FakeEngine {
    fn parse(&mut self, _bytes: &[u8]) -> Result<EngineConfig, EngineError> {
        self.push("parse");
        Ok(EngineConfig::new(Default::default()))
    }

    fn apply(&mut self, _config: &EngineConfig, initial: bool) -> Result<(), EngineError> {
        self.push(if initial { "apply" } else { "reload" });
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), EngineError> {
        self.push("shutdown");
        Ok(())
    }
}

struct QueuedSignal(VecDeque<SupervisorEvent>);

impl ShutdownSignal for QueuedSignal {
    fn wait(&mut self) -> Result<SupervisorEvent, ShutdownError> {
        self.0.pop_front().ok_or(ShutdownError::Closed)
    }
}

/// Backend with a scripted uid, signal queue, and a recording engine.
pub(super) struct FakeBackend {
    pub(super) euid: u32,
    pub(super) events: Vec<SupervisorEvent>,
    pub(super) engine: FakeEngine,
    pub(super) telemetry: Vec<TelemetryConfig>,
}

impl FakeBackend {
    pub(super) fn new(euid: u32) -> Self {
        Self {
            euid,
            events: vec![SupervisorEvent::Shutdown { signal: 2 }],
            engine: FakeEngine::default(),
            telemetry: Vec::new(),
        }
    }
}

impl ServiceBackend for FakeBackend {
    fn manager(&mut self, paths: ConfigPaths) -> ServiceLifecycleManager {
        let engine = self.engine.clone();
        ServiceLifecycleManager::new(paths)
            .with_launcher(move |_: &ConfigPaths| -> Box<dyn EngineHandle> {
                Box::new(engine.clone())
            })
            .with_stop_timeout(Duration::from_secs(5))
            .with_lock_wait(Duration::ZERO)
    }

    fn shutdown_signal(&mut self) -> Result<Box<dyn ShutdownSignal>, ShutdownError> {
        Ok(Box::new(QueuedSignal(self.events.drain(..).collect())))
    }

    fn effective_uid(&self) -> u32 {
        self.euid
    }

    fn init_telemetry(&mut self, config: &TelemetryConfig) -> Result<(), TelemetryError> {
        self.telemetry.push(config.clone());
        Ok(())
    }
}

/// Captured result of one invocation.
pub(super) struct Invocation {
    pub(super) exit: ExitCode,
    pub(super) stdout: String,
    pub(super) stderr: String,
}

/// Temporary configuration directory plus helpers to invoke the runtime.
pub(super) struct Workspace {
    pub(super) dir: TempDir,
}

impl Workspace {
    pub(super) fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("tempdir"),
        }
    }

    pub(super) fn paths(&self) -> ConfigPaths {
        ConfigPaths::new(self.config_dir())
    }

    pub(super) fn config_dir(&self) -> std::path::PathBuf {
        self.dir.path().join("clash-fish")
    }

    pub(super) fn run(&self, backend: &mut FakeBackend, args: &[&str]) -> Invocation {
        let mut argv: Vec<OsString> = vec![OsString::from("clash-fish")];
        argv.push(OsString::from("--config-dir"));
        argv.push(self.config_dir().into_os_string());
        argv.extend(args.iter().map(OsString::from));
        run_raw(backend, argv)
    }
}

pub(super) fn run_raw(backend: &mut FakeBackend, argv: Vec<OsString>) -> Invocation {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let exit = run_with_backend(argv, &mut stdout, &mut stderr, backend);
    Invocation {
        exit,
        stdout: String::from_utf8(stdout).expect("stdout utf8"),
        stderr: String::from_utf8(stderr).expect("stderr utf8"),
    }
}
