//! Test doubles for the engine, interface, and signal seams.

use std::collections::VecDeque;
use std::fs;
use std::io;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use clash_fish_config::{ConfigPaths, ConfigStore};
use tempfile::TempDir;

use crate::engine::{EngineConfig, EngineError, EngineHandle};
use crate::process::{ShutdownError, ShutdownSignal, SupervisorEvent};
use crate::vpn::{InterfaceAddress, InterfaceSource};
use crate::ServiceLifecycleManager;

/// Calls observed by [`RecordingEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum EngineCall {
    Parse,
    Apply { initial: bool },
    Shutdown,
}

/// Failure injected into [`RecordingEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Failure {
    None,
    Parse,
    Apply,
    /// Apply succeeds but leaves a directory where the PID record belongs.
    BlockRecord,
}

#[derive(Debug, Clone)]
pub(super) struct RecordingEngine {
    calls: Arc<Mutex<Vec<EngineCall>>>,
    failure: Failure,
    pid_file: PathBuf,
}

impl RecordingEngine {
    pub(super) fn new(failure: Failure, pid_file: PathBuf) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            failure,
            pid_file,
        }
    }

    pub(super) fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    fn push(&self, call: EngineCall) {
        self.calls.lock().expect("calls lock").push(call);
    }
}

impl EngineHandle for RecordingEngine {
    fn parse(&mut self, bytes: &[u8]) -> Result<EngineConfig, EngineError> {
        self.push(EngineCall::Parse);
        if self.failure == Failure::Parse {
            return Err(EngineError::NotAMapping);
        }
        let value: serde_yaml::Value =
            serde_yaml::from_slice(bytes).map_err(|source| EngineError::Parse { source })?;
        match value {
            serde_yaml::Value::Mapping(document) => Ok(EngineConfig::new(document)),
            _ => Err(EngineError::NotAMapping),
        }
    }

    fn apply(&mut self, _config: &EngineConfig, initial: bool) -> Result<(), EngineError> {
        self.push(EngineCall::Apply { initial });
        if self.failure == Failure::Apply {
            return Err(EngineError::ExitedEarly {
                status: String::from("exit status: 1"),
            });
        }
        if self.failure == Failure::BlockRecord && initial {
            fs::create_dir_all(&self.pid_file).expect("block pid record");
        }
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), EngineError> {
        self.push(EngineCall::Shutdown);
        Ok(())
    }
}

pub(super) struct StaticInterfaces(pub(super) Vec<InterfaceAddress>);

impl StaticInterfaces {
    pub(super) fn none() -> Self {
        Self(Vec::new())
    }

    pub(super) fn utun() -> Self {
        Self(vec![InterfaceAddress {
            name: String::from("utun0"),
            address: Ipv4Addr::new(10, 8, 0, 5),
            netmask: Some(Ipv4Addr::new(255, 255, 255, 0)),
        }])
    }
}

impl InterfaceSource for StaticInterfaces {
    fn ipv4_addresses(&self) -> io::Result<Vec<InterfaceAddress>> {
        Ok(self.0.clone())
    }
}

/// Replays a fixed sequence of supervisor events.
pub(super) struct ScriptedSignal(pub(super) VecDeque<SupervisorEvent>);

impl ShutdownSignal for ScriptedSignal {
    fn wait(&mut self) -> Result<SupervisorEvent, ShutdownError> {
        self.0.pop_front().ok_or(ShutdownError::Closed)
    }
}

/// A temporary configuration directory with a manager over it.
pub(super) struct Harness {
    pub(super) _dir: TempDir,
    pub(super) paths: ConfigPaths,
    pub(super) engine: RecordingEngine,
}

impl Harness {
    pub(super) fn new(failure: Failure) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = ConfigPaths::new(dir.path().join("clash-fish"));
        let engine = RecordingEngine::new(failure, paths.pid_file().to_path_buf());
        Self {
            _dir: dir,
            paths,
            engine,
        }
    }

    pub(super) fn initialised(failure: Failure) -> Self {
        let harness = Self::new(failure);
        ConfigStore::new(harness.paths.clone())
            .init()
            .expect("init config");
        harness
    }

    pub(super) fn manager(&self) -> ServiceLifecycleManager {
        let engine = self.engine.clone();
        ServiceLifecycleManager::new(self.paths.clone())
            .with_launcher(move |_paths: &ConfigPaths| -> Box<dyn EngineHandle> {
                Box::new(engine.clone())
            })
            .with_interfaces(StaticInterfaces::none())
            .with_stop_timeout(std::time::Duration::from_secs(5))
            .with_lock_wait(std::time::Duration::ZERO)
    }
}
