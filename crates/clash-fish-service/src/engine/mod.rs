//! Control surface over the proxy engine.
//!
//! The engine is opaque: it receives the raw configuration bytes, turns them
//! into its own representation, and activates them. Stopping is signal
//! based, so [`EngineHandle::shutdown`] is the only in-process teardown hook.

mod external;

use std::ffi::OsString;
use std::io;

use clash_fish_config::ConfigPaths;
use nix::errno::Errno;
use serde_yaml::Mapping;
use thiserror::Error;

pub use external::{
    DEFAULT_ENGINE_BIN, ENGINE_BIN_ENV, ENGINE_STOP_TIMEOUT, ExternalEngine, ExternalEngineLauncher,
};

/// Tracing target for engine events.
pub const ENGINE_TARGET: &str = "clash_fish::engine";

/// The engine's view of a parsed configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    document: Mapping,
}

impl EngineConfig {
    /// Wraps a parsed top-level mapping.
    #[must_use]
    pub fn new(document: Mapping) -> Self {
        Self { document }
    }

    /// Top-level document mapping.
    #[must_use]
    pub fn document(&self) -> &Mapping {
        &self.document
    }
}

/// Operations the supervisor performs on a running engine.
pub trait EngineHandle {
    /// Translates raw configuration bytes into the engine's representation.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when the engine rejects the document.
    fn parse(&mut self, bytes: &[u8]) -> Result<EngineConfig, EngineError>;

    /// Activates `config`.
    ///
    /// `initial` is `true` when the engine is first brought up and `false`
    /// for a live reload that must leave an established tunnel in place.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when activation fails.
    fn apply(&mut self, config: &EngineConfig, initial: bool) -> Result<(), EngineError>;

    /// Stops the engine. Calling this on a stopped engine is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when the engine could not be stopped.
    fn shutdown(&mut self) -> Result<(), EngineError>;
}

/// Builds an [`EngineHandle`] for a configuration directory.
pub trait EngineLauncher {
    /// Constructs a handle bound to `paths`.
    fn build(&self, paths: &ConfigPaths) -> Box<dyn EngineHandle>;
}

impl<F> EngineLauncher for F
where
    F: Fn(&ConfigPaths) -> Box<dyn EngineHandle>,
{
    fn build(&self, paths: &ConfigPaths) -> Box<dyn EngineHandle> {
        self(paths)
    }
}

/// Errors reported by the engine boundary.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The configuration bytes are not valid YAML.
    #[error("engine rejected configuration: {source}")]
    Parse {
        /// Underlying YAML failure.
        #[source]
        source: serde_yaml::Error,
    },
    /// The configuration document is not a mapping.
    #[error("engine configuration must be a mapping at the top level")]
    NotAMapping,
    /// The engine binary could not be spawned.
    #[error("failed to launch engine '{}': {source}", binary.to_string_lossy())]
    Launch {
        /// Binary that was executed.
        binary: OsString,
        /// Underlying spawn failure.
        #[source]
        source: io::Error,
    },
    /// `apply(_, true)` was called while an engine is already running.
    #[error("engine is already running")]
    AlreadyStarted,
    /// A reload or shutdown targeted an engine that was never started.
    #[error("engine has not been started")]
    NotStarted,
    /// The engine process exited on its own.
    #[error("engine exited unexpectedly ({status})")]
    ExitedEarly {
        /// Exit status as reported by the OS.
        status: String,
    },
    /// Delivering a signal to the engine process failed.
    #[error("failed to signal engine process {pid}: {source}")]
    Signal {
        /// Engine process id.
        pid: u32,
        /// Underlying errno.
        #[source]
        source: Errno,
    },
    /// Waiting on the engine process failed.
    #[error("failed to wait for engine process: {source}")]
    Wait {
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
}
