//! Error types for the CLI runtime.

use std::io;

use clash_fish_config::ConfigError;
use clash_fish_service::LifecycleError;
use clash_fish_service::telemetry::TelemetryError;
use thiserror::Error;

/// Failures surfaced to the operator.
#[derive(Debug, Error)]
pub enum AppError {
    /// Installing telemetry failed.
    #[error("failed to initialise logging: {0}")]
    Telemetry(#[from] TelemetryError),
    /// A privileged command was run without root.
    #[error("{0}")]
    Privilege(LifecycleError),
    /// `start` failed.
    #[error("failed to start service: {0}")]
    Start(LifecycleError),
    /// `stop` failed.
    #[error("failed to stop service: {0}")]
    Stop(LifecycleError),
    /// `restart` failed.
    #[error("failed to restart service: {0}")]
    Restart(LifecycleError),
    /// The foreground supervisor failed.
    #[error("service supervision failed: {0}")]
    Supervise(LifecycleError),
    /// `config init` failed.
    #[error("failed to initialise configuration: {0}")]
    InitConfig(ConfigError),
    /// Loading the configuration failed.
    #[error("failed to load configuration: {0}")]
    LoadConfig(ConfigError),
    /// The configuration loaded but is invalid.
    #[error("{0}")]
    InvalidConfig(ConfigError),
    /// Installing signal handlers failed.
    #[error("failed to install signal handlers: {0}")]
    Signals(clash_fish_service::ShutdownError),
    /// Encoding `status --json` failed.
    #[error("failed to serialise status: {0}")]
    SerialiseStatus(serde_json::Error),
    /// Writing to stdout or stderr failed.
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}
