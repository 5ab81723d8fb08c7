//! Service supervision for clash-fish.
//!
//! [`ServiceLifecycleManager`] drives the proxy engine through the
//! [`EngineHandle`] boundary, records the supervising process in a PID file,
//! and serialises concurrent `start`/`stop` invocations with an exclusive
//! lock file. [`vpn`] reports whether a VPN tunnel is active alongside the
//! engine; [`telemetry`] installs the process-wide tracing subscriber.

pub mod engine;
mod lifecycle;
mod process;
pub mod telemetry;
pub mod vpn;

pub use engine::{
    DEFAULT_ENGINE_BIN, ENGINE_BIN_ENV, ENGINE_STOP_TIMEOUT, EngineConfig, EngineError,
    EngineHandle, EngineLauncher, ExternalEngine, ExternalEngineLauncher,
};
pub use lifecycle::{ConfigState, LifecycleError, ServiceLifecycleManager, ServiceStatus};
pub use process::{
    LOCK_WAIT, POLL_INTERVAL, PidRecord, STOP_TIMEOUT, ShutdownError, ShutdownSignal,
    SupervisorEvent, SystemShutdownSignal, current_euid, ensure_root, is_alive,
};
pub use vpn::VpnInfo;

#[cfg(test)]
mod tests;
