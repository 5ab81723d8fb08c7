//! Start, stop, restart, and status for the supervised engine.

mod error;
mod manager;
mod status;

pub use error::LifecycleError;
pub use manager::ServiceLifecycleManager;
pub use status::{ConfigState, ServiceStatus};

/// Tracing target for lifecycle events.
pub(crate) const LIFECYCLE_TARGET: &str = "clash_fish::lifecycle";

/// Command suggested when the configuration file is missing.
pub(crate) const INIT_COMMAND: &str = "clash-fish config init";
