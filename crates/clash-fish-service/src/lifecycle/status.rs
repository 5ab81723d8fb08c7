use std::path::PathBuf;

use clash_fish_config::ConfigSummary;
use serde::Serialize;

use crate::vpn::VpnInfo;

/// Snapshot reported by `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceStatus {
    /// Whether a live service is recorded.
    pub running: bool,
    /// Recorded pid of the live service.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    /// Path of the configuration document.
    pub config_path: PathBuf,
    /// State of the configuration document.
    pub config: ConfigState,
    /// Result of VPN detection.
    pub vpn: VpnInfo,
}

/// State of the configuration document as seen by `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConfigState {
    /// No document exists.
    Missing,
    /// The document failed to load or validate.
    Invalid {
        /// Rendered error.
        error: String,
    },
    /// The document loaded and validated.
    Loaded(ConfigSummary),
}
