//! Derives the configuration directory layout shared by every command.
//!
//! The CLI, the lifecycle manager, and the telemetry layer all need to agree
//! on where the document, PID record, lock file, and logs live. Everything is
//! rooted in a single configuration directory so that two directories mean
//! two independent services.

use std::env;
use std::path::{Path, PathBuf};

/// Application name used for directory and file names.
pub const APP_NAME: &str = "clash-fish";

const CONFIG_FILE_NAME: &str = "config.yaml";
const PID_FILE_NAME: &str = "clash-fish.pid";
const LOCK_FILE_NAME: &str = "clash-fish.lock";
const LOG_FILE_NAME: &str = "clash-fish.log";
const LOGS_DIR_NAME: &str = "logs";
const PROFILES_DIR_NAME: &str = "profiles";
const CACHE_DIR_NAME: &str = "cache";

/// Canonical paths under one configuration directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    config_dir: PathBuf,
    config_file: PathBuf,
    pid_file: PathBuf,
    lock_file: PathBuf,
    logs_dir: PathBuf,
    profiles_dir: PathBuf,
    cache_dir: PathBuf,
}

impl ConfigPaths {
    /// Derives the layout rooted at `config_dir`. Nothing is created.
    #[must_use]
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        let config_dir = config_dir.into();
        Self {
            config_file: config_dir.join(CONFIG_FILE_NAME),
            pid_file: config_dir.join(PID_FILE_NAME),
            lock_file: config_dir.join(LOCK_FILE_NAME),
            logs_dir: config_dir.join(LOGS_DIR_NAME),
            profiles_dir: config_dir.join(PROFILES_DIR_NAME),
            cache_dir: config_dir.join(CACHE_DIR_NAME),
            config_dir,
        }
    }

    /// Root configuration directory.
    #[must_use]
    pub fn config_dir(&self) -> &Path {
        self.config_dir.as_path()
    }

    /// Path to `config.yaml`.
    #[must_use]
    pub fn config_file(&self) -> &Path {
        self.config_file.as_path()
    }

    /// Path to the PID record.
    #[must_use]
    pub fn pid_file(&self) -> &Path {
        self.pid_file.as_path()
    }

    /// Path to the lock file guarding start and stop.
    #[must_use]
    pub fn lock_file(&self) -> &Path {
        self.lock_file.as_path()
    }

    /// Directory for log files.
    #[must_use]
    pub fn logs_dir(&self) -> &Path {
        self.logs_dir.as_path()
    }

    /// Directory for downloaded profiles.
    #[must_use]
    pub fn profiles_dir(&self) -> &Path {
        self.profiles_dir.as_path()
    }

    /// Directory for engine caches.
    #[must_use]
    pub fn cache_dir(&self) -> &Path {
        self.cache_dir.as_path()
    }

    /// Supervisor log file inside [`Self::logs_dir`].
    #[must_use]
    pub fn log_file(&self) -> PathBuf {
        self.logs_dir.join(LOG_FILE_NAME)
    }

    /// Subdirectories `config init` creates alongside the document.
    #[must_use]
    pub fn subdirectories(&self) -> [&Path; 3] {
        [self.logs_dir(), self.profiles_dir(), self.cache_dir()]
    }
}

/// Default configuration directory: `$HOME/.config/clash-fish`.
///
/// Falls back to `<tmp>/clash-fish` when no home directory is known.
#[must_use]
pub fn default_config_dir() -> PathBuf {
    dirs::home_dir().map_or_else(
        || env::temp_dir().join(APP_NAME),
        |home| home.join(".config").join(APP_NAME),
    )
}
