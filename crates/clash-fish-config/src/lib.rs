//! Configuration document, defaults, and on-disk store for clash-fish.
//!
//! The proxy engine consumes a single YAML document living at
//! `<configDir>/config.yaml`. This crate owns the schema of that document,
//! the literal defaults written by `config init`, the pure validation pass
//! run before the engine ever sees the bytes, and the store that loads and
//! rewrites the file. It also derives the canonical paths every other crate
//! agrees on (PID record, lifecycle lock, log directory).

mod defaults;
mod document;
mod files;
mod logging;
mod modes;
mod paths;
mod store;
mod summary;
mod validation;

pub use defaults::{
    CONFIG_HEADER, DEFAULT_EXTERNAL_CONTROLLER, DEFAULT_HTTP_PORT, DEFAULT_SOCKS_PORT,
    default_configuration,
};
pub use document::{Configuration, DnsConfig, Proxy, ProxyGroup, TunConfig};
pub use files::write_atomically;
pub use logging::{LogFormat, LogFormatParseError};
pub use modes::{DnsEnhancedMode, LogLevel, ProxyMode, TunStack};
pub use paths::{APP_NAME, ConfigPaths, default_config_dir};
pub use store::{ConfigError, ConfigStore, InitOutcome};
pub use summary::ConfigSummary;
pub use validation::{RESERVED_TARGETS, ValidationError, validate};

#[cfg(test)]
mod tests;
