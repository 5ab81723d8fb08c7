//! Command table for the `clash-fish` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clash_fish_config::{LogFormat, default_config_dir};

/// Top-level arguments shared by every command.
#[derive(Parser, Debug)]
#[command(
    name = "clash-fish",
    version,
    about = "Supervise a local proxy engine with TUN and DNS interception",
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Configuration directory.
    #[arg(
        long,
        global = true,
        env = "CLASH_FISH_CONFIG_DIR",
        value_name = "DIR",
        default_value_os_t = default_config_dir()
    )]
    pub config_dir: PathBuf,
    /// Enables debug logging.
    #[arg(long, global = true, env = "CLASH_FISH_DEBUG")]
    pub debug: bool,
    /// Log output format (`json` or `compact`).
    #[arg(
        long,
        global = true,
        env = "CLASH_FISH_LOG_FORMAT",
        value_name = "FORMAT",
        default_value_t = LogFormat::Compact
    )]
    pub log_format: LogFormat,
    /// Command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Commands understood by the binary.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Starts the engine and supervises it until interrupted (requires root).
    Start,
    /// Stops the running service (requires root).
    Stop,
    /// Stops the service if running, then starts it in the foreground
    /// (requires root).
    Restart,
    /// Shows service, VPN, and configuration status.
    Status {
        /// Emits machine-readable JSON.
        #[arg(long)]
        json: bool,
    },
    /// Manages the configuration file.
    Config {
        /// Configuration action.
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Prints the version.
    Version,
}

/// `config` subcommands.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigAction {
    /// Creates the configuration directory and a default configuration.
    Init,
    /// Checks the configuration for errors.
    Validate,
    /// Summarises the current configuration.
    Show,
    /// Prints the configuration file path.
    Path,
}

impl Command {
    /// Whether the command changes service state and therefore needs root.
    #[must_use]
    pub fn requires_root(&self) -> bool {
        matches!(self, Self::Start | Self::Stop | Self::Restart)
    }
}
