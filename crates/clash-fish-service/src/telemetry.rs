//! Structured telemetry initialisation for the supervisor.

use std::fs::{File, OpenOptions};
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use clash_fish_config::LogFormat;
use once_cell::sync::OnceCell;
use tracing::{Subscriber, subscriber::SetGlobalDefaultError, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::{self, writer::BoxMakeWriter, writer::MakeWriterExt};

static TELEMETRY_GUARD: OnceCell<()> = OnceCell::new();

const TELEMETRY_TARGET: &str = "clash_fish::telemetry";

/// Default filter when `--debug` is absent.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Filter used when `--debug` is passed.
pub const DEBUG_LOG_FILTER: &str = "debug";

/// Settings for the process-wide subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// `EnvFilter` directive string.
    pub filter: String,
    /// Output format.
    pub format: LogFormat,
    /// Optional file that receives a copy of every event.
    pub log_file: Option<PathBuf>,
}

impl TelemetryConfig {
    /// Builds settings from the CLI flags.
    ///
    /// `log_file` is only kept when its directory already exists; the
    /// supervisor never creates log directories on its own.
    #[must_use]
    pub fn new(debug: bool, format: LogFormat, log_file: Option<&Path>) -> Self {
        let filter = if debug {
            DEBUG_LOG_FILTER
        } else {
            DEFAULT_LOG_FILTER
        };
        Self {
            filter: filter.to_owned(),
            format,
            log_file: log_file
                .filter(|path| path.parent().is_some_and(Path::is_dir))
                .map(Path::to_path_buf),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self::new(false, LogFormat::default(), None)
    }
}

/// Handle returned when telemetry has been initialised.
#[derive(Debug, Default, Clone, Copy)]
pub struct TelemetryHandle;

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Failed to parse the configured log filter expression.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// Failed to install the tracing subscriber.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Configures the global tracing subscriber when invoked for the first time.
///
/// Repeated calls are idempotent: the first invocation installs the global
/// subscriber and later invocations return a fresh [`TelemetryHandle`]
/// without touching global state.
///
/// # Errors
///
/// Returns [`TelemetryError`] when the filter is invalid or another
/// subscriber is already installed. An unusable log file is not an error.
pub fn initialise(config: &TelemetryConfig) -> Result<TelemetryHandle, TelemetryError> {
    TELEMETRY_GUARD
        .get_or_try_init(|| install_subscriber(config))
        .map(|_| TelemetryHandle)
}

fn install_subscriber(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_new(&config.filter)
        .map_err(|error| TelemetryError::Filter(error.to_string()))?;

    let sink = LogSink::open(config.log_file.as_deref());
    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(sink.writer)
        .with_ansi(sink.ansi)
        .with_timer(fmt::time::UtcTime::rfc_3339());

    let subscriber: Box<dyn Subscriber + Send + Sync> = match config.format {
        LogFormat::Json => Box::new(builder.json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder.compact().finish()),
    };

    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)?;
    if let Some((path, error)) = sink.unavailable {
        warn!(
            target: TELEMETRY_TARGET,
            file = %path.display(),
            error = %error,
            "log file unavailable; logging to stderr only"
        );
    }
    Ok(())
}

/// Destination for formatted events.
///
/// A log file that cannot be opened never fails initialisation: events
/// fall back to stderr and the failure is reported once the subscriber is
/// live.
struct LogSink {
    writer: BoxMakeWriter,
    ansi: bool,
    unavailable: Option<(PathBuf, io::Error)>,
}

impl LogSink {
    fn open(log_file: Option<&Path>) -> Self {
        let Some(path) = log_file else {
            return Self::stderr_only(None);
        };
        match open_log_file(path) {
            Ok(file) => Self {
                writer: BoxMakeWriter::new(io::stderr.and(Mutex::new(file))),
                ansi: false,
                unavailable: None,
            },
            Err(error) => Self::stderr_only(Some((path.to_path_buf(), error))),
        }
    }

    fn stderr_only(unavailable: Option<(PathBuf, io::Error)>) -> Self {
        Self {
            writer: BoxMakeWriter::new(io::stderr),
            ansi: io::stderr().is_terminal(),
            unavailable,
        }
    }
}

fn open_log_file(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}
