//! Command-line runtime for the clash-fish proxy supervisor.
//!
//! The module owns argument parsing, telemetry bootstrapping, and dispatch
//! to the lifecycle and configuration commands. Process-level effects
//! (signal handlers, the effective uid, the engine launcher) sit behind
//! [`ServiceBackend`] so the runtime can be exercised from tests with
//! substituted IO streams and a fake engine.

use std::ffi::OsString;
use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use clash_fish_config::ConfigPaths;
use clash_fish_service::telemetry::{self, TelemetryConfig, TelemetryError};
use clash_fish_service::{
    ServiceLifecycleManager, ShutdownError, ShutdownSignal, SystemShutdownSignal, current_euid,
    ensure_root,
};

mod cli;
mod commands;
mod errors;
mod output;

pub use cli::{Cli, Command, ConfigAction};
pub use errors::AppError;
pub use output::Output;

/// Process-level services the commands depend on.
pub trait ServiceBackend {
    /// Builds the lifecycle manager for `paths`.
    fn manager(&mut self, paths: ConfigPaths) -> ServiceLifecycleManager;

    /// Installs the listener that drives the foreground supervisor.
    ///
    /// # Errors
    ///
    /// Returns [`ShutdownError`] when handlers cannot be installed.
    fn shutdown_signal(&mut self) -> Result<Box<dyn ShutdownSignal>, ShutdownError>;

    /// Effective user id used for the privilege check.
    fn effective_uid(&self) -> u32;

    /// Installs the process-wide tracing subscriber.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError`] when the subscriber cannot be installed.
    fn init_telemetry(&mut self, config: &TelemetryConfig) -> Result<(), TelemetryError>;
}

/// Backend wired to the real process: signals, `geteuid`, and the engine
/// binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBackend;

impl ServiceBackend for SystemBackend {
    fn manager(&mut self, paths: ConfigPaths) -> ServiceLifecycleManager {
        ServiceLifecycleManager::new(paths)
    }

    fn shutdown_signal(&mut self) -> Result<Box<dyn ShutdownSignal>, ShutdownError> {
        Ok(Box::new(SystemShutdownSignal::install()?))
    }

    fn effective_uid(&self) -> u32 {
        current_euid()
    }

    fn init_telemetry(&mut self, config: &TelemetryConfig) -> Result<(), TelemetryError> {
        telemetry::initialise(config).map(|_| ())
    }
}

/// Runs the CLI using the provided arguments and IO handles.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    run_with_backend(args, stdout, stderr, &mut SystemBackend)
}

/// Runs the CLI against an explicit [`ServiceBackend`].
#[must_use]
pub fn run_with_backend<I, W, E, B>(
    args: I,
    stdout: &mut W,
    stderr: &mut E,
    backend: &mut B,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    B: ServiceBackend,
{
    let mut output = Output::new(stdout, stderr);
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => return report_usage(&mut output, &error),
    };

    let result = authorise(&cli.command, backend)
        .and_then(|()| bootstrap(&cli, backend))
        .and_then(|paths| commands::dispatch(&cli.command, paths, backend, &mut output));
    match result {
        Ok(exit_code) => exit_code,
        Err(error) => {
            ignore_closed_stream(output.failure(format_args!("{error}")));
            ExitCode::FAILURE
        }
    }
}

/// Rejects state-changing commands for non-root callers before anything
/// touches the filesystem, the log file included.
fn authorise<B: ServiceBackend>(command: &Command, backend: &B) -> Result<(), AppError> {
    if command.requires_root() {
        ensure_root(backend.effective_uid()).map_err(AppError::Privilege)?;
    }
    Ok(())
}

fn bootstrap<B: ServiceBackend>(cli: &Cli, backend: &mut B) -> Result<ConfigPaths, AppError> {
    let paths = ConfigPaths::new(&cli.config_dir);
    let log_file = paths.log_file();
    let telemetry = TelemetryConfig::new(cli.debug, cli.log_format, Some(log_file.as_path()));
    backend.init_telemetry(&telemetry)?;
    Ok(paths)
}

fn report_usage<W: Write, E: Write>(
    output: &mut Output<'_, W, E>,
    error: &clap::Error,
) -> ExitCode {
    let rendered = error.render().to_string();
    let message = rendered.trim_end();
    // `--help` and `--version` surface as errors that belong on stdout.
    if error.use_stderr() {
        ignore_closed_stream(output.stderr_line(format_args!("{message}")));
        ExitCode::FAILURE
    } else {
        ignore_closed_stream(output.stdout_line(format_args!("{message}")));
        ExitCode::SUCCESS
    }
}

fn ignore_closed_stream(result: io::Result<()>) {
    if let Err(error) = result {
        tracing::debug!(error = %error, "diagnostic output dropped");
    }
}

#[cfg(test)]
mod tests;
