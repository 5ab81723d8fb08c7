//! Dispatch from parsed commands to the configuration store and the
//! lifecycle manager.

use std::io::Write;
use std::process::ExitCode;

use clash_fish_config::{ConfigError, ConfigPaths, ConfigStore, ConfigSummary, InitOutcome};
use clash_fish_service::ServiceLifecycleManager;
use tracing::debug;

use crate::ServiceBackend;
use crate::cli::{Command, ConfigAction};
use crate::errors::AppError;
use crate::output::{Output, render_status, render_summary};

const CLI_TARGET: &str = "clash_fish::cli";

pub(crate) fn dispatch<W, E, B>(
    command: &Command,
    paths: ConfigPaths,
    backend: &mut B,
    output: &mut Output<'_, W, E>,
) -> Result<ExitCode, AppError>
where
    W: Write,
    E: Write,
    B: ServiceBackend,
{
    debug!(target: CLI_TARGET, ?command, config_dir = %paths.config_dir().display(), "dispatching");
    match command {
        Command::Start => run_foreground(backend, paths, output, Transition::Start),
        Command::Restart => run_foreground(backend, paths, output, Transition::Restart),
        Command::Stop => stop(&mut backend.manager(paths), output),
        Command::Status { json } => status(&backend.manager(paths), *json, output),
        Command::Config { action } => config(*action, &ConfigStore::new(paths), output),
        Command::Version => {
            output.stdout_line(format_args!("clash-fish {}", env!("CARGO_PKG_VERSION")))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Transition {
    Start,
    Restart,
}

fn run_foreground<W, E, B>(
    backend: &mut B,
    paths: ConfigPaths,
    output: &mut Output<'_, W, E>,
    transition: Transition,
) -> Result<ExitCode, AppError>
where
    W: Write,
    E: Write,
    B: ServiceBackend,
{
    // Handlers must be live before the PID record is written.
    let mut signals = backend.shutdown_signal().map_err(AppError::Signals)?;
    let mut manager = backend.manager(paths);

    let pid = match transition {
        Transition::Start => manager.start().map_err(AppError::Start)?,
        Transition::Restart => manager.restart().map_err(AppError::Restart)?,
    };
    let verb = match transition {
        Transition::Start => "started",
        Transition::Restart => "restarted",
    };
    output.success(format_args!("clash-fish {verb} (pid {pid})"))?;
    output.stdout_line(format_args!("  press Ctrl+C to stop"))?;

    manager
        .supervise(signals.as_mut())
        .map_err(AppError::Supervise)?;
    output.success(format_args!("clash-fish stopped"))?;
    Ok(ExitCode::SUCCESS)
}

fn stop<W: Write, E: Write>(
    manager: &mut ServiceLifecycleManager,
    output: &mut Output<'_, W, E>,
) -> Result<ExitCode, AppError> {
    let pid = manager.stop().map_err(AppError::Stop)?;
    output.success(format_args!("clash-fish stopped (pid {pid})"))?;
    Ok(ExitCode::SUCCESS)
}

fn status<W: Write, E: Write>(
    manager: &ServiceLifecycleManager,
    json: bool,
    output: &mut Output<'_, W, E>,
) -> Result<ExitCode, AppError> {
    let report = manager.status();
    if json {
        serde_json::to_writer_pretty(output.stdout(), &report)
            .map_err(AppError::SerialiseStatus)?;
        output.stdout_line(format_args!(""))?;
    } else {
        render_status(output, &report)?;
    }
    Ok(ExitCode::SUCCESS)
}

fn config<W: Write, E: Write>(
    action: ConfigAction,
    store: &ConfigStore,
    output: &mut Output<'_, W, E>,
) -> Result<ExitCode, AppError> {
    match action {
        ConfigAction::Init => match store.init().map_err(AppError::InitConfig)? {
            InitOutcome::Created => {
                output.success(format_args!(
                    "Configuration initialised at {}",
                    store.config_file().display()
                ))?;
                output.stdout_line(format_args!(
                    "  edit it to add your proxies, then run 'sudo clash-fish start'"
                ))?;
            }
            InitOutcome::AlreadyInitialized => {
                output.success(format_args!(
                    "Configuration already exists at {}",
                    store.config_file().display()
                ))?;
            }
        },
        ConfigAction::Validate => {
            let config = store.load_validated().map_err(|error| match error {
                ConfigError::Validation(_) => AppError::InvalidConfig(error),
                other => AppError::LoadConfig(other),
            })?;
            output.success(format_args!("Configuration is valid"))?;
            render_summary(output, &ConfigSummary::from(&config))?;
        }
        ConfigAction::Show => {
            let config = store.load().map_err(AppError::LoadConfig)?;
            output.stdout_line(format_args!("Config: {}", store.config_file().display()))?;
            render_summary(output, &ConfigSummary::from(&config))?;
        }
        ConfigAction::Path => {
            output.stdout_line(format_args!("{}", store.config_file().display()))?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

