//! Command-level behaviour of the runtime against a fake backend.

use std::fs;
use std::process::ExitCode;

use clash_fish_config::{ConfigStore, LogFormat, default_configuration};
use rstest::rstest;

use super::support::{FakeBackend, Workspace, run_raw};

#[test]
fn version_command_prints_package_version() {
    let workspace = Workspace::new();
    let result = workspace.run(&mut FakeBackend::new(1000), &["version"]);
    assert_eq!(result.exit, ExitCode::SUCCESS);
    assert_eq!(
        result.stdout.trim_end(),
        format!("clash-fish {}", env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn help_goes_to_stdout() {
    let result = run_raw(
        &mut FakeBackend::new(1000),
        vec!["clash-fish".into(), "--help".into()],
    );
    assert_eq!(result.exit, ExitCode::SUCCESS);
    assert!(result.stdout.contains("Usage"));
    assert!(result.stderr.is_empty());
}

#[test]
fn unknown_command_is_a_usage_error() {
    let result = run_raw(
        &mut FakeBackend::new(1000),
        vec!["clash-fish".into(), "launch".into()],
    );
    assert_eq!(result.exit, ExitCode::FAILURE);
    assert!(result.stderr.contains("launch"));
}

#[test]
fn config_init_is_idempotent() {
    let workspace = Workspace::new();
    let mut backend = FakeBackend::new(1000);

    let first = workspace.run(&mut backend, &["config", "init"]);
    let written = fs::read_to_string(workspace.paths().config_file()).expect("config written");
    let second = workspace.run(&mut backend, &["config", "init"]);

    assert_eq!(first.exit, ExitCode::SUCCESS);
    assert!(first.stdout.contains("Configuration initialised"));
    assert_eq!(second.exit, ExitCode::SUCCESS);
    assert!(second.stdout.contains("already exists"));
    assert_eq!(
        fs::read_to_string(workspace.paths().config_file()).expect("config kept"),
        written
    );
}

#[test]
fn config_validate_accepts_defaults() {
    let workspace = Workspace::new();
    let mut backend = FakeBackend::new(1000);
    workspace.run(&mut backend, &["config", "init"]);

    let result = workspace.run(&mut backend, &["config", "validate"]);

    assert_eq!(result.exit, ExitCode::SUCCESS);
    assert!(result.stdout.contains("✓ Configuration is valid"));
    assert!(result.stdout.contains("HTTP Port:  7890"));
}

#[test]
fn config_validate_reports_invalid_mode() {
    let workspace = Workspace::new();
    let mut backend = FakeBackend::new(1000);
    workspace.run(&mut backend, &["config", "init"]);
    let mut config = default_configuration();
    config.mode = String::from("script");
    ConfigStore::new(workspace.paths())
        .save(&config)
        .expect("save");

    let result = workspace.run(&mut backend, &["config", "validate"]);

    assert_eq!(result.exit, ExitCode::FAILURE);
    assert!(result.stderr.starts_with("✗ "));
    assert!(result.stderr.contains("mode"));
}

#[rstest]
#[case::validate("validate")]
#[case::show("show")]
fn config_reads_fail_without_document(#[case] action: &str) {
    let workspace = Workspace::new();
    let result = workspace.run(&mut FakeBackend::new(1000), &["config", action]);
    assert_eq!(result.exit, ExitCode::FAILURE);
    assert!(result.stderr.contains("not found"));
    assert!(!workspace.config_dir().exists());
}

#[test]
fn config_path_prints_document_location() {
    let workspace = Workspace::new();
    let result = workspace.run(&mut FakeBackend::new(1000), &["config", "path"]);
    assert_eq!(result.exit, ExitCode::SUCCESS);
    assert_eq!(
        result.stdout.trim_end(),
        workspace.paths().config_file().display().to_string()
    );
}

#[rstest]
#[case::start("start")]
#[case::stop("stop")]
#[case::restart("restart")]
fn privileged_commands_require_root(#[case] command: &str) {
    let workspace = Workspace::new();
    let mut backend = FakeBackend::new(1000);
    workspace.run(&mut backend, &["config", "init"]);
    let installs_before = backend.telemetry.len();

    let result = workspace.run(&mut backend, &[command]);

    assert_eq!(result.exit, ExitCode::FAILURE);
    assert!(result.stderr.contains("requires root"));
    assert_eq!(
        backend.telemetry.len(),
        installs_before,
        "privilege check runs before telemetry opens the log file"
    );
    assert!(backend.engine.calls().is_empty());
    assert!(!workspace.paths().pid_file().exists());
    assert!(!workspace.paths().log_file().exists());
}

#[test]
fn start_runs_engine_until_signalled() {
    let workspace = Workspace::new();
    let mut backend = FakeBackend::new(0);
    workspace.run(&mut backend, &["config", "init"]);

    let result = workspace.run(&mut backend, &["start"]);

    assert_eq!(result.exit, ExitCode::SUCCESS, "{}", result.stderr);
    assert!(
        result
            .stdout
            .contains(&format!("✓ clash-fish started (pid {})", std::process::id()))
    );
    assert!(result.stdout.contains("✓ clash-fish stopped"));
    assert_eq!(backend.engine.calls(), ["parse", "apply", "shutdown"]);
    assert!(!workspace.paths().pid_file().exists());
}

#[test]
fn start_without_config_points_at_init() {
    let workspace = Workspace::new();
    let mut backend = FakeBackend::new(0);

    let result = workspace.run(&mut backend, &["start"]);

    assert_eq!(result.exit, ExitCode::FAILURE);
    assert!(result.stderr.contains("clash-fish config init"));
    assert!(backend.engine.calls().is_empty());
    assert!(!workspace.config_dir().exists());
}

#[test]
fn restart_on_stopped_service_starts_it() {
    let workspace = Workspace::new();
    let mut backend = FakeBackend::new(0);
    workspace.run(&mut backend, &["config", "init"]);

    let result = workspace.run(&mut backend, &["restart"]);

    assert_eq!(result.exit, ExitCode::SUCCESS, "{}", result.stderr);
    assert!(result.stdout.contains("✓ clash-fish restarted"));
    assert_eq!(backend.engine.calls(), ["parse", "apply", "shutdown"]);
}

#[test]
fn stop_when_idle_fails() {
    let workspace = Workspace::new();
    let mut backend = FakeBackend::new(0);
    workspace.run(&mut backend, &["config", "init"]);

    let result = workspace.run(&mut backend, &["stop"]);

    assert_eq!(result.exit, ExitCode::FAILURE);
    assert!(result.stderr.contains("✗ failed to stop service: service is not running"));
}

#[test]
fn stop_clears_stale_record() {
    let workspace = Workspace::new();
    let mut backend = FakeBackend::new(0);
    workspace.run(&mut backend, &["config", "init"]);
    fs::write(workspace.paths().pid_file(), "99999999\n").expect("seed record");

    let result = workspace.run(&mut backend, &["stop"]);

    assert_eq!(result.exit, ExitCode::FAILURE);
    assert!(result.stderr.contains("stale pid file"));
    assert!(!workspace.paths().pid_file().exists());
}

#[test]
fn status_human_output_flags_missing_config() {
    let workspace = Workspace::new();
    let result = workspace.run(&mut FakeBackend::new(1000), &["status"]);
    assert_eq!(result.exit, ExitCode::SUCCESS);
    assert!(result.stdout.contains("Service:    ✗ not running"));
    assert!(result.stdout.contains("clash-fish config init"));
}

#[test]
fn status_json_reports_service_and_config() {
    let workspace = Workspace::new();
    let mut backend = FakeBackend::new(1000);
    workspace.run(&mut backend, &["config", "init"]);

    let result = workspace.run(&mut backend, &["status", "--json"]);

    assert_eq!(result.exit, ExitCode::SUCCESS);
    let report: serde_json::Value = serde_json::from_str(&result.stdout).expect("json status");
    assert_eq!(report["running"], false);
    assert_eq!(report["config"]["state"], "loaded");
    assert_eq!(report["config"]["http_port"], 7890);
    assert!(report["vpn"]["active"].is_boolean());
}

#[test]
fn telemetry_honours_flags_and_log_directory() {
    let workspace = Workspace::new();
    let mut backend = FakeBackend::new(1000);

    workspace.run(&mut backend, &["--debug", "--log-format", "json", "config", "path"]);
    workspace.run(&mut backend, &["config", "init"]);
    workspace.run(&mut backend, &["config", "path"]);

    let first = backend.telemetry.first().expect("telemetry installed");
    assert_eq!(first.filter, "debug");
    assert_eq!(first.format, LogFormat::Json);
    assert_eq!(first.log_file, None);
    let last = backend.telemetry.last().expect("telemetry installed");
    assert_eq!(last.filter, "info");
    assert_eq!(last.log_file, Some(workspace.paths().log_file()));
}
