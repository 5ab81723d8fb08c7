//! CLI entrypoint for the clash-fish proxy supervisor.
//!
//! The binary delegates to [`clash_fish_cli::run`], which parses arguments,
//! installs telemetry, and dispatches to the lifecycle and configuration
//! commands.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    clash_fish_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
