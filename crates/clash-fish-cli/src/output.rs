//! Writers and renderers for command output.
//!
//! Successes go to stdout prefixed with `✓`, failures to stderr prefixed
//! with `✗`. Each line is flushed immediately so a foreground `start` shows
//! progress before it blocks.

use std::fmt;
use std::io::{self, Write};

use clash_fish_config::ConfigSummary;
use clash_fish_service::{ConfigState, ServiceStatus, VpnInfo};

/// Success marker.
pub const OK_MARK: &str = "✓";
/// Failure marker.
pub const FAIL_MARK: &str = "✗";

/// Output handle over stdout and stderr writers.
pub struct Output<'a, W: Write, E: Write> {
    stdout: &'a mut W,
    stderr: &'a mut E,
}

impl<'a, W: Write, E: Write> Output<'a, W, E> {
    /// Wraps the process streams.
    #[must_use]
    pub fn new(stdout: &'a mut W, stderr: &'a mut E) -> Self {
        Self { stdout, stderr }
    }

    /// Writes one line to stdout.
    ///
    /// # Errors
    ///
    /// Returns any I/O error from the writer.
    pub fn stdout_line(&mut self, args: fmt::Arguments<'_>) -> io::Result<()> {
        self.stdout.write_fmt(args)?;
        self.stdout.write_all(b"\n")?;
        self.stdout.flush()
    }

    /// Writes one line to stderr.
    ///
    /// # Errors
    ///
    /// Returns any I/O error from the writer.
    pub fn stderr_line(&mut self, args: fmt::Arguments<'_>) -> io::Result<()> {
        self.stderr.write_fmt(args)?;
        self.stderr.write_all(b"\n")?;
        self.stderr.flush()
    }

    /// Writes `✓ message` to stdout.
    ///
    /// # Errors
    ///
    /// Returns any I/O error from the writer.
    pub fn success(&mut self, message: fmt::Arguments<'_>) -> io::Result<()> {
        self.stdout_line(format_args!("{OK_MARK} {message}"))
    }

    /// Writes `✗ message` to stderr.
    ///
    /// # Errors
    ///
    /// Returns any I/O error from the writer.
    pub fn failure(&mut self, message: fmt::Arguments<'_>) -> io::Result<()> {
        self.stderr_line(format_args!("{FAIL_MARK} {message}"))
    }

    /// Raw stdout, for payloads that are not line oriented.
    pub fn stdout(&mut self) -> &mut W {
        self.stdout
    }
}

/// Renders the human-readable `status` report.
///
/// # Errors
///
/// Returns any I/O error from the writer.
pub fn render_status<W: Write, E: Write>(
    output: &mut Output<'_, W, E>,
    status: &ServiceStatus,
) -> io::Result<()> {
    output.stdout_line(format_args!("=== clash-fish status ==="))?;
    match status.pid {
        Some(pid) if status.running => {
            output.stdout_line(format_args!("Service:    {OK_MARK} running (pid {pid})"))?;
        }
        _ => output.stdout_line(format_args!("Service:    {FAIL_MARK} not running"))?,
    }
    output.stdout_line(format_args!("VPN:        {}", describe_vpn(&status.vpn)))?;
    output.stdout_line(format_args!("Config:     {}", status.config_path.display()))?;
    match &status.config {
        ConfigState::Missing => {
            output.stdout_line(format_args!("            {FAIL_MARK} not initialised"))?;
            output.stdout_line(format_args!(
                "            run 'clash-fish config init' to create it"
            ))
        }
        ConfigState::Invalid { error } => {
            output.stdout_line(format_args!("            {FAIL_MARK} {error}"))
        }
        ConfigState::Loaded(summary) => render_summary(output, summary),
    }
}

/// Renders a configuration summary, one field per line.
///
/// # Errors
///
/// Returns any I/O error from the writer.
pub fn render_summary<W: Write, E: Write>(
    output: &mut Output<'_, W, E>,
    summary: &ConfigSummary,
) -> io::Result<()> {
    output.stdout_line(format_args!("Mode:       {}", summary.mode))?;
    output.stdout_line(format_args!("HTTP Port:  {}", summary.http_port))?;
    output.stdout_line(format_args!("SOCKS Port: {}", summary.socks_port))?;
    output.stdout_line(format_args!("Log Level:  {}", summary.log_level))?;
    output.stdout_line(format_args!("Allow LAN:  {}", summary.allow_lan))?;
    output.stdout_line(format_args!("Controller: {}", summary.external_controller))?;
    output.stdout_line(format_args!("TUN:        {}", summary.tun_enabled))?;
    if summary.tun_enabled {
        output.stdout_line(format_args!("  Stack:      {}", summary.tun_stack))?;
        output.stdout_line(format_args!("  Auto Route: {}", summary.auto_route))?;
    }
    output.stdout_line(format_args!("DNS:        {}", summary.dns_enabled))?;
    if summary.dns_enabled {
        output.stdout_line(format_args!("  Mode:       {}", summary.dns_mode))?;
        output.stdout_line(format_args!("  Listen:     {}", summary.dns_listen))?;
    }
    output.stdout_line(format_args!(
        "Proxies: {}  Groups: {}  Rules: {}",
        summary.proxy_count, summary.group_count, summary.rule_count
    ))
}

fn describe_vpn(vpn: &VpnInfo) -> String {
    if !vpn.active {
        return String::from("- not detected");
    }
    let interface = vpn.interface_name.as_deref().unwrap_or("unknown");
    match vpn.network {
        Some(network) => format!("{OK_MARK} active ({interface}: {network})"),
        None => format!("{OK_MARK} active ({interface})"),
    }
}
