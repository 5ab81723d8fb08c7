//! Semantic checks run on a parsed document before the engine sees it.
//!
//! [`validate`] is pure: it performs no I/O and reports only the first
//! violation found, in a fixed order (ports, enumerations, then proxy and
//! group names).

use std::collections::HashSet;
use std::str::FromStr;

use strum::VariantNames;
use thiserror::Error;

use crate::document::Configuration;
use crate::modes::{DnsEnhancedMode, LogLevel, ProxyMode, TunStack};

/// Built-in targets a group may reference without declaring them.
pub const RESERVED_TARGETS: [&str; 2] = ["DIRECT", "REJECT"];

/// A structurally valid document with a semantically invalid field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A listener port is zero.
    #[error("invalid {field}: {value} (must be between 1 and 65535)")]
    InvalidPort {
        /// Document key of the offending port.
        field: &'static str,
        /// Rejected value.
        value: u16,
    },
    /// HTTP and SOCKS listeners would share a port.
    #[error("port and socks-port must differ (both are {port})")]
    DuplicatePorts {
        /// The shared port.
        port: u16,
    },
    /// `mode` is not a known routing mode.
    #[error("invalid mode: '{value}' (expected {})", ProxyMode::VARIANTS.join("/"))]
    InvalidMode {
        /// Rejected value.
        value: String,
    },
    /// `log-level` is not a known level.
    #[error("invalid log-level: '{value}' (expected {})", LogLevel::VARIANTS.join("/"))]
    InvalidLogLevel {
        /// Rejected value.
        value: String,
    },
    /// `tun.stack` is not a known stack while TUN is enabled.
    #[error("invalid tun.stack: '{value}' (expected {})", TunStack::VARIANTS.join("/"))]
    InvalidTunStack {
        /// Rejected value.
        value: String,
    },
    /// `dns.enhanced-mode` is not a known mode while DNS is enabled.
    #[error(
        "invalid dns.enhanced-mode: '{value}' (expected {})",
        DnsEnhancedMode::VARIANTS.join("/")
    )]
    InvalidDnsMode {
        /// Rejected value.
        value: String,
    },
    /// Two proxies share a name.
    #[error("duplicate proxy name: '{name}'")]
    DuplicateProxy {
        /// Repeated name.
        name: String,
    },
    /// Two groups share a name.
    #[error("duplicate proxy-group name: '{name}'")]
    DuplicateGroup {
        /// Repeated name.
        name: String,
    },
    /// A group lists a member that is neither declared nor reserved.
    #[error("proxy-group '{group}' references unknown proxy '{member}'")]
    UnknownGroupMember {
        /// Group holding the reference.
        group: String,
        /// Unresolved member name.
        member: String,
    },
}

impl ValidationError {
    /// Document key the violation concerns.
    #[must_use]
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidPort { field, .. } => field,
            Self::DuplicatePorts { .. } => "socks-port",
            Self::InvalidMode { .. } => "mode",
            Self::InvalidLogLevel { .. } => "log-level",
            Self::InvalidTunStack { .. } => "tun.stack",
            Self::InvalidDnsMode { .. } => "dns.enhanced-mode",
            Self::DuplicateProxy { .. } => "proxies",
            Self::DuplicateGroup { .. } | Self::UnknownGroupMember { .. } => "proxy-groups",
        }
    }
}

/// Checks every semantic invariant of `config`, returning the first failure.
///
/// # Errors
///
/// Returns the first [`ValidationError`] encountered.
pub fn validate(config: &Configuration) -> Result<(), ValidationError> {
    check_port("port", config.http_port)?;
    check_port("socks-port", config.socks_port)?;
    if config.http_port == config.socks_port {
        return Err(ValidationError::DuplicatePorts {
            port: config.http_port,
        });
    }

    check_enum::<ProxyMode>(&config.mode, |value| ValidationError::InvalidMode { value })?;
    check_enum::<LogLevel>(&config.log_level, |value| {
        ValidationError::InvalidLogLevel { value }
    })?;
    if config.tun.enable {
        check_enum::<TunStack>(&config.tun.stack, |value| {
            ValidationError::InvalidTunStack { value }
        })?;
    }
    if config.dns.enable {
        check_enum::<DnsEnhancedMode>(&config.dns.enhanced_mode, |value| {
            ValidationError::InvalidDnsMode { value }
        })?;
    }

    check_references(config)
}

fn check_port(field: &'static str, value: u16) -> Result<(), ValidationError> {
    if value == 0 {
        return Err(ValidationError::InvalidPort { field, value });
    }
    Ok(())
}

fn check_enum<T: FromStr>(
    value: &str,
    error: impl FnOnce(String) -> ValidationError,
) -> Result<(), ValidationError> {
    match value.parse::<T>() {
        Ok(_) => Ok(()),
        Err(_) => Err(error(value.to_owned())),
    }
}

fn check_references(config: &Configuration) -> Result<(), ValidationError> {
    let mut proxies = HashSet::new();
    for proxy in &config.proxies {
        if !proxies.insert(proxy.name.as_str()) {
            return Err(ValidationError::DuplicateProxy {
                name: proxy.name.clone(),
            });
        }
    }

    let mut groups = HashSet::new();
    for group in &config.proxy_groups {
        if !groups.insert(group.name.as_str()) {
            return Err(ValidationError::DuplicateGroup {
                name: group.name.clone(),
            });
        }
    }

    for group in &config.proxy_groups {
        let unknown = group.proxies.iter().find(|member| {
            let member = member.as_str();
            !proxies.contains(member)
                && !groups.contains(member)
                && !RESERVED_TARGETS.contains(&member)
        });
        if let Some(member) = unknown {
            return Err(ValidationError::UnknownGroupMember {
                group: group.name.clone(),
                member: member.clone(),
            });
        }
    }
    Ok(())
}
