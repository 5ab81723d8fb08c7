//! Closed enumerations referenced by the configuration document.
//!
//! The document stores these as plain strings so that an unknown value can
//! survive deserialisation and be reported by [`crate::validate`] with the
//! offending field and value. Parsing is case-sensitive: `Rule` is not `rule`.

use strum::{Display, EnumString, IntoStaticStr, VariantNames};

/// Routing mode applied by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, IntoStaticStr, VariantNames)]
#[strum(serialize_all = "lowercase")]
pub enum ProxyMode {
    /// Evaluate `rules` in document order.
    Rule,
    /// Send all traffic through the selected proxy.
    Global,
    /// Bypass every proxy.
    Direct,
}

/// Engine log verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, IntoStaticStr, VariantNames)]
#[strum(serialize_all = "lowercase")]
pub enum LogLevel {
    /// Informational messages and above.
    Info,
    /// Warnings and errors only.
    Warning,
    /// Errors only.
    Error,
    /// Everything, including debug traces.
    Debug,
    /// Nothing.
    Silent,
}

/// Network stack backing the TUN interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, IntoStaticStr, VariantNames)]
#[strum(serialize_all = "lowercase")]
pub enum TunStack {
    /// Host kernel stack.
    System,
    /// Userspace gVisor stack.
    Gvisor,
}

/// DNS resolution strategy used alongside TUN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, IntoStaticStr, VariantNames)]
#[strum(serialize_all = "kebab-case")]
pub enum DnsEnhancedMode {
    /// Answer with synthetic addresses from `fake-ip-range`.
    FakeIp,
    /// Answer with real addresses and remember the mapping.
    RedirHost,
}
