//! Serde model of `config.yaml`.
//!
//! Keys use the engine's kebab-case spelling. Keys this layer does not model
//! (engine-specific proxy options, `rule-providers`, and so on) are captured
//! in the `extra` maps so a load/save cycle never drops them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

/// The full proxy configuration document.
///
/// `port`, `socks-port`, and `mode` are required; every other key falls back
/// to an empty or disabled value when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Configuration {
    /// HTTP proxy listener port.
    #[serde(rename = "port")]
    pub http_port: u16,
    /// SOCKS5 proxy listener port.
    pub socks_port: u16,
    /// Whether listeners accept connections from the LAN.
    #[serde(default)]
    pub allow_lan: bool,
    /// Routing mode; one of [`crate::ProxyMode`].
    pub mode: String,
    /// Engine log level; one of [`crate::LogLevel`].
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// `host:port` of the engine's RESTful controller.
    #[serde(default)]
    pub external_controller: String,
    /// TUN interception settings.
    #[serde(default)]
    pub tun: TunConfig,
    /// Embedded DNS server settings.
    #[serde(default)]
    pub dns: DnsConfig,
    /// Declared upstream proxies, in document order.
    #[serde(default)]
    pub proxies: Vec<Proxy>,
    /// Proxy groups, in document order.
    #[serde(default)]
    pub proxy_groups: Vec<ProxyGroup>,
    /// Routing rules; first match wins.
    #[serde(default)]
    pub rules: Vec<String>,
    /// Top-level keys passed through to the engine untouched.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

fn default_log_level() -> String {
    String::from("info")
}

/// TUN interface settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TunConfig {
    /// Whether the engine installs a TUN device.
    pub enable: bool,
    /// Network stack; one of [`crate::TunStack`].
    pub stack: String,
    /// `host:port` patterns whose DNS traffic is hijacked.
    pub dns_hijack: Vec<String>,
    /// Whether the engine installs routes for the TUN device.
    pub auto_route: bool,
    /// Whether the engine picks the outbound interface itself.
    pub auto_detect_interface: bool,
}

/// Embedded DNS server settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DnsConfig {
    /// Whether the embedded DNS server runs.
    pub enable: bool,
    /// `host:port` the DNS server binds.
    pub listen: String,
    /// Resolution strategy; one of [`crate::DnsEnhancedMode`].
    pub enhanced_mode: String,
    /// CIDR handed out in fake-ip mode.
    #[serde(rename = "fake-ip-range")]
    pub fake_ip_range: String,
    /// Primary resolvers, queried in order.
    pub nameserver: Vec<String>,
    /// Fallback resolvers, queried in order.
    pub fallback: Vec<String>,
}

/// An upstream proxy server.
///
/// Type-specific options are not cross-checked here; the engine's own parser
/// owns that responsibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Proxy {
    /// Unique name referenced by groups and rules.
    pub name: String,
    /// Engine protocol tag such as `ss` or `vmess`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Server host name or address.
    pub server: String,
    /// Server port.
    pub port: u16,
    /// Cipher suite for protocols that take one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cipher: Option<String>,
    /// Shared secret for protocols that take one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Whether UDP relay is enabled.
    #[serde(default, skip_serializing_if = "is_false")]
    pub udp: bool,
    /// Transport plugin name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin: Option<String>,
    /// Options handed to the transport plugin.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub plugin_opts: BTreeMap<String, Value>,
    /// Protocol options outside the common set.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A named selection over proxies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProxyGroup {
    /// Unique group name.
    pub name: String,
    /// Group strategy such as `select` or `url-test`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Member names, in order.
    #[serde(default)]
    pub proxies: Vec<String>,
    /// Health-check URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Health-check interval in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<u32>,
    /// Strategy options outside the common set.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[expect(
    clippy::trivially_copy_pass_by_ref,
    reason = "serde's skip_serializing_if passes fields by reference"
)]
fn is_false(value: &bool) -> bool {
    !*value
}
