use serde::Serialize;

use crate::document::Configuration;

/// Condensed view of a document for `status` and `config show`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigSummary {
    /// Routing mode.
    pub mode: String,
    /// HTTP listener port.
    pub http_port: u16,
    /// SOCKS5 listener port.
    pub socks_port: u16,
    /// Engine log level.
    pub log_level: String,
    /// Whether LAN clients are accepted.
    pub allow_lan: bool,
    /// RESTful controller address.
    pub external_controller: String,
    /// Whether TUN interception is enabled.
    pub tun_enabled: bool,
    /// TUN network stack.
    pub tun_stack: String,
    /// Whether TUN installs routes.
    pub auto_route: bool,
    /// Whether the DNS server is enabled.
    pub dns_enabled: bool,
    /// DNS resolution strategy.
    pub dns_mode: String,
    /// DNS listener address.
    pub dns_listen: String,
    /// Number of declared proxies.
    pub proxy_count: usize,
    /// Number of proxy groups.
    pub group_count: usize,
    /// Number of routing rules.
    pub rule_count: usize,
}

impl From<&Configuration> for ConfigSummary {
    fn from(config: &Configuration) -> Self {
        Self {
            mode: config.mode.clone(),
            http_port: config.http_port,
            socks_port: config.socks_port,
            log_level: config.log_level.clone(),
            allow_lan: config.allow_lan,
            external_controller: config.external_controller.clone(),
            tun_enabled: config.tun.enable,
            tun_stack: config.tun.stack.clone(),
            auto_route: config.tun.auto_route,
            dns_enabled: config.dns.enable,
            dns_mode: config.dns.enhanced_mode.clone(),
            dns_listen: config.dns.listen.clone(),
            proxy_count: config.proxies.len(),
            group_count: config.proxy_groups.len(),
            rule_count: config.rules.len(),
        }
    }
}
