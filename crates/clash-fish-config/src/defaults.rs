//! Literal defaults written by `config init`.

use std::collections::BTreeMap;

use crate::document::{Configuration, DnsConfig, Proxy, ProxyGroup, TunConfig};

/// Informational comment prepended to every saved document.
pub const CONFIG_HEADER: &str = "# Clash-Fish Configuration\n# Auto-generated configuration file\n\n";

/// Default HTTP proxy port.
pub const DEFAULT_HTTP_PORT: u16 = 7890;

/// Default SOCKS5 proxy port.
pub const DEFAULT_SOCKS_PORT: u16 = 7891;

/// Default RESTful controller address.
pub const DEFAULT_EXTERNAL_CONTROLLER: &str = "127.0.0.1:9090";

const DEFAULT_DNS_LISTEN: &str = "198.18.0.2:53";
const DEFAULT_FAKE_IP_RANGE: &str = "198.18.0.1/16";
const DEFAULT_NAMESERVERS: [&str; 2] = ["223.5.5.5", "114.114.114.114"];
const DEFAULT_FALLBACK: [&str; 2] = ["tls://1.1.1.1:853", "tls://8.8.8.8:853"];

const EXAMPLE_PROXY: &str = "example-proxy";
const EXAMPLE_GROUP: &str = "PROXY";
const DEFAULT_RULES: [&str; 3] = ["GEOIP,PRIVATE,DIRECT", "GEOIP,CN,DIRECT", "MATCH,PROXY"];

/// Builds the document `config init` writes when no file exists.
///
/// TUN and fake-ip DNS are enabled, with a placeholder Shadowsocks proxy
/// behind a `select` group and a rule list ending in a catch-all.
#[must_use]
pub fn default_configuration() -> Configuration {
    Configuration {
        http_port: DEFAULT_HTTP_PORT,
        socks_port: DEFAULT_SOCKS_PORT,
        allow_lan: false,
        mode: String::from("rule"),
        log_level: String::from("info"),
        external_controller: String::from(DEFAULT_EXTERNAL_CONTROLLER),
        tun: TunConfig {
            enable: true,
            stack: String::from("system"),
            dns_hijack: vec![String::from("any:53")],
            auto_route: true,
            auto_detect_interface: true,
        },
        dns: DnsConfig {
            enable: true,
            listen: String::from(DEFAULT_DNS_LISTEN),
            enhanced_mode: String::from("fake-ip"),
            fake_ip_range: String::from(DEFAULT_FAKE_IP_RANGE),
            nameserver: owned(&DEFAULT_NAMESERVERS),
            fallback: owned(&DEFAULT_FALLBACK),
        },
        proxies: vec![Proxy {
            name: String::from(EXAMPLE_PROXY),
            kind: String::from("ss"),
            server: String::from("example.com"),
            port: 8388,
            cipher: Some(String::from("aes-256-gcm")),
            password: Some(String::from("password")),
            udp: true,
            plugin: None,
            plugin_opts: BTreeMap::new(),
            extra: BTreeMap::new(),
        }],
        proxy_groups: vec![ProxyGroup {
            name: String::from(EXAMPLE_GROUP),
            kind: String::from("select"),
            proxies: vec![String::from(EXAMPLE_PROXY), String::from("DIRECT")],
            url: None,
            interval: None,
            extra: BTreeMap::new(),
        }],
        rules: owned(&DEFAULT_RULES),
        extra: BTreeMap::new(),
    }
}

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_owned()).collect()
}
