//! Advisory detection of a VPN tunnel running alongside the engine.
//!
//! Detection walks the host's interfaces looking for a tunnel-class name
//! holding a private IPv4 address. The first match wins; multiple
//! simultaneous tunnels are not disambiguated. Nothing here ever blocks a
//! lifecycle operation: callers that cannot tolerate errors use
//! [`detect_or_inactive`].

use std::io;
use std::net::{Ipv4Addr, SocketAddrV4};

use ipnet::Ipv4Net;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Tracing target for VPN detection events.
pub const VPN_TARGET: &str = "clash_fish::vpn";

/// Interface name prefixes treated as tunnels.
#[cfg(target_os = "macos")]
pub const TUNNEL_PREFIXES: &[&str] = &["utun"];

/// Interface name prefixes treated as tunnels.
#[cfg(not(target_os = "macos"))]
pub const TUNNEL_PREFIXES: &[&str] = &["utun", "tun", "wg"];

const PRIVATE_RANGES: [(Ipv4Addr, u8); 3] = [
    (Ipv4Addr::new(10, 0, 0, 0), 8),
    (Ipv4Addr::new(172, 16, 0, 0), 12),
    (Ipv4Addr::new(192, 168, 0, 0), 16),
];

/// Result of a VPN scan. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VpnInfo {
    /// Whether a tunnel with a private address was found.
    pub active: bool,
    /// Name of the matching interface.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface_name: Option<String>,
    /// Private address assigned to the interface.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<Ipv4Addr>,
    /// Address with the interface's prefix length, e.g. `10.8.0.5/24`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<Ipv4Net>,
}

impl VpnInfo {
    /// Report for a host without an active tunnel.
    #[must_use]
    pub fn inactive() -> Self {
        Self {
            active: false,
            interface_name: None,
            ip: None,
            network: None,
        }
    }
}

/// One IPv4 address assigned to an interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceAddress {
    /// Interface name such as `utun0`.
    pub name: String,
    /// Assigned address.
    pub address: Ipv4Addr,
    /// Netmask, when the platform reports one.
    pub netmask: Option<Ipv4Addr>,
}

/// Source of interface addresses.
pub trait InterfaceSource {
    /// Lists every IPv4 address on the host, in enumeration order.
    ///
    /// # Errors
    ///
    /// Returns the OS error when enumeration fails.
    fn ipv4_addresses(&self) -> io::Result<Vec<InterfaceAddress>>;
}

/// Enumerates interfaces with `getifaddrs(3)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemInterfaces;

impl InterfaceSource for SystemInterfaces {
    fn ipv4_addresses(&self) -> io::Result<Vec<InterfaceAddress>> {
        let addresses = nix::ifaddrs::getifaddrs().map_err(io::Error::from)?;
        Ok(addresses
            .filter_map(|entry| {
                let address = entry
                    .address
                    .as_ref()
                    .and_then(|address| address.as_sockaddr_in())
                    .map(|address| *SocketAddrV4::from(*address).ip())?;
                let netmask = entry
                    .netmask
                    .as_ref()
                    .and_then(|mask| mask.as_sockaddr_in())
                    .map(|mask| *SocketAddrV4::from(*mask).ip());
                Some(InterfaceAddress {
                    name: entry.interface_name,
                    address,
                    netmask,
                })
            })
            .collect())
    }
}

/// Errors raised by VPN detection.
#[derive(Debug, Error)]
pub enum VpnDetectError {
    /// Interface enumeration failed.
    #[error("failed to enumerate network interfaces: {source}")]
    Enumerate {
        /// Underlying OS failure.
        #[source]
        source: io::Error,
    },
}

/// Scans the host's interfaces.
///
/// # Errors
///
/// Returns [`VpnDetectError::Enumerate`] when interfaces cannot be listed.
pub fn detect() -> Result<VpnInfo, VpnDetectError> {
    detect_with(&SystemInterfaces)
}

/// Scans interfaces reported by `source`.
///
/// # Errors
///
/// Returns [`VpnDetectError::Enumerate`] when `source` fails.
pub fn detect_with(source: &dyn InterfaceSource) -> Result<VpnInfo, VpnDetectError> {
    let addresses = source
        .ipv4_addresses()
        .map_err(|source| VpnDetectError::Enumerate { source })?;
    let found = addresses
        .into_iter()
        .filter(|entry| is_tunnel(&entry.name))
        .find(|entry| is_private(entry.address));
    Ok(found.map_or_else(VpnInfo::inactive, |entry| {
        let prefix = entry
            .netmask
            .and_then(|mask| ipnet::ipv4_mask_to_prefix(mask).ok())
            .unwrap_or(32);
        debug!(
            target: VPN_TARGET,
            interface = %entry.name,
            ip = %entry.address,
            prefix,
            "tunnel interface detected"
        );
        VpnInfo {
            active: true,
            ip: Some(entry.address),
            network: Ipv4Net::new(entry.address, prefix).ok(),
            interface_name: Some(entry.name),
        }
    }))
}

/// Like [`detect_with`], but downgrades failures to a warning and an
/// inactive report.
#[must_use]
pub fn detect_or_inactive(source: &dyn InterfaceSource) -> VpnInfo {
    detect_with(source).unwrap_or_else(|error| {
        warn!(target: VPN_TARGET, error = %error, "vpn detection failed");
        VpnInfo::inactive()
    })
}

fn is_tunnel(name: &str) -> bool {
    TUNNEL_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
}

fn is_private(address: Ipv4Addr) -> bool {
    PRIVATE_RANGES.iter().any(|(network, prefix)| {
        Ipv4Net::new(*network, *prefix).is_ok_and(|range| range.contains(&address))
    })
}
