//! Network interface enumeration

use dhcplab_core::{Error, MacAddr, Result};
use ipnetwork::IpNetwork;
use pnet_datalink::{self, NetworkInterface};
use serde::Serialize;
use std::net::Ipv4Addr;

/// Information about a network interface
#[derive(Debug, Clone, Serialize)]
pub struct InterfaceInfo {
    /// Interface name (e.g., "eth0", "wlan0")
    pub name: String,
    pub index: u32,
    /// Hardware address, if the interface has one
    pub mac: Option<MacAddr>,
    /// IPv4 networks assigned to the interface, in CIDR form
    pub ipv4: Vec<String>,
    pub is_up: bool,
    pub is_loopback: bool,
}

impl From<&NetworkInterface> for InterfaceInfo {
    fn from(iface: &NetworkInterface) -> Self {
        let mac = iface
            .mac
            .map(|mac| MacAddr::new([mac.0, mac.1, mac.2, mac.3, mac.4, mac.5]));

        let ipv4 = iface
            .ips
            .iter()
            .filter_map(|network| match network {
                IpNetwork::V4(net) => Some(net.to_string()),
                IpNetwork::V6(_) => None,
            })
            .collect();

        InterfaceInfo {
            name: iface.name.clone(),
            index: iface.index,
            mac,
            ipv4,
            is_up: iface.is_up(),
            is_loopback: iface.is_loopback(),
        }
    }
}

impl InterfaceInfo {
    /// Up, not loopback and with a hardware address
    pub fn is_attack_capable(&self) -> bool {
        self.is_up && !self.is_loopback && self.mac.is_some()
    }

    /// First IPv4 address, if any
    pub fn primary_ipv4(&self) -> Option<Ipv4Addr> {
        self.ipv4
            .first()
            .and_then(|cidr| cidr.split('/').next())
            .and_then(|ip| ip.parse().ok())
    }
}

/// List all network interfaces
pub fn list_interfaces() -> Result<Vec<InterfaceInfo>> {
    let interfaces = pnet_datalink::interfaces();

    if interfaces.is_empty() {
        return Err(Error::transport(
            "No network interfaces found. Are you running with sufficient privileges?",
        ));
    }

    Ok(interfaces.iter().map(InterfaceInfo::from).collect())
}

/// Look up a single interface by name
pub fn get_interface(name: &str) -> Result<InterfaceInfo> {
    find_datalink_interface(name).map(|iface| InterfaceInfo::from(&iface))
}

pub(crate) fn find_datalink_interface(name: &str) -> Result<NetworkInterface> {
    pnet_datalink::interfaces()
        .into_iter()
        .find(|iface| iface.name == name)
        .ok_or_else(|| Error::InterfaceNotFound(name.to_string()))
}
