//! DHCP server discovery
//!
//! One DISCOVER from a throwaway client, one OFFER back. Independent of the
//! attack registry, so it can run next to any active attack.

use dhcplab_core::{MacAddr, Transport};
use dhcplab_protocols::dhcp::frame::{discover_frame, offer_filter};
use dhcplab_protocols::dhcp::DhcpFrame;
use rand::Rng;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::net::Ipv4Addr;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Text reported when nothing answered in time
pub const NO_SERVER_FOUND: &str = "No DHCP Server found or timed out";

/// Outcome of a recon probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconResult {
    /// A server answered
    Found {
        server_mac: MacAddr,
        server_ip: Ipv4Addr,
        offered_ip: Ipv4Addr,
    },
    /// No OFFER before the timeout
    NoServer,
    /// The probe could not be sent or the reply not read
    Error(String),
}

impl ReconResult {
    pub fn is_found(&self) -> bool {
        matches!(self, ReconResult::Found { .. })
    }
}

impl Serialize for ReconResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ReconResult::Found {
                server_mac,
                server_ip,
                offered_ip,
            } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("server_mac", server_mac)?;
                map.serialize_entry("server_ip", server_ip)?;
                map.serialize_entry("offered_ip", offered_ip)?;
                map.end()
            }
            ReconResult::NoServer => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("result", NO_SERVER_FOUND)?;
                map.end()
            }
            ReconResult::Error(message) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("error", message)?;
                map.end()
            }
        }
    }
}

/// Probe `interface` for a DHCP server, waiting at most `timeout`
pub async fn recon(transport: &dyn Transport, interface: &str, timeout: Duration) -> ReconResult {
    let mac = MacAddr::random();
    let xid: u32 = rand::thread_rng().gen();

    let frame = match discover_frame(mac, xid) {
        Ok(frame) => frame,
        Err(e) => return ReconResult::Error(e.to_string()),
    };

    debug!(interface = interface, mac = %mac, xid = xid, "Sending recon DISCOVER");
    let reply = transport
        .send_and_await_reply(interface, &frame, &offer_filter(xid), timeout)
        .await;

    match reply {
        Ok(Some(raw)) => match DhcpFrame::parse(&raw) {
            Some(offer) => {
                info!(
                    interface = interface,
                    server_mac = %offer.eth_src,
                    server_ip = %offer.ip_src,
                    offered_ip = %offer.packet.yiaddr,
                    "DHCP server found"
                );
                ReconResult::Found {
                    server_mac: offer.eth_src,
                    server_ip: offer.ip_src,
                    offered_ip: offer.packet.yiaddr,
                }
            }
            None => ReconResult::Error("Reply was not a DHCP message".to_string()),
        },
        Ok(None) => {
            info!(interface = interface, "No DHCP server answered");
            ReconResult::NoServer
        }
        Err(e) => {
            warn!(interface = interface, error = %e, "Recon failed");
            ReconResult::Error(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_json() {
        let found = ReconResult::Found {
            server_mac: MacAddr::new([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]),
            server_ip: Ipv4Addr::new(192, 168, 1, 1),
            offered_ip: Ipv4Addr::new(192, 168, 1, 100),
        };
        assert_eq!(
            serde_json::to_value(&found).unwrap(),
            serde_json::json!({
                "server_mac": "00:11:22:33:44:55",
                "server_ip": "192.168.1.1",
                "offered_ip": "192.168.1.100"
            })
        );
        assert_eq!(
            serde_json::to_value(ReconResult::NoServer).unwrap(),
            serde_json::json!({ "result": NO_SERVER_FOUND })
        );
        assert_eq!(
            serde_json::to_value(ReconResult::Error("down".into())).unwrap(),
            serde_json::json!({ "error": "down" })
        );
    }
}
