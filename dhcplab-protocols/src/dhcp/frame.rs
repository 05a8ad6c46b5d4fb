//! Ethernet/IPv4/UDP framing for DHCP messages
//!
//! Client-origin messages go from port 68 to 67, server-origin ones from 67
//! to 68. Everything is broadcast at layer 2 unless the requester's hardware
//! address is known.

use super::packet::{DhcpMessageType, DhcpPacket};
use dhcplab_core::protocol_constants::{DHCP_CLIENT_PORT, DHCP_SERVER_PORT};
use dhcplab_core::{FrameFilter, MacAddr, Result};
use dhcplab_packet::{EtherType, PacketBuilder, UdpFrame};
use std::net::Ipv4Addr;

fn client_frame(
    src_mac: MacAddr,
    src_ip: Ipv4Addr,
    dst_ip: Ipv4Addr,
    packet: &DhcpPacket,
) -> Result<Vec<u8>> {
    PacketBuilder::new()
        .ethernet(src_mac, MacAddr::broadcast(), EtherType::IPv4)
        .ipv4(src_ip, dst_ip)
        .udp(DHCP_CLIENT_PORT, DHCP_SERVER_PORT)
        .payload(packet.build()?)
        .build()
}

fn server_frame(
    src_mac: MacAddr,
    dst_mac: MacAddr,
    src_ip: Ipv4Addr,
    dst_ip: Ipv4Addr,
    packet: &DhcpPacket,
) -> Result<Vec<u8>> {
    PacketBuilder::new()
        .ethernet(src_mac, dst_mac, EtherType::IPv4)
        .ipv4(src_ip, dst_ip)
        .udp(DHCP_SERVER_PORT, DHCP_CLIENT_PORT)
        .payload(packet.build()?)
        .build()
}

/// Broadcast DISCOVER from `mac`
pub fn discover_frame(mac: MacAddr, xid: u32) -> Result<Vec<u8>> {
    client_frame(
        mac,
        Ipv4Addr::UNSPECIFIED,
        Ipv4Addr::BROADCAST,
        &DhcpPacket::discover(xid, mac),
    )
}

/// RELEASE of `client_ip` sent straight to `server_id`
pub fn release_frame(
    mac: MacAddr,
    xid: u32,
    client_ip: Ipv4Addr,
    server_id: Ipv4Addr,
) -> Result<Vec<u8>> {
    client_frame(
        mac,
        client_ip,
        server_id,
        &DhcpPacket::release(xid, mac, client_ip, server_id),
    )
}

/// Broadcast DECLINE of `address`
pub fn decline_frame(mac: MacAddr, xid: u32, address: Ipv4Addr) -> Result<Vec<u8>> {
    client_frame(
        mac,
        Ipv4Addr::UNSPECIFIED,
        Ipv4Addr::BROADCAST,
        &DhcpPacket::decline(xid, mac, address),
    )
}

/// NAK spoofed from `server_id` towards `target`
///
/// The victim's hardware address is not known, so layer 2 is broadcast.
pub fn nak_frame(
    server_mac: MacAddr,
    xid: u32,
    server_id: Ipv4Addr,
    target: Ipv4Addr,
) -> Result<Vec<u8>> {
    server_frame(
        server_mac,
        MacAddr::broadcast(),
        server_id,
        target,
        &DhcpPacket::nak(xid, MacAddr::zero(), server_id),
    )
}

/// OFFER answering a DISCOVER
///
/// `offer` must already carry the requester's xid and chaddr; the frame is
/// addressed to that chaddr.
pub fn offer_frame(server_mac: MacAddr, server_ip: Ipv4Addr, offer: &DhcpPacket) -> Result<Vec<u8>> {
    server_frame(server_mac, offer.chaddr, server_ip, Ipv4Addr::BROADCAST, offer)
}

/// A DHCP message together with its framing
#[derive(Debug, Clone, PartialEq)]
pub struct DhcpFrame {
    pub eth_src: MacAddr,
    pub eth_dst: MacAddr,
    pub ip_src: Ipv4Addr,
    pub ip_dst: Ipv4Addr,
    pub src_port: u16,
    pub dst_port: u16,
    pub packet: DhcpPacket,
}

impl DhcpFrame {
    /// Decode a raw frame
    ///
    /// Returns `None` for anything that is not UDP between the DHCP ports
    /// carrying a well-formed DHCP message.
    pub fn parse(data: &[u8]) -> Option<Self> {
        let udp = UdpFrame::parse(data)?;
        let ports = (udp.src_port, udp.dst_port);
        if ports != (DHCP_CLIENT_PORT, DHCP_SERVER_PORT)
            && ports != (DHCP_SERVER_PORT, DHCP_CLIENT_PORT)
        {
            return None;
        }

        let packet = DhcpPacket::parse(&udp.payload).ok()?;
        Some(Self {
            eth_src: udp.eth_src,
            eth_dst: udp.eth_dst,
            ip_src: udp.ip_src,
            ip_dst: udp.ip_dst,
            src_port: udp.src_port,
            dst_port: udp.dst_port,
            packet,
        })
    }

    pub fn message_type(&self) -> Option<DhcpMessageType> {
        self.packet.message_type()
    }

    /// Sent by a client towards a server
    pub fn is_to_server(&self) -> bool {
        self.dst_port == DHCP_SERVER_PORT
    }
}

/// Client-to-server DHCP traffic of any type
pub fn to_server_filter() -> FrameFilter {
    FrameFilter::new("dhcp to server", |frame| {
        DhcpFrame::parse(frame).is_some_and(|f| f.is_to_server())
    })
}

/// DISCOVER messages
pub fn discover_filter() -> FrameFilter {
    FrameFilter::new("dhcp discover", |frame| {
        DhcpFrame::parse(frame).is_some_and(|f| {
            f.is_to_server() && f.message_type() == Some(DhcpMessageType::Discover)
        })
    })
}

/// OFFER answering transaction `xid`
pub fn offer_filter(xid: u32) -> FrameFilter {
    FrameFilter::new(format!("dhcp offer xid 0x{:08x}", xid), move |frame| {
        DhcpFrame::parse(frame).is_some_and(|f| {
            !f.is_to_server()
                && f.packet.xid == xid
                && f.message_type() == Some(DhcpMessageType::Offer)
        })
    })
}
