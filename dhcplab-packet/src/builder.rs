//! Fluent builder for Ethernet/IPv4/UDP frames and the matching decoder

use crate::ethernet::{EtherType, EthernetFrame};
use crate::ip::{IpProtocol, Ipv4Packet};
use crate::udp::UdpDatagram;
use dhcplab_core::{Error, MacAddr, Result};
use std::net::Ipv4Addr;

#[derive(Debug, Clone, Copy)]
struct Layer2 {
    src: MacAddr,
    dst: MacAddr,
    ethertype: EtherType,
}

#[derive(Debug, Clone, Copy)]
struct Layer3 {
    src: Ipv4Addr,
    dst: Ipv4Addr,
    ttl: u8,
    identification: u16,
}

#[derive(Debug, Clone, Copy)]
struct Layer4 {
    src_port: u16,
    dst_port: u16,
}

/// Packet builder with fluent API
///
/// ```
/// use std::net::Ipv4Addr;
/// use dhcplab_core::MacAddr;
/// use dhcplab_packet::{EtherType, PacketBuilder};
///
/// let frame = PacketBuilder::new()
///     .ethernet(MacAddr::random(), MacAddr::broadcast(), EtherType::IPv4)
///     .ipv4(Ipv4Addr::new(192, 168, 1, 1), Ipv4Addr::BROADCAST)
///     .ttl(128)
///     .udp(67, 68)
///     .payload(b"hello".to_vec())
///     .build()
///     .unwrap();
/// assert_eq!(frame[22], 128);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PacketBuilder {
    layer2: Option<Layer2>,
    layer3: Option<Layer3>,
    layer4: Option<Layer4>,
    payload: Vec<u8>,
}

impl PacketBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ethernet(mut self, src: MacAddr, dst: MacAddr, ethertype: EtherType) -> Self {
        self.layer2 = Some(Layer2 { src, dst, ethertype });
        self
    }

    pub fn ipv4(mut self, src: Ipv4Addr, dst: Ipv4Addr) -> Self {
        self.layer3 = Some(Layer3 {
            src,
            dst,
            ttl: Ipv4Packet::DEFAULT_TTL,
            identification: 0,
        });
        self
    }

    /// Set the IPv4 TTL (no-op without an IPv4 layer)
    pub fn ttl(mut self, ttl: u8) -> Self {
        if let Some(layer3) = self.layer3.as_mut() {
            layer3.ttl = ttl;
        }
        self
    }

    /// Set the IPv4 identification (no-op without an IPv4 layer)
    pub fn identification(mut self, id: u16) -> Self {
        if let Some(layer3) = self.layer3.as_mut() {
            layer3.identification = id;
        }
        self
    }

    pub fn udp(mut self, src_port: u16, dst_port: u16) -> Self {
        self.layer4 = Some(Layer4 { src_port, dst_port });
        self
    }

    pub fn payload(mut self, data: Vec<u8>) -> Self {
        self.payload = data;
        self
    }

    /// Assemble the frame, innermost layer first
    ///
    /// # Errors
    ///
    /// Fails when a layer is present without the layer below it.
    pub fn build(self) -> Result<Vec<u8>> {
        let layer2 = self
            .layer2
            .ok_or_else(|| Error::PacketConstruction("Layer 2 is required".into()))?;

        let mut data = self.payload;

        if let Some(l4) = self.layer4 {
            let l3 = self
                .layer3
                .ok_or_else(|| Error::PacketConstruction("Layer 4 requires Layer 3".into()))?;
            data = UdpDatagram::new(l4.src_port, l4.dst_port, data).to_bytes(l3.src, l3.dst);
        }

        if let Some(l3) = self.layer3 {
            if layer2.ethertype != EtherType::IPv4 {
                return Err(Error::PacketConstruction(format!(
                    "IPv4 payload under EtherType {}",
                    layer2.ethertype
                )));
            }
            data = Ipv4Packet::new(l3.src, l3.dst, IpProtocol::Udp, data)
                .with_ttl(l3.ttl)
                .with_identification(l3.identification)
                .to_bytes();
        }

        Ok(EthernetFrame::new(layer2.dst, layer2.src, layer2.ethertype, data).to_bytes())
    }
}

/// Decoded Ethernet/IPv4/UDP frame
#[derive(Debug, Clone, PartialEq)]
pub struct UdpFrame {
    pub eth_src: MacAddr,
    pub eth_dst: MacAddr,
    pub ip_src: Ipv4Addr,
    pub ip_dst: Ipv4Addr,
    pub src_port: u16,
    pub dst_port: u16,
    pub payload: Vec<u8>,
}

impl UdpFrame {
    /// Decode a raw frame; anything other than IPv4/UDP yields `None`
    pub fn parse(data: &[u8]) -> Option<Self> {
        let ethernet = EthernetFrame::from_bytes(data)?;
        if ethernet.ethertype != EtherType::IPv4 {
            return None;
        }

        let ip = Ipv4Packet::from_bytes(&ethernet.payload)?;
        if ip.protocol != IpProtocol::Udp {
            return None;
        }

        let udp = UdpDatagram::from_bytes(&ip.payload)?;
        Some(UdpFrame {
            eth_src: ethernet.source,
            eth_dst: ethernet.destination,
            ip_src: ip.source,
            ip_dst: ip.destination,
            src_port: udp.source_port,
            dst_port: udp.destination_port,
            payload: udp.payload,
        })
    }
}
