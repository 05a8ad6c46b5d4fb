//! IPv4 packet construction and parsing
//!
//! Only the option-less 20-byte header is generated; parsing honours IHL
//! and the total-length field so Ethernet padding is dropped.

use crate::checksum::internet_checksum;
use bytes::{BufMut, BytesMut};
use std::net::Ipv4Addr;

/// IP protocol numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpProtocol {
    Icmp,
    Tcp,
    Udp,
    Unknown(u8),
}

impl IpProtocol {
    pub fn to_u8(self) -> u8 {
        match self {
            IpProtocol::Icmp => 1,
            IpProtocol::Tcp => 6,
            IpProtocol::Udp => 17,
            IpProtocol::Unknown(value) => value,
        }
    }

    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => IpProtocol::Icmp,
            6 => IpProtocol::Tcp,
            17 => IpProtocol::Udp,
            other => IpProtocol::Unknown(other),
        }
    }
}

/// IPv4 packet
#[derive(Debug, Clone, PartialEq)]
pub struct Ipv4Packet {
    pub tos: u8,
    pub identification: u16,
    pub ttl: u8,
    pub protocol: IpProtocol,
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
    /// Header checksum as read or last written
    pub checksum: u16,
    pub payload: Vec<u8>,
}

impl Ipv4Packet {
    /// Header size without options
    pub const HEADER_SIZE: usize = 20;

    /// Default TTL
    pub const DEFAULT_TTL: u8 = 64;

    pub fn new(source: Ipv4Addr, destination: Ipv4Addr, protocol: IpProtocol, payload: Vec<u8>) -> Self {
        Ipv4Packet {
            tos: 0,
            identification: 0,
            ttl: Self::DEFAULT_TTL,
            protocol,
            source,
            destination,
            checksum: 0,
            payload,
        }
    }

    pub fn with_ttl(mut self, ttl: u8) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_identification(mut self, id: u16) -> Self {
        self.identification = id;
        self
    }

    /// Total length field value
    pub fn total_length(&self) -> usize {
        Self::HEADER_SIZE + self.payload.len()
    }

    fn header_bytes(&self, checksum: u16) -> BytesMut {
        let mut header = BytesMut::with_capacity(Self::HEADER_SIZE);
        header.put_u8(0x45); // version 4, IHL 5
        header.put_u8(self.tos);
        header.put_u16(self.total_length() as u16);
        header.put_u16(self.identification);
        header.put_u16(0); // flags / fragment offset
        header.put_u8(self.ttl);
        header.put_u8(self.protocol.to_u8());
        header.put_u16(checksum);
        header.put_slice(&self.source.octets());
        header.put_slice(&self.destination.octets());
        header
    }

    /// Serialize with a freshly computed header checksum
    pub fn to_bytes(&self) -> Vec<u8> {
        let checksum = internet_checksum(&self.header_bytes(0));
        let mut bytes = self.header_bytes(checksum);
        bytes.put_slice(&self.payload);
        bytes.to_vec()
    }

    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < Self::HEADER_SIZE || data[0] >> 4 != 4 {
            return None;
        }

        let header_len = ((data[0] & 0x0f) as usize) * 4;
        let total_len = u16::from_be_bytes([data[2], data[3]]) as usize;
        if header_len < Self::HEADER_SIZE || total_len < header_len || data.len() < total_len {
            return None;
        }

        Some(Ipv4Packet {
            tos: data[1],
            identification: u16::from_be_bytes([data[4], data[5]]),
            ttl: data[8],
            protocol: IpProtocol::from_u8(data[9]),
            checksum: u16::from_be_bytes([data[10], data[11]]),
            source: Ipv4Addr::new(data[12], data[13], data[14], data[15]),
            destination: Ipv4Addr::new(data[16], data[17], data[18], data[19]),
            payload: data[header_len..total_len].to_vec(),
        })
    }
}
