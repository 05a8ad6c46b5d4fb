//! UDP datagram construction and parsing

use crate::checksum::transport_checksum;
use bytes::{BufMut, BytesMut};
use dhcplab_core::protocol_constants::IP_PROTO_UDP;
use std::net::Ipv4Addr;

/// UDP datagram
#[derive(Debug, Clone, PartialEq)]
pub struct UdpDatagram {
    pub source_port: u16,
    pub destination_port: u16,
    /// Checksum as read or last written
    pub checksum: u16,
    pub payload: Vec<u8>,
}

impl UdpDatagram {
    /// UDP header size in bytes
    pub const HEADER_SIZE: usize = 8;

    pub fn new(source_port: u16, destination_port: u16, payload: Vec<u8>) -> Self {
        UdpDatagram {
            source_port,
            destination_port,
            checksum: 0,
            payload,
        }
    }

    pub fn length(&self) -> u16 {
        (Self::HEADER_SIZE + self.payload.len()) as u16
    }

    fn encode(&self, checksum: u16) -> BytesMut {
        let mut buffer = BytesMut::with_capacity(self.length() as usize);
        buffer.put_u16(self.source_port);
        buffer.put_u16(self.destination_port);
        buffer.put_u16(self.length());
        buffer.put_u16(checksum);
        buffer.put_slice(&self.payload);
        buffer
    }

    /// Serialize with the pseudo-header checksum for the given addresses
    pub fn to_bytes(&self, src_ip: Ipv4Addr, dst_ip: Ipv4Addr) -> Vec<u8> {
        let unchecked = self.encode(0);
        let checksum = match transport_checksum(
            &src_ip.octets(),
            &dst_ip.octets(),
            IP_PROTO_UDP,
            &unchecked,
        ) {
            // zero means "no checksum" on the wire
            0 => 0xFFFF,
            sum => sum,
        };
        self.encode(checksum).to_vec()
    }

    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < Self::HEADER_SIZE {
            return None;
        }

        let length = u16::from_be_bytes([data[4], data[5]]) as usize;
        if length < Self::HEADER_SIZE || data.len() < length {
            return None;
        }

        Some(UdpDatagram {
            source_port: u16::from_be_bytes([data[0], data[1]]),
            destination_port: u16::from_be_bytes([data[2], data[3]]),
            checksum: u16::from_be_bytes([data[6], data[7]]),
            payload: data[Self::HEADER_SIZE..length].to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_udp_layout() {
        let datagram = UdpDatagram::new(68, 67, vec![0xab; 4]);
        let bytes = datagram.to_bytes(Ipv4Addr::UNSPECIFIED, Ipv4Addr::BROADCAST);

        assert_eq!(bytes.len(), 12);
        assert_eq!(&bytes[0..2], &68u16.to_be_bytes());
        assert_eq!(&bytes[2..4], &67u16.to_be_bytes());
        assert_eq!(&bytes[4..6], &12u16.to_be_bytes());
        assert_ne!(u16::from_be_bytes([bytes[6], bytes[7]]), 0);
    }

    #[test]
    fn test_udp_checksum_verifies() {
        let src = Ipv4Addr::new(192, 168, 1, 1);
        let dst = Ipv4Addr::new(192, 168, 1, 50);
        let bytes = UdpDatagram::new(67, 68, b"offer".to_vec()).to_bytes(src, dst);
        assert_eq!(
            transport_checksum(&src.octets(), &dst.octets(), IP_PROTO_UDP, &bytes),
            0
        );
    }

    #[test]
    fn test_udp_parse() {
        let bytes = UdpDatagram::new(67, 68, vec![1, 2, 3]).to_bytes(Ipv4Addr::LOCALHOST, Ipv4Addr::LOCALHOST);
        let parsed = UdpDatagram::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.source_port, 67);
        assert_eq!(parsed.destination_port, 68);
        assert_eq!(parsed.payload, vec![1, 2, 3]);
        assert!(UdpDatagram::from_bytes(&bytes[..5]).is_none());
    }
}
