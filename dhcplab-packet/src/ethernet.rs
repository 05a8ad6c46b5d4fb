//! Ethernet II frame construction and parsing

use bytes::{BufMut, BytesMut};
use dhcplab_core::{ethertypes, MacAddr};
use std::fmt;

/// EtherType values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EtherType {
    IPv4,
    Arp,
    Vlan,
    Unknown(u16),
}

impl EtherType {
    pub fn to_u16(self) -> u16 {
        match self {
            EtherType::IPv4 => ethertypes::IPV4,
            EtherType::Arp => ethertypes::ARP,
            EtherType::Vlan => ethertypes::DOT1Q,
            EtherType::Unknown(value) => value,
        }
    }

    pub fn from_u16(value: u16) -> Self {
        match value {
            ethertypes::IPV4 => EtherType::IPv4,
            ethertypes::ARP => EtherType::Arp,
            ethertypes::DOT1Q => EtherType::Vlan,
            other => EtherType::Unknown(other),
        }
    }
}

impl fmt::Display for EtherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EtherType::IPv4 => write!(f, "IPv4"),
            EtherType::Arp => write!(f, "ARP"),
            EtherType::Vlan => write!(f, "802.1Q"),
            EtherType::Unknown(value) => write!(f, "0x{:04x}", value),
        }
    }
}

/// Ethernet II frame
#[derive(Debug, Clone, PartialEq)]
pub struct EthernetFrame {
    pub destination: MacAddr,
    pub source: MacAddr,
    pub ethertype: EtherType,
    pub payload: Vec<u8>,
}

impl EthernetFrame {
    /// Minimum Ethernet frame size (without FCS)
    pub const MIN_FRAME_SIZE: usize = 60;

    /// Ethernet header size (dst + src + type)
    pub const HEADER_SIZE: usize = 14;

    pub fn new(destination: MacAddr, source: MacAddr, ethertype: EtherType, payload: Vec<u8>) -> Self {
        EthernetFrame {
            destination,
            source,
            ethertype,
            payload,
        }
    }

    /// Serialize, padding short frames to the 60-byte minimum
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = BytesMut::with_capacity(Self::HEADER_SIZE + self.payload.len());
        buffer.put_slice(self.destination.as_bytes());
        buffer.put_slice(self.source.as_bytes());
        buffer.put_u16(self.ethertype.to_u16());
        buffer.put_slice(&self.payload);

        let mut bytes = buffer.to_vec();
        if bytes.len() < Self::MIN_FRAME_SIZE {
            bytes.resize(Self::MIN_FRAME_SIZE, 0);
        }
        bytes
    }

    /// Parse an Ethernet II frame; 802.3 length-framed input is rejected
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < Self::HEADER_SIZE {
            return None;
        }

        let ethertype = u16::from_be_bytes([data[12], data[13]]);
        if ethertype < 0x0600 {
            return None;
        }

        Some(EthernetFrame {
            destination: MacAddr::from_slice(&data[0..6])?,
            source: MacAddr::from_slice(&data[6..12])?,
            ethertype: EtherType::from_u16(ethertype),
            payload: data[Self::HEADER_SIZE..].to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ethertype_conversion() {
        assert_eq!(EtherType::from_u16(0x0800), EtherType::IPv4);
        assert_eq!(EtherType::Arp.to_u16(), 0x0806);
        assert_eq!(EtherType::from_u16(0x88cc), EtherType::Unknown(0x88cc));
        assert_eq!(EtherType::Unknown(0x88cc).to_string(), "0x88cc");
    }

    #[test]
    fn test_frame_layout_and_padding() {
        let src = MacAddr::new([0x02, 0x11, 0x22, 0x33, 0x44, 0x55]);
        let frame = EthernetFrame::new(MacAddr::broadcast(), src, EtherType::IPv4, vec![1, 2, 3]);
        let bytes = frame.to_bytes();

        assert_eq!(bytes.len(), EthernetFrame::MIN_FRAME_SIZE);
        assert_eq!(&bytes[0..6], &[0xff; 6]);
        assert_eq!(&bytes[6..12], src.as_bytes());
        assert_eq!(&bytes[12..14], &[0x08, 0x00]);
        assert_eq!(&bytes[14..17], &[1, 2, 3]);
    }

    #[test]
    fn test_parse() {
        let mut raw = vec![0xff; 6];
        raw.extend_from_slice(&[0x02, 0, 0, 0, 0, 1]);
        raw.extend_from_slice(&[0x08, 0x00, 0xaa]);

        let frame = EthernetFrame::from_bytes(&raw).unwrap();
        assert!(frame.destination.is_broadcast());
        assert_eq!(frame.source, MacAddr::new([0x02, 0, 0, 0, 0, 1]));
        assert_eq!(frame.ethertype, EtherType::IPv4);
        assert_eq!(frame.payload, vec![0xaa]);
    }

    #[test]
    fn test_parse_rejects_short_and_llc() {
        assert!(EthernetFrame::from_bytes(&[0u8; 10]).is_none());
        let mut llc = vec![0u8; 12];
        llc.extend_from_slice(&[0x00, 0x26]);
        assert!(EthernetFrame::from_bytes(&llc).is_none());
    }
}
