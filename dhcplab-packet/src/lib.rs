//! Packet construction and parsing library for dhcplab
//!
//! Builds and decodes the layers DHCP rides on:
//!
//! - [`ethernet`] - Ethernet II frames
//! - [`ip`] - IPv4 headers with checksum calculation
//! - [`udp`] - UDP datagrams with pseudo-header checksum
//! - [`checksum`] - Internet checksum utilities
//! - [`builder`] - fluent Ethernet/IPv4/UDP builder and the matching decoder
//!
//! # Building a DHCP client frame
//!
//! ```rust
//! use std::net::Ipv4Addr;
//! use dhcplab_core::MacAddr;
//! use dhcplab_packet::{EtherType, PacketBuilder};
//!
//! let frame = PacketBuilder::new()
//!     .ethernet(MacAddr::random(), MacAddr::broadcast(), EtherType::IPv4)
//!     .ipv4(Ipv4Addr::UNSPECIFIED, Ipv4Addr::BROADCAST)
//!     .udp(68, 67)
//!     .payload(vec![0u8; 240])
//!     .build()
//!     .unwrap();
//! assert_eq!(frame.len(), 14 + 20 + 8 + 240);
//! ```

pub mod builder;
pub mod checksum;
pub mod ethernet;
pub mod ip;
pub mod udp;

// Re-export commonly used types for convenience
pub use builder::{PacketBuilder, UdpFrame};
pub use checksum::{internet_checksum, transport_checksum};
pub use ethernet::{EtherType, EthernetFrame};
pub use ip::{IpProtocol, Ipv4Packet};
pub use udp::UdpDatagram;
