//! DHCP implementation
//!
//! This module provides:
//! - Packet parsing and building
//! - Ethernet/IPv4/UDP framing for client- and server-origin messages
//! - Per-attack configuration parsed from option maps
//! - Attack implementations (Starvation, Flood, NAK, Release, Decline, Rogue server)

pub mod attack;
pub mod config;
pub mod frame;
pub mod packet;
pub mod rogue;

#[cfg(test)]
mod tests;

pub use attack::{build_attack, DeclineAttack, DiscoverAttack, NakAttack, ReleaseAttack};
pub use config::{AttackConfig, RogueServerConfig, DEFAULT_DECLINE_ADDRESS, DEFAULT_SERVER_ID};
pub use frame::DhcpFrame;
pub use packet::{DhcpMessageType, DhcpOption, DhcpPacket};
pub use rogue::RogueServerAttack;
