//! Common types used throughout dhcplab

use rand::Rng;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// MAC Address (6 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    /// Create a new MAC address
    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    /// Broadcast MAC address (ff:ff:ff:ff:ff:ff)
    pub const fn broadcast() -> Self {
        Self([0xff; 6])
    }

    /// Zero MAC address (00:00:00:00:00:00)
    pub const fn zero() -> Self {
        Self([0x00; 6])
    }

    /// Random unicast, locally administered address
    pub fn random() -> Self {
        let mut mac = [0u8; 6];
        rand::thread_rng().fill(&mut mac);
        mac[0] &= 0xFE;
        mac[0] |= 0x02;
        Self(mac)
    }

    /// Build from the first six bytes of a slice
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        let bytes: [u8; 6] = slice.get(..6)?.try_into().ok()?;
        Some(Self(bytes))
    }

    /// Get bytes as slice
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Convert to array
    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    pub fn is_broadcast(&self) -> bool {
        self.0 == [0xff; 6]
    }

    pub fn is_multicast(&self) -> bool {
        self.0[0] & 0x01 != 0
    }

    pub fn is_locally_administered(&self) -> bool {
        self.0[0] & 0x02 != 0
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl FromStr for MacAddr {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        if parts.len() != 6 {
            return Err(crate::Error::encoding(format!(
                "invalid MAC address '{}': expected 6 colon-separated groups",
                s
            )));
        }

        let mut bytes = [0u8; 6];
        for (i, part) in parts.iter().enumerate() {
            if part.len() != 2 || !part.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(crate::Error::encoding(format!(
                    "invalid MAC address '{}': group '{}' is not two hex digits",
                    s, part
                )));
            }
            bytes[i] = u8::from_str_radix(part, 16)
                .map_err(|_| crate::Error::encoding(format!("invalid MAC address hex '{}'", s)))?;
        }

        Ok(MacAddr(bytes))
    }
}

impl From<[u8; 6]> for MacAddr {
    fn from(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }
}

impl Serialize for MacAddr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The attack behaviors the harness can run
///
/// At most one run per kind is active at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackKind {
    /// DISCOVER from random MACs every 100ms to drain the pool
    Starvation,
    /// Spoofed NAKs towards a target address
    Nak,
    /// Spoofed RELEASEs claiming a target address
    Release,
    /// DISCOVER from random MACs with no delay
    Flood,
    /// DECLINEs marking an address as in use
    Decline,
    /// Answers DISCOVERs with crafted OFFERs
    RogueServer,
}

impl AttackKind {
    /// Every kind, in display order
    pub const ALL: [AttackKind; 6] = [
        AttackKind::Starvation,
        AttackKind::Nak,
        AttackKind::Release,
        AttackKind::Flood,
        AttackKind::Decline,
        AttackKind::RogueServer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AttackKind::Starvation => "starvation",
            AttackKind::Nak => "nak",
            AttackKind::Release => "release",
            AttackKind::Flood => "flood",
            AttackKind::Decline => "decline",
            AttackKind::RogueServer => "rogue_server",
        }
    }

    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            AttackKind::Starvation => "Exhaust the server pool with DISCOVERs from random MACs",
            AttackKind::Nak => "Send spoofed NAKs to a target address",
            AttackKind::Release => "Release a target's lease with spoofed RELEASEs",
            AttackKind::Flood => "DISCOVER flood at maximum rate",
            AttackKind::Decline => "Mark an address as in use with DECLINEs",
            AttackKind::RogueServer => "Answer DISCOVERs with rogue OFFERs",
        }
    }

    /// Whether the attack cannot do anything useful without a target address
    pub fn requires_target(&self) -> bool {
        matches!(self, AttackKind::Nak | AttackKind::Release)
    }

    /// Fixed delay between iterations of the attack loop
    pub fn interval(&self) -> Duration {
        match self {
            AttackKind::Starvation => Duration::from_millis(100),
            AttackKind::Nak => Duration::from_millis(500),
            AttackKind::Release => Duration::from_millis(1000),
            AttackKind::Flood => Duration::ZERO,
            AttackKind::Decline => Duration::from_millis(200),
            AttackKind::RogueServer => Duration::ZERO,
        }
    }

    /// Only every n-th successful send is written to the activity log
    pub fn log_every(&self) -> u64 {
        match self {
            AttackKind::Starvation => 10,
            AttackKind::Nak => 10,
            AttackKind::Release => 5,
            AttackKind::Flood => 500,
            AttackKind::Decline => 10,
            AttackKind::RogueServer => 1,
        }
    }
}

impl fmt::Display for AttackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttackKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "starvation" => Ok(AttackKind::Starvation),
            "nak" => Ok(AttackKind::Nak),
            "release" => Ok(AttackKind::Release),
            "flood" => Ok(AttackKind::Flood),
            "decline" => Ok(AttackKind::Decline),
            "rogue_server" | "rogue-server" | "rogue" => Ok(AttackKind::RogueServer),
            _ => Err(crate::Error::UnknownAttack(s.to_string())),
        }
    }
}

/// Ethertype constants
pub mod ethertypes {
    pub const IPV4: u16 = 0x0800;
    pub const ARP: u16 = 0x0806;
    pub const DOT1Q: u16 = 0x8100;
}

/// Protocol-specific constants
pub mod protocol_constants {
    /// DHCP ports
    pub const DHCP_SERVER_PORT: u16 = 67;
    pub const DHCP_CLIENT_PORT: u16 = 68;

    /// IP protocol number for UDP
    pub const IP_PROTO_UDP: u8 = 17;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mac_round_trip() {
        for text in ["aa:bb:cc:dd:ee:ff", "00:11:22:33:44:55", "02:00:5e:10:00:01"] {
            let mac: MacAddr = text.parse().unwrap();
            assert_eq!(mac.to_string(), text);
            let again: MacAddr = mac.to_string().parse().unwrap();
            assert_eq!(again, mac);
        }
    }

    #[test]
    fn test_mac_uppercase_canonicalises() {
        let mac: MacAddr = "AA:BB:CC:DD:EE:0F".parse().unwrap();
        assert_eq!(mac.octets(), [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0x0f]);
        assert_eq!(mac.to_string(), "aa:bb:cc:dd:ee:0f");
    }

    #[test]
    fn test_mac_invalid() {
        for bad in [
            "",
            "aa:bb:cc:dd:ee",
            "aa:bb:cc:dd:ee:ff:00",
            "aa:bb:cc:dd:ee:gg",
            "a:bb:cc:dd:ee:ff",
            "aaa:bb:cc:dd:ee:ff",
            "aa-bb-cc-dd-ee-ff",
            "+a:bb:cc:dd:ee:ff",
        ] {
            let err = bad.parse::<MacAddr>().unwrap_err();
            assert!(matches!(err, crate::Error::Encoding(_)), "{bad}: {err}");
        }
    }

    #[test]
    fn test_mac_random_is_unicast_local() {
        let a = MacAddr::random();
        let b = MacAddr::random();
        assert_ne!(a, b);
        assert!(!a.is_multicast());
        assert!(a.is_locally_administered());
    }

    #[test]
    fn test_mac_serializes_as_text() {
        let mac = MacAddr::new([0xde, 0xad, 0xbe, 0xef, 0x00, 0x01]);
        assert_eq!(
            serde_json::to_string(&mac).unwrap(),
            "\"de:ad:be:ef:00:01\""
        );
    }

    #[test]
    fn test_attack_kind_parse() {
        for kind in AttackKind::ALL {
            assert_eq!(kind.as_str().parse::<AttackKind>().unwrap(), kind);
        }
        assert_eq!("ROGUE".parse::<AttackKind>().unwrap(), AttackKind::RogueServer);
        assert!(matches!(
            "smurf".parse::<AttackKind>(),
            Err(crate::Error::UnknownAttack(_))
        ));
    }

    #[test]
    fn test_attack_kind_requirements() {
        assert!(AttackKind::Nak.requires_target());
        assert!(AttackKind::Release.requires_target());
        assert!(!AttackKind::Decline.requires_target());
        assert_eq!(AttackKind::Flood.interval(), Duration::ZERO);
        assert_eq!(AttackKind::Starvation.interval(), Duration::from_millis(100));
    }
}
