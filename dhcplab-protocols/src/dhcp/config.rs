//! Per-attack configuration
//!
//! Free-form `key=value` options from the caller are turned into one typed
//! config per attack kind. Unknown keys, keys that do not apply to the kind
//! and unparsable values are all rejected before anything is spawned.

use dhcplab_core::{AttackKind, Error, Result};
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::time::Duration;

/// Server identifier Nak and Release claim to come from
pub const DEFAULT_SERVER_ID: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 1);

/// Address Decline reports as in use when no target is given
pub const DEFAULT_DECLINE_ADDRESS: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 5);

/// Settings for the rogue responder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RogueServerConfig {
    /// Address placed in the server identifier option and the IP source
    pub server_ip: Ipv4Addr,
    pub gateway: Ipv4Addr,
    pub dns: Vec<Ipv4Addr>,
    /// Address offered to every requester
    pub offered_ip: Ipv4Addr,
    /// Lease time in seconds
    pub lease_time: u32,
    pub subnet_mask: Ipv4Addr,
    /// How long one receive poll waits before re-checking cancellation
    pub poll_timeout: Duration,
    /// Pause after a receive failure
    pub error_backoff: Duration,
}

impl Default for RogueServerConfig {
    fn default() -> Self {
        let server_ip = Ipv4Addr::new(192, 168, 1, 254);
        Self {
            server_ip,
            gateway: server_ip,
            dns: vec![server_ip],
            offered_ip: Ipv4Addr::new(192, 168, 1, 150),
            lease_time: 3600,
            subnet_mask: Ipv4Addr::new(255, 255, 255, 0),
            poll_timeout: Duration::from_secs(1),
            error_backoff: Duration::from_secs(1),
        }
    }
}

/// Typed configuration, one variant per attack kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttackConfig {
    Starvation,
    Flood,
    /// `target` is `None` when the caller gave none; the task then exits
    Nak {
        target: Option<Ipv4Addr>,
        server_id: Ipv4Addr,
    },
    Release {
        target: Option<Ipv4Addr>,
        server_id: Ipv4Addr,
    },
    Decline {
        address: Ipv4Addr,
    },
    RogueServer(RogueServerConfig),
}

fn parse_addr(name: &str, value: &str) -> Result<Ipv4Addr> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::invalid_option(name, format!("'{}' is not an IPv4 address", value)))
}

fn parse_addr_list(name: &str, value: &str) -> Result<Vec<Ipv4Addr>> {
    let addrs = value
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| parse_addr(name, part))
        .collect::<Result<Vec<_>>>()?;
    if addrs.is_empty() {
        return Err(Error::invalid_option(name, "at least one address is required"));
    }
    Ok(addrs)
}

/// Reject keys outside `allowed`
fn check_keys(kind: AttackKind, options: &HashMap<String, String>, allowed: &[&str]) -> Result<()> {
    // sorted so the reported key is deterministic
    let mut keys: Vec<&String> = options.keys().collect();
    keys.sort();
    match keys.into_iter().find(|key| !allowed.contains(&key.as_str())) {
        Some(key) if allowed.is_empty() => Err(Error::invalid_option(
            key.as_str(),
            format!("{} takes no options", kind),
        )),
        Some(key) => Err(Error::invalid_option(
            key.as_str(),
            format!("not applicable to {} (expected one of: {})", kind, allowed.join(", ")),
        )),
        None => Ok(()),
    }
}

impl AttackConfig {
    /// Build the config for `kind` from the caller's target and options
    ///
    /// A malformed target is rejected; a missing one is kept as `None`
    /// for the kinds that need it so the run can exit on its own.
    pub fn from_request(
        kind: AttackKind,
        target: Option<&str>,
        options: &HashMap<String, String>,
    ) -> Result<Self> {
        let target = target
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| parse_addr("target", t))
            .transpose()?;
        let server_id = || -> Result<Ipv4Addr> {
            options
                .get("server_id")
                .map(|v| parse_addr("server_id", v))
                .unwrap_or(Ok(DEFAULT_SERVER_ID))
        };

        match kind {
            AttackKind::Starvation => {
                check_keys(kind, options, &[])?;
                Ok(AttackConfig::Starvation)
            }
            AttackKind::Flood => {
                check_keys(kind, options, &[])?;
                Ok(AttackConfig::Flood)
            }
            AttackKind::Nak => {
                check_keys(kind, options, &["server_id"])?;
                Ok(AttackConfig::Nak {
                    target,
                    server_id: server_id()?,
                })
            }
            AttackKind::Release => {
                check_keys(kind, options, &["server_id"])?;
                Ok(AttackConfig::Release {
                    target,
                    server_id: server_id()?,
                })
            }
            AttackKind::Decline => {
                check_keys(kind, options, &[])?;
                Ok(AttackConfig::Decline {
                    address: target.unwrap_or(DEFAULT_DECLINE_ADDRESS),
                })
            }
            AttackKind::RogueServer => {
                check_keys(
                    kind,
                    options,
                    &["server_ip", "gateway", "dns", "offered_ip", "lease_time", "subnet_mask"],
                )?;
                let defaults = RogueServerConfig::default();
                let server_ip = match options.get("server_ip") {
                    Some(v) => parse_addr("server_ip", v)?,
                    None => defaults.server_ip,
                };
                let gateway = match options.get("gateway") {
                    Some(v) => parse_addr("gateway", v)?,
                    None => server_ip,
                };
                let dns = match options.get("dns") {
                    Some(v) => parse_addr_list("dns", v)?,
                    None => vec![server_ip],
                };
                let offered_ip = match options.get("offered_ip") {
                    Some(v) => parse_addr("offered_ip", v)?,
                    None => defaults.offered_ip,
                };
                let lease_time = match options.get("lease_time") {
                    Some(v) => v.trim().parse::<u32>().map_err(|_| {
                        Error::invalid_option("lease_time", format!("'{}' is not a number of seconds", v))
                    })?,
                    None => defaults.lease_time,
                };
                let subnet_mask = match options.get("subnet_mask") {
                    Some(v) => parse_addr("subnet_mask", v)?,
                    None => defaults.subnet_mask,
                };
                Ok(AttackConfig::RogueServer(RogueServerConfig {
                    server_ip,
                    gateway,
                    dns,
                    offered_ip,
                    lease_time,
                    subnet_mask,
                    ..defaults
                }))
            }
        }
    }

    pub fn kind(&self) -> AttackKind {
        match self {
            AttackConfig::Starvation => AttackKind::Starvation,
            AttackConfig::Flood => AttackKind::Flood,
            AttackConfig::Nak { .. } => AttackKind::Nak,
            AttackConfig::Release { .. } => AttackKind::Release,
            AttackConfig::Decline { .. } => AttackKind::Decline,
            AttackConfig::RogueServer(_) => AttackKind::RogueServer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let none = HashMap::new();
        assert_eq!(
            AttackConfig::from_request(AttackKind::Nak, None, &none).unwrap(),
            AttackConfig::Nak {
                target: None,
                server_id: DEFAULT_SERVER_ID
            }
        );
        assert_eq!(
            AttackConfig::from_request(AttackKind::Decline, None, &none).unwrap(),
            AttackConfig::Decline {
                address: DEFAULT_DECLINE_ADDRESS
            }
        );
        assert_eq!(
            AttackConfig::from_request(AttackKind::RogueServer, None, &none).unwrap(),
            AttackConfig::RogueServer(RogueServerConfig::default())
        );
    }

    #[test]
    fn test_target_and_server_id() {
        let config = AttackConfig::from_request(
            AttackKind::Release,
            Some("10.1.1.9"),
            &opts(&[("server_id", "10.1.1.1")]),
        )
        .unwrap();
        assert_eq!(
            config,
            AttackConfig::Release {
                target: Some(Ipv4Addr::new(10, 1, 1, 9)),
                server_id: Ipv4Addr::new(10, 1, 1, 1)
            }
        );
        assert_eq!(config.kind(), AttackKind::Release);
    }

    #[test]
    fn test_empty_target_is_missing() {
        let config =
            AttackConfig::from_request(AttackKind::Nak, Some("  "), &HashMap::new()).unwrap();
        assert!(matches!(config, AttackConfig::Nak { target: None, .. }));
    }

    #[test]
    fn test_rogue_options() {
        let config = AttackConfig::from_request(
            AttackKind::RogueServer,
            None,
            &opts(&[
                ("server_ip", "10.0.0.1"),
                ("dns", "8.8.8.8, 1.1.1.1"),
                ("lease_time", "120"),
            ]),
        )
        .unwrap();
        let AttackConfig::RogueServer(rogue) = config else {
            panic!("expected rogue config");
        };
        assert_eq!(rogue.server_ip, Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(rogue.gateway, Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(rogue.dns, vec![Ipv4Addr::new(8, 8, 8, 8), Ipv4Addr::new(1, 1, 1, 1)]);
        assert_eq!(rogue.lease_time, 120);
        assert_eq!(rogue.offered_ip, Ipv4Addr::new(192, 168, 1, 150));
    }

    #[test]
    fn test_rejections() {
        let bad_target = AttackConfig::from_request(AttackKind::Nak, Some("not-an-ip"), &HashMap::new());
        assert!(matches!(bad_target, Err(Error::InvalidOption { ref name, .. }) if name == "target"));

        let unknown = AttackConfig::from_request(AttackKind::Flood, None, &opts(&[("rate", "5")]));
        assert!(matches!(unknown, Err(Error::InvalidOption { ref name, .. }) if name == "rate"));

        let inapplicable =
            AttackConfig::from_request(AttackKind::Nak, None, &opts(&[("gateway", "10.0.0.1")]));
        assert!(inapplicable.is_err());

        let bad_lease = AttackConfig::from_request(
            AttackKind::RogueServer,
            None,
            &opts(&[("lease_time", "forever")]),
        );
        assert!(bad_lease.unwrap_err().is_validation());

        let empty_dns =
            AttackConfig::from_request(AttackKind::RogueServer, None, &opts(&[("dns", ",")]));
        assert!(empty_dns.is_err());
    }
}
