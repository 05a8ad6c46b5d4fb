//! Attack loop tests against the in-memory transport

use super::attack::{build_attack, DeclineAttack, DiscoverAttack, NakAttack, ReleaseAttack};
use super::config::{AttackConfig, RogueServerConfig, DEFAULT_DECLINE_ADDRESS, DEFAULT_SERVER_ID};
use super::frame::{discover_frame, DhcpFrame};
use super::packet::DhcpMessageType;
use super::rogue::RogueServerAttack;
use dhcplab_core::{
    ActivityLog, Attack, AttackContext, AttackKind, AttackStatsCounters, LogSource, MacAddr,
};
use dhcplab_transport::MemoryTransport;
use std::collections::{HashMap, HashSet};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const SERVER_MAC: MacAddr = MacAddr::new([0x02, 0xaa, 0x00, 0x00, 0x00, 0x01]);

fn context(kind: AttackKind, transport: Arc<MemoryTransport>) -> AttackContext {
    AttackContext {
        kind,
        interface: "eth0".to_string(),
        running: Arc::new(AtomicBool::new(true)),
        stats: Arc::new(AttackStatsCounters::default()),
        log: Arc::new(ActivityLog::default()),
        transport,
    }
}

fn transport() -> Arc<MemoryTransport> {
    Arc::new(MemoryTransport::new().with_hardware_address(Some(SERVER_MAC)))
}

/// Run `attack` for `duration`, then clear its running flag and wait for it
async fn run_for(attack: Arc<dyn Attack>, ctx: &AttackContext, duration: Duration) {
    let task_ctx = ctx.clone();
    let handle = tokio::spawn(async move { attack.execute(task_ctx).await });
    tokio::time::sleep(duration).await;
    ctx.running.store(false, Ordering::Relaxed);
    tokio::time::timeout(Duration::from_secs(3), handle)
        .await
        .expect("attack did not stop")
        .expect("attack panicked")
        .expect("attack failed");
}

fn sent_frames(transport: &MemoryTransport) -> Vec<DhcpFrame> {
    transport
        .sent()
        .iter()
        .map(|sent| DhcpFrame::parse(&sent.frame).expect("sent frame is DHCP"))
        .collect()
}

#[tokio::test]
async fn test_starvation_uses_fresh_clients() {
    let transport = transport();
    let ctx = context(AttackKind::Starvation, transport.clone());

    run_for(Arc::new(DiscoverAttack::starvation()), &ctx, Duration::from_millis(350)).await;

    let frames = sent_frames(&transport);
    assert!(frames.len() >= 2, "only {} frames sent", frames.len());
    assert_eq!(ctx.stats.snapshot().sent, frames.len() as u64);

    let mut clients = HashSet::new();
    for frame in &frames {
        assert_eq!(frame.message_type(), Some(DhcpMessageType::Discover));
        assert_eq!(frame.eth_src, frame.packet.chaddr);
        assert!(frame.packet.chaddr.is_locally_administered());
        assert!(!frame.packet.chaddr.is_multicast());
        clients.insert(frame.packet.chaddr);
    }
    assert_eq!(clients.len(), frames.len());
}

#[tokio::test]
async fn test_flood_outpaces_starvation_and_samples_log() {
    let transport = transport();
    let ctx = context(AttackKind::Flood, transport.clone());

    run_for(Arc::new(DiscoverAttack::flood()), &ctx, Duration::from_millis(100)).await;

    let sent = ctx.stats.snapshot().sent;
    assert!(sent > 10, "flood sent only {}", sent);
    let logged = ctx
        .log
        .snapshot()
        .iter()
        .filter(|e| e.source == LogSource::Attack(AttackKind::Flood))
        .count() as u64;
    assert!(logged >= 1);
    assert!(logged <= sent / AttackKind::Flood.log_every() + 1);
}

#[tokio::test]
async fn test_nak_without_target_exits() {
    let transport = transport();
    let ctx = context(AttackKind::Nak, transport.clone());
    let attack = NakAttack {
        target: None,
        server_id: DEFAULT_SERVER_ID,
    };

    tokio::time::timeout(Duration::from_secs(1), attack.execute(ctx.clone()))
        .await
        .expect("nak without target must exit on its own")
        .unwrap();

    assert_eq!(transport.sent_count(), 0);
    let logs = ctx.log.snapshot();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].source, LogSource::System);
    assert!(logs[0].msg.contains("target"));
}

#[tokio::test]
async fn test_release_without_target_exits() {
    let transport = transport();
    let ctx = context(AttackKind::Release, transport.clone());
    let attack = ReleaseAttack {
        target: None,
        server_id: DEFAULT_SERVER_ID,
    };

    tokio::time::timeout(Duration::from_secs(1), attack.execute(ctx))
        .await
        .expect("release without target must exit on its own")
        .unwrap();
    assert_eq!(transport.sent_count(), 0);
}

#[tokio::test]
async fn test_nak_spoofs_server() {
    let transport = transport();
    let ctx = context(AttackKind::Nak, transport.clone());
    let target = Ipv4Addr::new(192, 168, 1, 42);
    let attack = Arc::new(NakAttack {
        target: Some(target),
        server_id: DEFAULT_SERVER_ID,
    });

    run_for(attack, &ctx, Duration::from_millis(100)).await;

    let frames = sent_frames(&transport);
    assert_eq!(frames.len(), 1);
    let nak = &frames[0];
    assert_eq!(nak.message_type(), Some(DhcpMessageType::Nak));
    assert_eq!(nak.eth_src, SERVER_MAC);
    assert_eq!(nak.ip_src, DEFAULT_SERVER_ID);
    assert_eq!(nak.ip_dst, target);
    assert_eq!(nak.packet.server_id(), Some(DEFAULT_SERVER_ID));
}

#[tokio::test]
async fn test_nak_falls_back_to_random_source() {
    let transport = Arc::new(MemoryTransport::new().with_hardware_address(None));
    let ctx = context(AttackKind::Nak, transport.clone());
    let attack = Arc::new(NakAttack {
        target: Some(Ipv4Addr::new(10, 0, 0, 2)),
        server_id: Ipv4Addr::new(10, 0, 0, 1),
    });

    run_for(attack, &ctx, Duration::from_millis(50)).await;

    let frames = sent_frames(&transport);
    assert_eq!(frames.len(), 1);
    assert!(frames[0].eth_src.is_locally_administered());
    assert_eq!(ctx.stats.snapshot().errors, 0);
}

#[tokio::test]
async fn test_release_claims_target_address() {
    let transport = transport();
    let ctx = context(AttackKind::Release, transport.clone());
    let target = Ipv4Addr::new(192, 168, 1, 42);
    let server = Ipv4Addr::new(192, 168, 1, 2);
    let attack = Arc::new(ReleaseAttack {
        target: Some(target),
        server_id: server,
    });

    run_for(attack, &ctx, Duration::from_millis(100)).await;

    let frames = sent_frames(&transport);
    assert_eq!(frames.len(), 1);
    let release = &frames[0];
    assert_eq!(release.message_type(), Some(DhcpMessageType::Release));
    assert_eq!(release.packet.ciaddr, target);
    assert_eq!(release.ip_src, target);
    assert_eq!(release.ip_dst, server);
    assert_eq!(release.packet.server_id(), Some(server));
}

#[tokio::test]
async fn test_decline_default_address() {
    let transport = transport();
    let ctx = context(AttackKind::Decline, transport.clone());
    let config = AttackConfig::from_request(AttackKind::Decline, None, &HashMap::new()).unwrap();

    run_for(build_attack(&config), &ctx, Duration::from_millis(300)).await;

    let frames = sent_frames(&transport);
    assert!(frames.len() >= 2);
    for frame in frames {
        assert_eq!(frame.message_type(), Some(DhcpMessageType::Decline));
        assert_eq!(frame.packet.requested_ip(), Some(DEFAULT_DECLINE_ADDRESS));
        assert_eq!(frame.ip_dst, Ipv4Addr::BROADCAST);
    }
}

#[tokio::test]
async fn test_send_failures_are_counted_not_fatal() {
    let transport = transport();
    transport.set_fail_sends(true);
    let ctx = context(AttackKind::Decline, transport.clone());
    let attack = Arc::new(DeclineAttack {
        address: Ipv4Addr::new(10, 0, 0, 9),
    });

    run_for(attack, &ctx, Duration::from_millis(300)).await;

    let metrics = ctx.stats.snapshot();
    assert_eq!(metrics.sent, 0);
    assert!(metrics.errors >= 2, "errors = {}", metrics.errors);
    assert!(ctx
        .log
        .snapshot()
        .iter()
        .any(|e| e.msg.starts_with("Failed to send")));
}

fn rogue_config() -> RogueServerConfig {
    RogueServerConfig {
        server_ip: Ipv4Addr::new(10, 9, 9, 1),
        gateway: Ipv4Addr::new(10, 9, 9, 1),
        dns: vec![Ipv4Addr::new(10, 9, 9, 53)],
        offered_ip: Ipv4Addr::new(10, 9, 9, 100),
        lease_time: 600,
        poll_timeout: Duration::from_millis(20),
        error_backoff: Duration::from_millis(20),
        ..RogueServerConfig::default()
    }
}

#[tokio::test]
async fn test_rogue_server_answers_discover() {
    let transport = transport();
    let client = MacAddr::new([0x02, 0x12, 0x34, 0x56, 0x78, 0x9a]);
    transport.push_inbound(discover_frame(client, 0x0bad_cafe).unwrap());

    let ctx = context(AttackKind::RogueServer, transport.clone());
    let attack = Arc::new(RogueServerAttack::new(rogue_config()));
    run_for(attack, &ctx, Duration::from_millis(150)).await;

    let frames = sent_frames(&transport);
    assert_eq!(frames.len(), 1);
    let offer = &frames[0];
    assert_eq!(offer.message_type(), Some(DhcpMessageType::Offer));
    assert_eq!(offer.eth_src, SERVER_MAC);
    assert_eq!(offer.eth_dst, client);
    assert_eq!(offer.ip_src, Ipv4Addr::new(10, 9, 9, 1));
    assert_eq!(offer.ip_dst, Ipv4Addr::BROADCAST);
    assert_eq!(offer.packet.xid, 0x0bad_cafe);
    assert_eq!(offer.packet.chaddr, client);
    assert_eq!(offer.packet.yiaddr, Ipv4Addr::new(10, 9, 9, 100));
    assert_eq!(offer.packet.server_id(), Some(Ipv4Addr::new(10, 9, 9, 1)));
    assert_eq!(offer.packet.routers(), &[Ipv4Addr::new(10, 9, 9, 1)]);
    assert_eq!(offer.packet.dns_servers(), &[Ipv4Addr::new(10, 9, 9, 53)]);
    assert_eq!(offer.packet.lease_time(), Some(600));

    assert_eq!(ctx.stats.snapshot().sent, 1);
    assert!(ctx
        .log
        .snapshot()
        .iter()
        .any(|e| e.source == LogSource::Attack(AttackKind::RogueServer)));
}

#[tokio::test]
async fn test_rogue_server_ignores_own_offers() {
    let transport = transport();
    let attack = RogueServerAttack::new(rogue_config());
    let discover = DhcpFrame::parse(&discover_frame(MacAddr::random(), 1).unwrap()).unwrap();
    let offer = super::frame::offer_frame(
        SERVER_MAC,
        rogue_config().server_ip,
        &attack.offer_for(&discover.packet),
    )
    .unwrap();
    transport.push_inbound(offer);

    let ctx = context(AttackKind::RogueServer, transport.clone());
    run_for(Arc::new(attack), &ctx, Duration::from_millis(80)).await;

    assert_eq!(transport.sent_count(), 0);
    assert_eq!(transport.pending_inbound(), 1);
}

#[tokio::test]
async fn test_rogue_server_backs_off_on_receive_error() {
    let transport = transport();
    transport.set_fail_receives(true);
    let ctx = context(AttackKind::RogueServer, transport.clone());

    run_for(
        Arc::new(RogueServerAttack::new(rogue_config())),
        &ctx,
        Duration::from_millis(100),
    )
    .await;

    let metrics = ctx.stats.snapshot();
    assert_eq!(metrics.sent, 0);
    assert!(metrics.errors >= 1);
    // 20ms back-off bounds the retry rate
    assert!(metrics.errors <= 10, "errors = {}", metrics.errors);
}

#[test]
fn test_build_attack_kinds() {
    let none = HashMap::new();
    for kind in AttackKind::ALL {
        let config = AttackConfig::from_request(kind, Some("10.0.0.7"), &none).unwrap();
        let attack = build_attack(&config);
        assert_eq!(attack.kind(), kind);
        assert!(!attack.name().is_empty());
    }
}
