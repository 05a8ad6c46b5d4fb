//! Command execution

use crate::args::{options_map, Cli, Commands};
use anyhow::{bail, Context};
use dhcplab_attack::{AttackEngine, EngineConfig, ReconResult, StatusSnapshot};
use dhcplab_core::{AttackKind, Transport};
use dhcplab_telnet::TelnetServer;
use dhcplab_transport::{list_interfaces, MemoryTransport, RawTransport};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Grace period for attack tasks on shutdown
const SHUTDOWN_GRACE: Duration = Duration::from_secs(3);

fn transport(dry_run: bool) -> Arc<dyn Transport> {
    if dry_run {
        info!("Dry run: frames stay in memory");
        Arc::new(MemoryTransport::new())
    } else {
        Arc::new(RawTransport::new())
    }
}

/// Execute a parsed command line
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let json = cli.json;
    match cli.command {
        Commands::Interfaces => interfaces(json),
        Commands::Recon {
            interface,
            timeout,
            dry_run,
        } => recon(&interface, Duration::from_secs(timeout), dry_run, json).await,
        Commands::Attack {
            attack_type,
            interface,
            target,
            options,
            duration,
            dry_run,
        } => {
            let kind: AttackKind = attack_type.parse()?;
            let engine = AttackEngine::new(transport(dry_run));
            engine.start(kind, &interface, target.as_deref(), &options_map(&options))?;
            println!("Started {} on {} (Ctrl-C to stop)", kind, interface);

            watch(&engine, kind, duration.map(Duration::from_secs), json).await;
            let last = engine.get_status();
            engine.shutdown(SHUTDOWN_GRACE).await;
            println!("Stopped {}", kind);
            print_status(&last, json);
            Ok(())
        }
        Commands::Daemon {
            port,
            bind,
            dry_run,
        } => {
            let engine = Arc::new(AttackEngine::new(transport(dry_run)));
            let server = TelnetServer::new(Arc::clone(&engine), port).with_bind_addr(bind.clone());
            println!("Remote control on {}:{} (Ctrl-C to stop)", bind, port);

            tokio::select! {
                result = server.start() => {
                    result.with_context(|| format!("control server on {}:{} failed", bind, port))?;
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted, stopping attacks");
                }
            }
            engine.shutdown(SHUTDOWN_GRACE).await;
            Ok(())
        }
    }
}

fn interfaces(json: bool) -> anyhow::Result<()> {
    let interfaces = list_interfaces()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&interfaces)?);
        return Ok(());
    }

    println!("{:<16} {:<18} {:<5} IPv4", "NAME", "MAC", "UP");
    for iface in interfaces {
        println!(
            "{:<16} {:<18} {:<5} {}",
            iface.name,
            iface
                .mac
                .map(|m| m.to_string())
                .unwrap_or_else(|| "-".to_string()),
            if iface.is_up { "yes" } else { "no" },
            iface.ipv4.join(", ")
        );
    }
    Ok(())
}

async fn recon(interface: &str, timeout: Duration, dry_run: bool, json: bool) -> anyhow::Result<()> {
    let config = EngineConfig::default().with_recon_timeout(timeout);
    let engine = AttackEngine::with_config(transport(dry_run), config);
    let result = engine.run_recon(interface).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        match &result {
            ReconResult::Found {
                server_mac,
                server_ip,
                offered_ip,
            } => {
                println!("DHCP server found on {}", interface);
                println!("  MAC:     {}", server_mac);
                println!("  IP:      {}", server_ip);
                println!("  Offered: {}", offered_ip);
            }
            ReconResult::NoServer => println!("{}", dhcplab_attack::NO_SERVER_FOUND),
            ReconResult::Error(_) => {}
        }
    }

    if let ReconResult::Error(e) = result {
        bail!("recon on {} failed: {}", interface, e);
    }
    Ok(())
}

/// Print status once a second until Ctrl-C, the deadline or the task exits
async fn watch(engine: &AttackEngine, kind: AttackKind, duration: Option<Duration>, json: bool) {
    let deadline = async {
        match duration {
            Some(d) => tokio::time::sleep(d).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
            _ = &mut deadline => break,
            _ = ticker.tick() => {
                print_status(&engine.get_status(), json);
                if !engine.is_running(kind) {
                    break;
                }
            }
        }
    }
}

fn print_status(status: &StatusSnapshot, json: bool) {
    if json {
        println!("{}", status.to_json());
        return;
    }

    print!("{}", status);
    for entry in status.logs.iter().rev().take(3).rev() {
        println!("    {}", entry);
    }
}
