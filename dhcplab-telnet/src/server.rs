//! Telnet server for remote administration

use crate::command::{Command, CommandParser};
use dhcplab_attack::{AttackEngine, ReconResult};
use dhcplab_core::{AttackKind, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

/// Default control port
pub const DEFAULT_PORT: u16 = 12000;

const PROMPT: &[u8] = b"dhcplab> ";

/// Longest command line accepted; longer input ends the session
pub const MAX_LINE_LEN: usize = 4096;

const BANNER: &str = "\r
================================================================\r
    dhcplab - DHCP attack and test harness\r
    Remote control interface\r
\r
    WARNING: This interface transmits in PLAIN TEXT!\r
             Use only on trusted networks!\r
================================================================\r
\r
Type 'help' for available commands.\r
\r
";

/// Telnet server for remote administration
pub struct TelnetServer {
    /// Port to listen on
    port: u16,
    /// Bind address
    bind_addr: String,
    engine: Arc<AttackEngine>,
    /// Connected client count
    client_count: Arc<AtomicUsize>,
}

impl TelnetServer {
    /// Create a server controlling `engine`, bound to loopback
    pub fn new(engine: Arc<AttackEngine>, port: u16) -> Self {
        Self {
            port,
            bind_addr: "127.0.0.1".to_string(),
            engine,
            client_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Set the bind address
    pub fn with_bind_addr(mut self, addr: String) -> Self {
        self.bind_addr = addr;
        self
    }

    pub fn engine(&self) -> Arc<AttackEngine> {
        Arc::clone(&self.engine)
    }

    pub fn client_count(&self) -> usize {
        self.client_count.load(Ordering::Relaxed)
    }

    /// Bind and serve until the task is dropped
    pub async fn start(&self) -> Result<()> {
        let addr = format!("{}:{}", self.bind_addr, self.port);
        let listener = TcpListener::bind(&addr).await?;

        info!("dhcplab control server listening on {}", addr);
        warn!("Telnet transmits in plain text. Use only on trusted networks!");

        self.serve(listener).await
    }

    /// Accept connections on an already bound listener
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        loop {
            match listener.accept().await {
                Ok((socket, peer_addr)) => {
                    info!("New connection from: {}", peer_addr);
                    self.client_count.fetch_add(1, Ordering::Relaxed);

                    let engine = Arc::clone(&self.engine);
                    let client_count = Arc::clone(&self.client_count);

                    tokio::spawn(async move {
                        let (reader, writer) = socket.into_split();
                        let peer = peer_addr.to_string();
                        if let Err(e) =
                            Self::handle_client(BufReader::new(reader), writer, &peer, &engine)
                                .await
                        {
                            error!("Error handling client {}: {}", peer, e);
                        }
                        client_count.fetch_sub(1, Ordering::Relaxed);
                        info!("Client {} disconnected", peer);
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            }
        }
    }

    /// Run one session until the client exits or disconnects
    pub async fn handle_client<R, W>(
        mut reader: R,
        mut writer: W,
        peer: &str,
        engine: &AttackEngine,
    ) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        writer.write_all(BANNER.as_bytes()).await?;

        let mut line = String::new();
        loop {
            writer.write_all(PROMPT).await?;
            writer.flush().await?;

            line.clear();
            let limit = MAX_LINE_LEN as u64 + 1;
            match (&mut reader).take(limit).read_line(&mut line).await {
                Ok(0) => {
                    debug!("Client {} closed connection", peer);
                    break;
                }
                Ok(n) if n > MAX_LINE_LEN => {
                    warn!("Client {} sent a line over {} bytes", peer, MAX_LINE_LEN);
                    writer.write_all(b"Error: line too long\r\n").await?;
                    writer.flush().await?;
                    break;
                }
                Ok(_) => {
                    let command_str = line.trim();
                    if command_str.is_empty() {
                        continue;
                    }
                    debug!("Client {} command: {}", peer, command_str);

                    let (reply, should_exit) = match CommandParser::parse(command_str) {
                        Ok(command) => Self::execute_command(command, engine).await,
                        Err(e) => (format!("Error: {}\r\n", e), false),
                    };
                    writer.write_all(reply.as_bytes()).await?;
                    if should_exit {
                        writer.flush().await?;
                        break;
                    }
                }
                Err(e) => {
                    error!("Error reading from client {}: {}", peer, e);
                    break;
                }
            }
        }

        Ok(())
    }

    /// Execute a command, returning the reply text and whether to hang up
    pub async fn execute_command(command: Command, engine: &AttackEngine) -> (String, bool) {
        let reply = match command {
            Command::Help => CommandParser::help_text().replace('\n', "\r\n"),
            Command::ListAttacks => Self::cmd_list_attacks(),
            Command::Start {
                attack_type,
                interface,
                target,
                options,
            } => {
                let (accepted, message) =
                    engine.start_attack(&attack_type, &interface, target.as_deref(), &options);
                Self::outcome(accepted, &message)
            }
            Command::Stop { attack_type } => {
                let (accepted, message) = engine.stop_attack(&attack_type);
                Self::outcome(accepted, &message)
            }
            Command::Status { json } => {
                let status = engine.get_status();
                if json {
                    format!("{}\r\n", status.to_json())
                } else {
                    format!(
                        "Attacks ({} running):\r\n{}",
                        status.running_count(),
                        status.to_string().replace('\n', "\r\n")
                    )
                }
            }
            Command::Logs { limit } => {
                let entries = engine.log().snapshot();
                let skip = limit.map_or(0, |n| entries.len().saturating_sub(n));
                if entries.is_empty() {
                    "No log entries.\r\n".to_string()
                } else {
                    entries
                        .iter()
                        .skip(skip)
                        .map(|entry| format!("{}\r\n", entry))
                        .collect()
                }
            }
            Command::Recon { interface } => Self::cmd_recon(engine, &interface).await,
            Command::StopAll => {
                let stopped = engine.stop_all();
                format!("Stopped {} attack(s).\r\n", stopped.len())
            }
            Command::Exit => return ("Goodbye!\r\n".to_string(), true),
        };
        (reply, false)
    }

    fn outcome(accepted: bool, message: &str) -> String {
        if accepted {
            format!("OK: {}\r\n", message)
        } else {
            format!("Error: {}\r\n", message)
        }
    }

    fn cmd_list_attacks() -> String {
        let mut out = String::from("Attack types:\r\n");
        for kind in AttackKind::ALL {
            out.push_str(&format!(
                "  {:<14} {}{}\r\n",
                kind.as_str(),
                kind.description(),
                if kind.requires_target() {
                    " (target required)"
                } else {
                    ""
                }
            ));
        }
        out
    }

    async fn cmd_recon(engine: &AttackEngine, interface: &str) -> String {
        match engine.run_recon(interface).await {
            ReconResult::Found {
                server_mac,
                server_ip,
                offered_ip,
            } => format!(
                "DHCP server found:\r\n  MAC:     {}\r\n  IP:      {}\r\n  Offered: {}\r\n",
                server_mac, server_ip, offered_ip
            ),
            other => {
                let json = serde_json::to_string(&other).unwrap_or_default();
                format!("{}\r\n", json)
            }
        }
    }
}
