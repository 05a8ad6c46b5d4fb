//! CLI argument parsing

use clap::{ArgAction, Parser, Subcommand};
use std::collections::HashMap;

#[derive(Parser, Debug)]
#[command(name = "dhcplab")]
#[command(version, about = "DHCP protocol attack and test harness", long_about = None)]
pub struct Cli {
    /// Verbose output (-v, -vv, -vvv for increasing verbosity)
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List available network interfaces
    Interfaces,

    /// Look for a DHCP server on an interface
    Recon {
        /// Network interface name
        #[arg(short, long)]
        interface: String,

        /// Seconds to wait for an offer
        #[arg(long, value_name = "SECONDS", default_value_t = 3)]
        timeout: u64,

        /// Use the in-memory transport instead of the network
        #[arg(long)]
        dry_run: bool,
    },

    /// Run one attack until Ctrl-C or the duration elapses
    Attack {
        /// Attack type (starvation, nak, release, flood, decline, rogue_server)
        #[arg(value_name = "TYPE")]
        attack_type: String,

        /// Network interface name
        #[arg(short, long)]
        interface: String,

        /// Target IP address (required by nak and release)
        #[arg(short, long)]
        target: Option<String>,

        /// Attack options
        #[arg(short = 'o', long = "option", value_name = "KEY=VALUE", value_parser = parse_key_val)]
        options: Vec<(String, String)>,

        /// Stop after this many seconds
        #[arg(short, long, value_name = "SECONDS")]
        duration: Option<u64>,

        /// Use the in-memory transport instead of the network
        #[arg(long)]
        dry_run: bool,
    },

    /// Run the remote control server
    Daemon {
        /// Port for remote control
        #[arg(short, long, default_value_t = 12000)]
        port: u16,

        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,

        /// Use the in-memory transport instead of the network
        #[arg(long)]
        dry_run: bool,
    },
}

/// Parse a `key=value` argument
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("invalid option '{}': expected KEY=VALUE", s)),
    }
}

/// Later duplicates win
pub fn options_map(options: &[(String, String)]) -> HashMap<String, String> {
    options.iter().cloned().collect()
}

/// Default tracing filter for a verbosity count
pub fn log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}
