//! Telnet remote control server for dhcplab
//!
//! A plain line protocol for starting, stopping and watching attacks on a
//! running [`dhcplab_attack::AttackEngine`].
//!
//! # Security Warning
//!
//! The server transmits data in plain text and gives full control over the
//! attack engine. Bind it to loopback or a trusted management network only.

mod command;
pub mod server;

pub use command::{Command, CommandParser};
pub use server::TelnetServer;
