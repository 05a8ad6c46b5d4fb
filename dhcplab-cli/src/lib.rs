//! Command line front-end for dhcplab
//!
//! Argument parsing lives in [`args`]; [`run`] executes a parsed command
//! line against an attack engine.

pub mod args;
pub mod run;

pub use args::{Cli, Commands};
