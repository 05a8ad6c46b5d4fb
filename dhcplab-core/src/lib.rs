//! dhcplab core library
//!
//! Fundamental types, traits and error handling shared by every crate of the
//! dhcplab DHCP attack harness: the attack kinds, the `Attack` trait and its
//! execution context, the transport abstraction tasks send through, and the
//! bounded activity log.

pub mod attack;
pub mod error;
pub mod log;
pub mod transport;
pub mod types;

// Re-export commonly used types
pub use attack::{Attack, AttackContext, AttackMetrics, AttackStatsCounters};
pub use error::{Error, Result};
pub use log::{ActivityLog, LogEntry, LogSource, DEFAULT_LOG_CAPACITY};
pub use transport::{FrameFilter, Transport};
pub use types::*;
