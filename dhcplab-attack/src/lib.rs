//! Attack orchestration for dhcplab
//!
//! This crate owns every piece of mutable engine state:
//!
//! - `AttackEngine`: registry of running attacks (at most one per kind),
//!   start/stop/status, recon
//! - `AttackExecutor`: spawns one attack task and reports how it ended
//! - `MetricsStore`: per-kind counters, fresh on every start
//! - `StatusSnapshot` / `ReconResult`: the serializable views handed to callers
//!
//! # Example
//!
//! ```no_run
//! use dhcplab_attack::AttackEngine;
//! use dhcplab_transport::MemoryTransport;
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let engine = AttackEngine::new(Arc::new(MemoryTransport::new()));
//!
//!     let (accepted, message) = engine.start_attack("flood", "eth0", None, &HashMap::new());
//!     println!("{} {}", accepted, message);
//!
//!     tokio::time::sleep(std::time::Duration::from_secs(1)).await;
//!     println!("{}", engine.get_status().to_json_pretty());
//!
//!     engine.stop_attack("flood");
//! }
//! ```

pub mod config;
pub mod engine;
pub mod executor;
pub mod metrics;
pub mod recon;
pub mod status;

pub use config::EngineConfig;
pub use engine::AttackEngine;
pub use executor::{AttackExecutor, AttackRun};
pub use metrics::MetricsStore;
pub use recon::{recon, ReconResult, NO_SERVER_FOUND};
pub use status::{AttackStatus, StatusSnapshot};
