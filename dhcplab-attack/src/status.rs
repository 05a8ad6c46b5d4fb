//! Read-only status projection

use chrono::{DateTime, Utc};
use dhcplab_core::{AttackKind, AttackMetrics, LogEntry};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Liveness and counters of one registered attack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AttackStatus {
    pub running: bool,
    pub metrics: AttackMetrics,
    /// When the current run was started; text views only
    #[serde(skip)]
    pub started_at: DateTime<Utc>,
}

/// Point-in-time view of the engine
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    /// Registered attacks by kind
    pub attacks: BTreeMap<AttackKind, AttackStatus>,
    /// Activity log, oldest first
    pub logs: Vec<LogEntry>,
}

impl StatusSnapshot {
    pub fn get(&self, kind: AttackKind) -> Option<&AttackStatus> {
        self.attacks.get(&kind)
    }

    pub fn running_count(&self) -> usize {
        self.attacks.values().filter(|s| s.running).count()
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| format!("{{\"error\":\"{}\"}}", e))
    }

    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("{{\"error\":\"{}\"}}", e))
    }
}

impl fmt::Display for StatusSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.attacks.is_empty() {
            writeln!(f, "No attacks registered")?;
        }
        for (kind, status) in &self.attacks {
            writeln!(
                f,
                "  {:<14} {:<8} since {} sent={:<8} errors={}",
                kind.as_str(),
                if status.running { "RUNNING" } else { "EXITED" },
                status.started_at.format("%H:%M:%S"),
                status.metrics.sent,
                status.metrics.errors
            )?;
        }
        Ok(())
    }
}
