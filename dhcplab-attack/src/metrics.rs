//! Per-kind attack counters

use dashmap::DashMap;
use dhcplab_core::{AttackKind, AttackMetrics, AttackStatsCounters};
use std::sync::Arc;

/// Counters for every kind that has been started at least once
///
/// Each start installs a fresh counter set, so a task detached by an
/// earlier stop keeps writing into its own orphaned counters and never
/// into the new run's.
#[derive(Debug, Default)]
pub struct MetricsStore {
    counters: DashMap<AttackKind, Arc<AttackStatsCounters>>,
}

impl MetricsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install zeroed counters for `kind` and return them
    pub fn reset(&self, kind: AttackKind) -> Arc<AttackStatsCounters> {
        let counters = Arc::new(AttackStatsCounters::default());
        self.counters.insert(kind, Arc::clone(&counters));
        counters
    }

    pub fn get(&self, kind: AttackKind) -> Option<AttackMetrics> {
        self.counters.get(&kind).map(|c| c.snapshot())
    }

    /// Current values, zero for kinds never started
    pub fn snapshot(&self, kind: AttackKind) -> AttackMetrics {
        self.get(kind).unwrap_or_default()
    }
}
