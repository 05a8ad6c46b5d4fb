//! Attack engine
//!
//! The `AttackEngine` is the entry point for launching and managing attacks.
//! It owns the registry (at most one run per attack kind), the per-kind
//! metrics and the shared activity log, and hands tasks only the pieces
//! they need.
//!
//! `start`, `stop` and `status` never await: they take a registry shard
//! lock, do their bookkeeping and return. Tasks are cancelled cooperatively
//! and a stopped task is detached rather than joined.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use dhcplab_core::{ActivityLog, AttackContext, AttackKind, Error, Result, Transport};
use dhcplab_protocols::dhcp::{build_attack, AttackConfig};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::executor::{AttackExecutor, AttackRun};
use crate::metrics::MetricsStore;
use crate::recon::{recon, ReconResult};
use crate::status::{AttackStatus, StatusSnapshot};

/// Registry and lifecycle of attack runs
pub struct AttackEngine {
    config: EngineConfig,
    transport: Arc<dyn Transport>,
    runs: DashMap<AttackKind, AttackRun>,
    metrics: MetricsStore,
    log: Arc<ActivityLog>,
}

impl AttackEngine {
    /// Create an engine with default settings
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_config(transport, EngineConfig::default())
    }

    pub fn with_config(transport: Arc<dyn Transport>, config: EngineConfig) -> Self {
        info!(transport = transport.name(), "Creating attack engine");
        Self {
            log: Arc::new(ActivityLog::new(config.log_capacity)),
            config,
            transport,
            runs: DashMap::new(),
            metrics: MetricsStore::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Shared activity log
    pub fn log(&self) -> &Arc<ActivityLog> {
        &self.log
    }

    /// Start an attack of `kind` on `interface`
    ///
    /// Options are validated before anything is spawned. A kind whose
    /// previous task already exited on its own is not live and is replaced.
    ///
    /// # Errors
    ///
    /// `AlreadyRunning` if the kind has a live run, `InvalidOption` for a
    /// malformed target or an unknown, inapplicable or unparsable option.
    pub fn start(
        &self,
        kind: AttackKind,
        interface: &str,
        target: Option<&str>,
        options: &HashMap<String, String>,
    ) -> Result<Uuid> {
        let mut config = AttackConfig::from_request(kind, target, options)?;
        if let AttackConfig::RogueServer(rogue) = &mut config {
            rogue.poll_timeout = self.config.rogue_poll_timeout;
            rogue.error_backoff = self.config.rogue_error_backoff;
        }

        // the entry guard covers the liveness check through the insert
        let id = match self.runs.entry(kind) {
            Entry::Occupied(mut entry) => {
                if !entry.get().is_finished() {
                    warn!(attack = %kind, id = %entry.get().id, "Attack already running");
                    return Err(Error::AlreadyRunning(kind));
                }
                debug!(attack = %kind, id = %entry.get().id, "Replacing exited run");
                let run = self.spawn(&config, interface);
                let id = run.id;
                entry.insert(run);
                id
            }
            Entry::Vacant(entry) => {
                let run = self.spawn(&config, interface);
                let id = run.id;
                entry.insert(run);
                id
            }
        };

        self.log
            .system(format!("Started {} attack on {}", kind, interface));
        Ok(id)
    }

    fn spawn(&self, config: &AttackConfig, interface: &str) -> AttackRun {
        let kind = config.kind();
        let context = AttackContext {
            kind,
            interface: interface.to_string(),
            running: Arc::new(AtomicBool::new(true)),
            stats: self.metrics.reset(kind),
            log: Arc::clone(&self.log),
            transport: Arc::clone(&self.transport),
        };
        AttackExecutor::new().execute(build_attack(config), context)
    }

    /// Stop the run of `kind`
    ///
    /// The entry is removed immediately; the task sees the cleared flag at
    /// its next check and is not waited for.
    pub fn stop(&self, kind: AttackKind) -> Result<()> {
        let (_, run) = self.runs.remove(&kind).ok_or(Error::NotRunning(kind))?;
        run.signal_stop();
        info!(attack = %kind, id = %run.id, "Attack stopped");
        self.log.system(format!("Stopped {} attack", kind));
        Ok(())
    }

    /// Stop every registered run, returning the kinds that were stopped
    pub fn stop_all(&self) -> Vec<AttackKind> {
        let kinds: Vec<AttackKind> = self.runs.iter().map(|entry| *entry.key()).collect();
        kinds
            .into_iter()
            .filter(|kind| self.stop(*kind).is_ok())
            .collect()
    }

    /// Stop every run and wait up to `grace` for each task to exit
    pub async fn shutdown(&self, grace: Duration) {
        let kinds: Vec<AttackKind> = self.runs.iter().map(|entry| *entry.key()).collect();
        let runs: Vec<AttackRun> = kinds
            .into_iter()
            .filter_map(|kind| self.runs.remove(&kind).map(|(_, run)| run))
            .collect();

        if runs.is_empty() {
            return;
        }
        info!(count = runs.len(), "Shutting down attacks");
        for run in &runs {
            run.signal_stop();
            self.log.system(format!("Stopped {} attack", run.kind));
        }

        for run in runs {
            let (kind, id) = (run.kind, run.id);
            if tokio::time::timeout(grace, run.join()).await.is_err() {
                warn!(attack = %kind, id = %id, "Attack did not exit within grace period");
            }
        }
    }

    /// Registered runs whose task is still alive
    pub fn active_count(&self) -> usize {
        self.runs.iter().filter(|entry| !entry.is_finished()).count()
    }

    /// Whether `kind` has a live run
    pub fn is_running(&self, kind: AttackKind) -> bool {
        self.runs.get(&kind).is_some_and(|run| !run.is_finished())
    }

    /// Snapshot of every registered run and the activity log
    pub fn status(&self) -> StatusSnapshot {
        let attacks: BTreeMap<AttackKind, AttackStatus> = self
            .runs
            .iter()
            .map(|entry| {
                let kind = *entry.key();
                let status = AttackStatus {
                    running: !entry.is_finished(),
                    metrics: self.metrics.snapshot(kind),
                    started_at: entry.started_at,
                };
                (kind, status)
            })
            .collect();

        StatusSnapshot {
            attacks,
            logs: self.log.snapshot(),
        }
    }

    /// Probe `interface` for a DHCP server
    pub async fn recon(&self, interface: &str) -> ReconResult {
        recon(self.transport.as_ref(), interface, self.config.recon_timeout).await
    }

    /// Start by attack name, reporting `(accepted, message)`
    pub fn start_attack(
        &self,
        attack_type: &str,
        interface: &str,
        target_ip: Option<&str>,
        options: &HashMap<String, String>,
    ) -> (bool, String) {
        let result = attack_type
            .parse::<AttackKind>()
            .and_then(|kind| self.start(kind, interface, target_ip, options).map(|_| kind));
        match result {
            Ok(kind) => (true, format!("Started {}", kind)),
            Err(e) => (false, e.to_string()),
        }
    }

    /// Stop by attack name, reporting `(accepted, message)`
    pub fn stop_attack(&self, attack_type: &str) -> (bool, String) {
        let result = attack_type
            .parse::<AttackKind>()
            .and_then(|kind| self.stop(kind).map(|_| kind));
        match result {
            Ok(kind) => (true, format!("Stopped {}", kind)),
            Err(e) => (false, e.to_string()),
        }
    }

    pub fn get_status(&self) -> StatusSnapshot {
        self.status()
    }

    pub async fn run_recon(&self, interface: &str) -> ReconResult {
        self.recon(interface).await
    }
}

impl Drop for AttackEngine {
    fn drop(&mut self) {
        for entry in self.runs.iter() {
            entry.signal_stop();
        }
    }
}
