//! Attack executor
//!
//! Spawns one attack task and wraps it in an [`AttackRun`], the registry
//! entry the engine keeps for it. The task reports how it ended through
//! `tracing`; a failed run also leaves a System entry in the activity log.

use chrono::{DateTime, Utc};
use dhcplab_core::{Attack, AttackContext, AttackKind, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};
use uuid::Uuid;

/// A spawned attack task
#[derive(Debug)]
pub struct AttackRun {
    /// Unique run ID, for correlating log lines
    pub id: Uuid,
    pub kind: AttackKind,
    pub interface: String,
    pub started_at: DateTime<Utc>,
    running: Arc<AtomicBool>,
    task: JoinHandle<Result<()>>,
}

impl AttackRun {
    /// Whether the task has exited, for any reason
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Ask the task to stop at its next check; does not wait
    pub fn signal_stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    /// Stop and wait for the task to exit
    pub async fn join(self) -> Result<()> {
        self.signal_stop();
        match self.task.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => {
                error!(id = %self.id, attack = %self.kind, "Attack task panicked");
                Ok(())
            }
            Err(_) => Ok(()),
        }
    }
}

/// Executor for a single attack run
pub struct AttackExecutor {
    id: Uuid,
}

impl AttackExecutor {
    pub fn new() -> Self {
        Self { id: Uuid::now_v7() }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Spawn `attack` on the current tokio runtime
    pub fn execute(self, attack: Arc<dyn Attack>, context: AttackContext) -> AttackRun {
        let id = self.id;
        let kind = context.kind;
        let interface = context.interface.clone();
        let running = Arc::clone(&context.running);

        info!(
            id = %id,
            attack = %kind,
            name = attack.name(),
            interface = %interface,
            transport = context.transport.name(),
            "Starting attack"
        );

        let task = tokio::spawn(async move {
            let log = Arc::clone(&context.log);
            let result = attack.execute(context).await;

            match &result {
                Ok(()) => info!(id = %id, attack = %kind, "Attack task exited"),
                Err(e) => {
                    error!(id = %id, attack = %kind, error = %e, "Attack failed");
                    log.system(format!("{} attack failed: {}", kind, e));
                }
            }

            result
        });

        AttackRun {
            id,
            kind,
            interface,
            started_at: Utc::now(),
            running,
            task,
        }
    }
}

impl Default for AttackExecutor {
    fn default() -> Self {
        Self::new()
    }
}
