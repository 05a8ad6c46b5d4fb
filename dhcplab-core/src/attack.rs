//! Attack traits and types

use crate::{ActivityLog, AttackKind, MacAddr, Result, Transport};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Attack trait that all attacks must implement
#[async_trait]
pub trait Attack: Send + Sync {
    /// Execute the attack
    ///
    /// Runs until the context's running flag is cleared or the attack
    /// decides it cannot proceed. Transport failures are counted and
    /// logged inside the loop, never returned.
    async fn execute(&self, ctx: AttackContext) -> Result<()>;

    /// Which kind of attack this is
    fn kind(&self) -> AttackKind;

    /// Get attack name
    fn name(&self) -> &str;
}

/// Snapshot of an attack's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AttackMetrics {
    pub sent: u64,
    pub errors: u64,
}

/// Thread-safe attack statistics counters
#[derive(Debug, Default)]
pub struct AttackStatsCounters {
    pub sent: AtomicU64,
    pub errors: AtomicU64,
}

impl AttackStatsCounters {
    /// Count one successful send, returning the new total
    pub fn increment_sent(&self) -> u64 {
        self.sent.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Count one failure, returning the new total
    pub fn increment_errors(&self) -> u64 {
        self.errors.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn reset(&self) {
        self.sent.store(0, Ordering::Relaxed);
        self.errors.store(0, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> AttackMetrics {
        AttackMetrics {
            sent: self.sent.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// Attack context passed to the execute method
///
/// Holds only what the task needs: its cancellation flag, its own counters
/// and handles to the shared log and transport. Registry entries stay with
/// the engine.
#[derive(Clone)]
pub struct AttackContext {
    /// Kind of the attack this context belongs to
    pub kind: AttackKind,
    /// Interface to send packets on
    pub interface: String,
    /// Running flag (attack should stop when this is false)
    pub running: Arc<AtomicBool>,
    /// Statistics counters
    pub stats: Arc<AttackStatsCounters>,
    /// Shared activity log
    pub log: Arc<ActivityLog>,
    /// Frame transport
    pub transport: Arc<dyn Transport>,
}

impl AttackContext {
    /// Check if the attack should continue running
    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Append an entry to the activity log under this attack's name
    pub fn log<M: Into<String>>(&self, msg: M) {
        self.log.push(self.kind, msg);
    }

    /// Append a lifecycle entry
    pub fn log_system<M: Into<String>>(&self, msg: M) {
        self.log.system(msg);
    }

    /// Sleep between iterations; a zero delay still yields to the scheduler
    pub async fn pause(&self, delay: Duration) {
        if delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(delay).await;
        }
    }

    /// Send a frame, updating counters and the activity log
    ///
    /// `actor` is the hardware address the frame claims to come from;
    /// `what` names the message for the log. Returns whether the send
    /// succeeded.
    pub async fn send_frame(&self, frame: &[u8], actor: MacAddr, what: &str) -> bool {
        match self.transport.send(&self.interface, frame).await {
            Ok(()) => {
                let sent = self.stats.increment_sent();
                debug!(
                    attack = %self.kind,
                    interface = %self.interface,
                    size = frame.len(),
                    mac = %actor,
                    "Frame sent"
                );
                let every = self.kind.log_every().max(1);
                if (sent - 1) % every == 0 {
                    self.log(format!("Sent {} from {} (total {})", what, actor, sent));
                }
                true
            }
            Err(e) => {
                self.record_error(&format!("Failed to send {}: {}", what, e));
                false
            }
        }
    }

    /// Count and log a failure without stopping the loop
    ///
    /// Every failure is counted; only the first and then every
    /// `log_every`-th reach the activity log, so a failing interface cannot
    /// crowd out lifecycle entries.
    pub fn record_error(&self, message: &str) {
        let errors = self.stats.increment_errors();
        let every = self.kind.log_every().max(1);
        if (errors - 1) % every != 0 {
            debug!(attack = %self.kind, message = message, "Attack error");
            return;
        }
        warn!(
            attack = %self.kind,
            interface = %self.interface,
            errors = errors,
            message = message,
            "Attack error"
        );
        if errors == 1 {
            self.log(message);
        } else {
            self.log(format!("{} (errors {})", message, errors));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let counters = AttackStatsCounters::default();
        assert_eq!(counters.increment_sent(), 1);
        assert_eq!(counters.increment_sent(), 2);
        assert_eq!(counters.increment_errors(), 1);
        assert_eq!(counters.snapshot(), AttackMetrics { sent: 2, errors: 1 });

        counters.reset();
        assert_eq!(counters.snapshot(), AttackMetrics::default());
    }

    struct DownTransport;

    #[async_trait]
    impl Transport for DownTransport {
        async fn send(&self, interface: &str, _frame: &[u8]) -> Result<()> {
            Err(crate::Error::transport(format!("{} is down", interface)))
        }

        async fn send_and_await_reply(
            &self,
            interface: &str,
            _frame: &[u8],
            _filter: &crate::FrameFilter,
            _timeout: Duration,
        ) -> Result<Option<Vec<u8>>> {
            Err(crate::Error::transport(format!("{} is down", interface)))
        }

        async fn receive_matching(
            &self,
            _interface: &str,
            _filter: &crate::FrameFilter,
            _timeout: Duration,
        ) -> Result<Option<Vec<u8>>> {
            Ok(None)
        }

        async fn hardware_address(&self, interface: &str) -> Result<MacAddr> {
            Err(crate::Error::transport(format!("{} is down", interface)))
        }

        fn name(&self) -> &str {
            "down"
        }
    }

    #[tokio::test]
    async fn test_send_failures_are_sampled_in_log() {
        let log = Arc::new(ActivityLog::new(100));
        let ctx = AttackContext {
            kind: AttackKind::Flood,
            interface: "eth0".to_string(),
            running: Arc::new(AtomicBool::new(true)),
            stats: Arc::new(AttackStatsCounters::default()),
            log: Arc::clone(&log),
            transport: Arc::new(DownTransport),
        };

        let every = AttackKind::Flood.log_every();
        for _ in 0..(every * 3) {
            assert!(!ctx.send_frame(&[0u8; 60], MacAddr::zero(), "DISCOVER").await);
        }

        assert_eq!(ctx.stats.snapshot().errors, every * 3);
        let entries = log.snapshot();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].msg, "Failed to send DISCOVER: Transport error: eth0 is down");
        assert!(entries[1].msg.ends_with(&format!("(errors {})", every + 1)));
    }

    #[test]
    fn test_metrics_json() {
        let json = serde_json::to_value(AttackMetrics { sent: 7, errors: 2 }).unwrap();
        assert_eq!(json["sent"], 7);
        assert_eq!(json["errors"], 2);
    }
}
