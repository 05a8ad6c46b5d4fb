//! Engine configuration

use dhcplab_core::DEFAULT_LOG_CAPACITY;
use std::time::Duration;

/// Tunables for [`crate::AttackEngine`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Entries kept in the activity log
    pub log_capacity: usize,
    /// How long recon waits for an OFFER
    pub recon_timeout: Duration,
    /// Rogue server receive poll; bounds how long a stop takes to be observed
    pub rogue_poll_timeout: Duration,
    /// Rogue server pause after a receive failure
    pub rogue_error_backoff: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_capacity: DEFAULT_LOG_CAPACITY,
            recon_timeout: Duration::from_secs(3),
            rogue_poll_timeout: Duration::from_secs(1),
            rogue_error_backoff: Duration::from_secs(1),
        }
    }
}

impl EngineConfig {
    pub fn with_recon_timeout(mut self, timeout: Duration) -> Self {
        self.recon_timeout = timeout;
        self
    }

    pub fn with_log_capacity(mut self, capacity: usize) -> Self {
        self.log_capacity = capacity;
        self
    }

    pub fn with_rogue_timing(mut self, poll_timeout: Duration, error_backoff: Duration) -> Self {
        self.rogue_poll_timeout = poll_timeout;
        self.rogue_error_backoff = error_backoff;
        self
    }
}
