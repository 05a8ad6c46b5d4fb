//! Transport abstraction attack tasks and recon send through
//!
//! Raw-socket access is an external capability: the engine only ever calls
//! the `Transport` trait, and `dhcplab-transport` provides the raw datalink
//! and in-memory implementations.

use crate::{MacAddr, Result};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Predicate over raw Ethernet frames
#[derive(Clone)]
pub struct FrameFilter {
    name: String,
    predicate: Arc<dyn Fn(&[u8]) -> bool + Send + Sync>,
}

impl FrameFilter {
    /// Create a named filter
    pub fn new<N, F>(name: N, predicate: F) -> Self
    where
        N: Into<String>,
        F: Fn(&[u8]) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// Filter accepting every frame
    pub fn any() -> Self {
        Self::new("any", |_| true)
    }

    /// Test a frame against the filter
    #[inline]
    pub fn matches(&self, frame: &[u8]) -> bool {
        (self.predicate)(frame)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Both filters must match
    pub fn and(self, other: FrameFilter) -> Self {
        let name = format!("{} and {}", self.name, other.name);
        Self::new(name, move |frame| self.matches(frame) && other.matches(frame))
    }
}

impl fmt::Debug for FrameFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameFilter").field("name", &self.name).finish()
    }
}

/// Send and receive raw frames on a named interface
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one frame, fire-and-forget
    async fn send(&self, interface: &str, frame: &[u8]) -> Result<()>;

    /// Send one frame and wait up to `timeout` for the first matching reply
    ///
    /// `Ok(None)` means nothing matched in time.
    async fn send_and_await_reply(
        &self,
        interface: &str,
        frame: &[u8],
        filter: &FrameFilter,
        timeout: Duration,
    ) -> Result<Option<Vec<u8>>>;

    /// Wait up to `timeout` for the next frame matching `filter`
    ///
    /// Callers poll this in a loop so they can observe cancellation between
    /// polls; `Ok(None)` means the poll timed out.
    async fn receive_matching(
        &self,
        interface: &str,
        filter: &FrameFilter,
        timeout: Duration,
    ) -> Result<Option<Vec<u8>>>;

    /// Hardware address of the interface itself
    async fn hardware_address(&self, interface: &str) -> Result<MacAddr>;

    /// Short name for logging
    fn name(&self) -> &str;
}
