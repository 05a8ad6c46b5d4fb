//! In-memory transport
//!
//! Frames never touch the network. Sends are recorded (the most recent
//! [`MemoryTransport::RECORD_LIMIT`] are kept), inbound frames come from
//! [`MemoryTransport::push_inbound`] or from a responder closure that sees
//! every sent frame.

use async_trait::async_trait;
use dhcplab_core::{Error, FrameFilter, MacAddr, Result, Transport};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::trace;

/// A frame handed to [`MemoryTransport::send`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentFrame {
    pub interface: String,
    pub frame: Vec<u8>,
}

type Responder = Arc<dyn Fn(&[u8]) -> Option<Vec<u8>> + Send + Sync>;

pub struct MemoryTransport {
    hardware_address: Option<MacAddr>,
    sent: Mutex<VecDeque<SentFrame>>,
    sent_total: AtomicU64,
    inbound: Mutex<VecDeque<Vec<u8>>>,
    arrived: Notify,
    fail_sends: AtomicBool,
    fail_receives: AtomicBool,
    responder: Mutex<Option<Responder>>,
}

impl MemoryTransport {
    /// Most recent sent frames kept for inspection
    pub const RECORD_LIMIT: usize = 10_000;

    pub fn new() -> Self {
        Self {
            hardware_address: Some(MacAddr::new([0x02, 0x00, 0x00, 0x00, 0x00, 0x01])),
            sent: Mutex::new(VecDeque::new()),
            sent_total: AtomicU64::new(0),
            inbound: Mutex::new(VecDeque::new()),
            arrived: Notify::new(),
            fail_sends: AtomicBool::new(false),
            fail_receives: AtomicBool::new(false),
            responder: Mutex::new(None),
        }
    }

    /// Report `mac` as the interface address, or fail the lookup with `None`
    pub fn with_hardware_address(mut self, mac: Option<MacAddr>) -> Self {
        self.hardware_address = mac;
        self
    }

    /// Answer sent frames; a returned frame is queued as inbound
    pub fn with_responder<F>(self, responder: F) -> Self
    where
        F: Fn(&[u8]) -> Option<Vec<u8>> + Send + Sync + 'static,
    {
        *self.responder.lock() = Some(Arc::new(responder));
        self
    }

    /// Queue a frame for the next matching receive
    pub fn push_inbound(&self, frame: Vec<u8>) {
        self.inbound.lock().push_back(frame);
        self.arrived.notify_waiters();
    }

    pub fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::Relaxed);
    }

    pub fn set_fail_receives(&self, fail: bool) {
        self.fail_receives.store(fail, Ordering::Relaxed);
    }

    /// Recorded frames, oldest first
    pub fn sent(&self) -> Vec<SentFrame> {
        self.sent.lock().iter().cloned().collect()
    }

    /// Successful sends since creation, including ones no longer recorded
    pub fn sent_count(&self) -> u64 {
        self.sent_total.load(Ordering::Relaxed)
    }

    pub fn pending_inbound(&self) -> usize {
        self.inbound.lock().len()
    }

    fn take_matching(&self, filter: &FrameFilter) -> Option<Vec<u8>> {
        let mut inbound = self.inbound.lock();
        let pos = inbound.iter().position(|frame| filter.matches(frame))?;
        inbound.remove(pos)
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send(&self, interface: &str, frame: &[u8]) -> Result<()> {
        if self.fail_sends.load(Ordering::Relaxed) {
            return Err(Error::transport(format!("{} is down", interface)));
        }

        {
            let mut sent = self.sent.lock();
            if sent.len() == Self::RECORD_LIMIT {
                sent.pop_front();
            }
            sent.push_back(SentFrame {
                interface: interface.to_string(),
                frame: frame.to_vec(),
            });
        }
        self.sent_total.fetch_add(1, Ordering::Relaxed);
        trace!(interface = interface, size = frame.len(), "Frame recorded");

        let responder = self.responder.lock().clone();
        if let Some(reply) = responder.and_then(|respond| respond(frame)) {
            self.push_inbound(reply);
        }
        Ok(())
    }

    async fn send_and_await_reply(
        &self,
        interface: &str,
        frame: &[u8],
        filter: &FrameFilter,
        timeout: Duration,
    ) -> Result<Option<Vec<u8>>> {
        self.send(interface, frame).await?;
        self.receive_matching(interface, filter, timeout).await
    }

    async fn receive_matching(
        &self,
        interface: &str,
        filter: &FrameFilter,
        timeout: Duration,
    ) -> Result<Option<Vec<u8>>> {
        if self.fail_receives.load(Ordering::Relaxed) {
            return Err(Error::transport(format!("{} is down", interface)));
        }

        let deadline = Instant::now() + timeout;
        loop {
            // registered before the check so a push in between is not missed
            let arrived = self.arrived.notified();
            if let Some(frame) = self.take_matching(filter) {
                return Ok(Some(frame));
            }
            if tokio::time::timeout_at(deadline, arrived).await.is_err() {
                return Ok(None);
            }
        }
    }

    async fn hardware_address(&self, interface: &str) -> Result<MacAddr> {
        self.hardware_address
            .ok_or_else(|| Error::transport(format!("{} has no hardware address", interface)))
    }

    fn name(&self) -> &str {
        "memory"
    }
}
