//! Long-lived receive side of a raw interface
//!
//! One capture thread per interface reads frames continuously into a
//! bounded backlog. Receivers take the first frame matching their filter,
//! so frames arriving between two polls are not lost.

use dhcplab_core::{Error, FrameFilter, Result};
use parking_lot::Mutex;
use pnet_datalink::DataLinkReceiver;
use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tokio::sync::Notify;
use tracing::{debug, error, info};

/// Frames kept while nobody is asking for them
pub const BACKLOG_LIMIT: usize = 1024;

/// Frames older than this are never handed out
pub const BACKLOG_AGE: Duration = Duration::from_secs(5);

/// Backlog and state shared between a capture thread and its receivers
#[derive(Debug)]
pub struct Capture {
    interface: String,
    backlog: Mutex<VecDeque<(Instant, Vec<u8>)>>,
    arrived: Notify,
    running: AtomicBool,
    failure: Mutex<Option<String>>,
}

impl Capture {
    pub fn new<S: Into<String>>(interface: S) -> Self {
        Self {
            interface: interface.into(),
            backlog: Mutex::new(VecDeque::new()),
            arrived: Notify::new(),
            running: AtomicBool::new(true),
            failure: Mutex::new(None),
        }
    }

    /// Start the reader thread for `rx`
    ///
    /// `rx` must have been opened with a read timeout so the thread can
    /// observe [`Capture::stop`].
    pub fn spawn(interface: &str, rx: Box<dyn DataLinkReceiver>) -> Result<Arc<Self>> {
        let capture = Arc::new(Self::new(interface));
        let worker = Arc::clone(&capture);

        thread::Builder::new()
            .name(format!("capture-{}", interface))
            .spawn(move || worker.run(rx))
            .map_err(|e| Error::transport(format!("Failed to start capture on {}: {}", interface, e)))?;

        info!(interface = %interface, "Capture started");
        Ok(capture)
    }

    fn run(&self, mut rx: Box<dyn DataLinkReceiver>) {
        while self.is_alive() {
            match rx.next() {
                Ok(frame) => self.push(frame.to_vec()),
                Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => {}
                Err(e) => {
                    error!(interface = %self.interface, "Packet capture error: {}", e);
                    self.fail(format!("Receive error on {}: {}", self.interface, e));
                    return;
                }
            }
        }
        debug!(interface = %self.interface, "Capture thread finished");
    }

    /// Whether the reader is still delivering frames
    pub fn is_alive(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Ask the reader thread to exit after its current read
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
        self.arrived.notify_waiters();
    }

    /// Mark the capture dead and wake every receiver
    pub fn fail<M: Into<String>>(&self, message: M) {
        *self.failure.lock() = Some(message.into());
        self.stop();
    }

    /// Append a captured frame, evicting stale or excess frames
    pub fn push(&self, frame: Vec<u8>) {
        let now = Instant::now();
        {
            let mut backlog = self.backlog.lock();
            while backlog.len() >= BACKLOG_LIMIT
                || backlog
                    .front()
                    .is_some_and(|(at, _)| now.duration_since(*at) > BACKLOG_AGE)
            {
                backlog.pop_front();
            }
            backlog.push_back((now, frame));
        }
        self.arrived.notify_waiters();
    }

    pub fn backlog_len(&self) -> usize {
        self.backlog.lock().len()
    }

    /// Remove the oldest fresh frame captured at or after `since` that matches
    fn take_matching(&self, filter: &FrameFilter, since: Option<Instant>) -> Option<Vec<u8>> {
        let now = Instant::now();
        let mut backlog = self.backlog.lock();
        let pos = backlog.iter().position(|(at, frame)| {
            now.duration_since(*at) <= BACKLOG_AGE
                && since.map_or(true, |since| *at >= since)
                && filter.matches(frame)
        })?;
        backlog.remove(pos).map(|(_, frame)| frame)
    }

    /// Wait until `deadline` for a frame matching `filter`
    ///
    /// With `since` set, frames captured before it are ignored. `Ok(None)`
    /// means the deadline passed; a dead capture reports its failure.
    pub async fn next_matching(
        &self,
        filter: &FrameFilter,
        since: Option<Instant>,
        deadline: Instant,
    ) -> Result<Option<Vec<u8>>> {
        loop {
            // registered before the check so a push in between still wakes us
            let notified = self.arrived.notified();

            if let Some(frame) = self.take_matching(filter, since) {
                return Ok(Some(frame));
            }
            if !self.is_alive() {
                let failure = self.failure.lock().clone();
                return Err(Error::transport(failure.unwrap_or_else(|| {
                    format!("Capture on {} stopped", self.interface)
                })));
            }
            if tokio::time::timeout_at(deadline.into(), notified).await.is_err() {
                return Ok(None);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn starts_with(byte: u8) -> FrameFilter {
        FrameFilter::new("first byte", move |frame| frame.first() == Some(&byte))
    }

    fn soon() -> Instant {
        Instant::now() + Duration::from_millis(200)
    }

    #[tokio::test]
    async fn test_frames_between_polls_are_kept() {
        let capture = Capture::new("eth0");
        capture.push(vec![1, 0]);
        capture.push(vec![2, 0]);
        capture.push(vec![1, 1]);

        let first = capture.next_matching(&starts_with(1), None, soon()).await.unwrap();
        assert_eq!(first, Some(vec![1, 0]));
        let second = capture.next_matching(&starts_with(1), None, soon()).await.unwrap();
        assert_eq!(second, Some(vec![1, 1]));

        // non-matching frames stay for other receivers
        assert_eq!(capture.backlog_len(), 1);
        let other = capture.next_matching(&starts_with(2), None, soon()).await.unwrap();
        assert_eq!(other, Some(vec![2, 0]));
    }

    #[tokio::test]
    async fn test_waiter_wakes_on_push() {
        let capture = Arc::new(Capture::new("eth0"));
        let pusher = Arc::clone(&capture);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            pusher.push(vec![7]);
        });

        let deadline = Instant::now() + Duration::from_secs(2);
        let frame = capture.next_matching(&starts_with(7), None, deadline).await.unwrap();
        assert_eq!(frame, Some(vec![7]));
    }

    #[tokio::test]
    async fn test_timeout_returns_none() {
        let capture = Capture::new("eth0");
        capture.push(vec![3]);
        let started = Instant::now();
        let frame = capture
            .next_matching(&starts_with(9), None, Instant::now() + Duration::from_millis(30))
            .await
            .unwrap();
        assert!(frame.is_none());
        assert!(started.elapsed() >= Duration::from_millis(25));
    }

    #[tokio::test]
    async fn test_since_skips_earlier_frames() {
        let capture = Capture::new("eth0");
        capture.push(vec![4, 0]);
        let since = Instant::now();
        capture.push(vec![4, 1]);

        let frame = capture.next_matching(&starts_with(4), Some(since), soon()).await.unwrap();
        assert_eq!(frame, Some(vec![4, 1]));
    }

    #[test]
    fn test_backlog_is_bounded() {
        let capture = Capture::new("eth0");
        for i in 0..(BACKLOG_LIMIT + 10) {
            capture.push(vec![(i % 256) as u8]);
        }
        assert_eq!(capture.backlog_len(), BACKLOG_LIMIT);
    }

    #[tokio::test]
    async fn test_failure_reaches_receivers() {
        let capture = Arc::new(Capture::new("eth0"));
        let failing = Arc::clone(&capture);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            failing.fail("Receive error on eth0: link down");
        });

        let deadline = Instant::now() + Duration::from_secs(2);
        let err = capture.next_matching(&starts_with(1), None, deadline).await.unwrap_err();
        assert!(err.to_string().contains("link down"));
        assert!(!capture.is_alive());
    }
}
