//! Raw Ethernet transport over pnet datalink channels
//!
//! pnet channels are blocking, so sends run on the blocking thread pool
//! through a sender cached per interface. The receive side of each
//! interface is a [`Capture`] thread opened on first use and kept until
//! it fails or the transport is dropped.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use dhcplab_core::{Error, FrameFilter, MacAddr, Result, Transport};
use parking_lot::Mutex;
use pnet_datalink::{Channel, Config, DataLinkReceiver, DataLinkSender};
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

use crate::capture::Capture;
use crate::interface::find_datalink_interface;

/// Longest single blocking read; bounds how long a stopped capture lingers
const READ_SLICE: Duration = Duration::from_millis(100);

type SharedSender = Arc<Mutex<Box<dyn DataLinkSender>>>;

/// Transport sending real frames on host interfaces
#[derive(Default)]
pub struct RawTransport {
    senders: Arc<DashMap<String, SharedSender>>,
    captures: Arc<DashMap<String, Arc<Capture>>>,
}

impl RawTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live capture for `interface`, opening one if needed
    async fn capture(&self, interface: &str) -> Result<Arc<Capture>> {
        let captures = Arc::clone(&self.captures);
        let interface = interface.to_string();

        blocking(move || match captures.entry(interface.clone()) {
            Entry::Occupied(entry) if entry.get().is_alive() => Ok(Arc::clone(entry.get())),
            entry => {
                let (_, rx) = open_channel(&interface, Some(READ_SLICE))?;
                let capture = Capture::spawn(&interface, rx)?;
                match entry {
                    Entry::Occupied(mut stale) => {
                        debug!(interface = %interface, "Reopening capture");
                        stale.insert(Arc::clone(&capture));
                    }
                    Entry::Vacant(vacant) => {
                        vacant.insert(Arc::clone(&capture));
                    }
                }
                Ok(capture)
            }
        })
        .await
    }

    /// Wait on the interface's capture, dropping it if it has failed
    async fn next_matching(
        &self,
        interface: &str,
        filter: &FrameFilter,
        since: Option<Instant>,
        deadline: Instant,
    ) -> Result<Option<Vec<u8>>> {
        let capture = self.capture(interface).await?;
        let result = capture.next_matching(filter, since, deadline).await;
        if result.is_err() {
            warn!(interface = %interface, "Capture failed; reopening on next receive");
            self.captures
                .remove_if(interface, |_, current| Arc::ptr_eq(current, &capture));
        }
        result
    }
}

impl Drop for RawTransport {
    fn drop(&mut self) {
        for capture in self.captures.iter() {
            capture.stop();
        }
    }
}

fn channel_error(interface: &str, e: io::Error) -> Error {
    if e.kind() == io::ErrorKind::PermissionDenied {
        Error::InsufficientPrivileges(format!(
            "opening a raw channel on {} requires root or CAP_NET_RAW",
            interface
        ))
    } else {
        Error::transport(format!("Failed to create channel on {}: {}", interface, e))
    }
}

fn open_channel(
    interface: &str,
    read_timeout: Option<Duration>,
) -> Result<(Box<dyn DataLinkSender>, Box<dyn DataLinkReceiver>)> {
    let iface = find_datalink_interface(interface)?;
    let config = Config {
        read_timeout,
        ..Default::default()
    };

    match pnet_datalink::channel(&iface, config) {
        Ok(Channel::Ethernet(tx, rx)) => Ok((tx, rx)),
        Ok(_) => Err(Error::transport("Unsupported channel type")),
        Err(e) => Err(channel_error(interface, e)),
    }
}

fn send_on(tx: &mut dyn DataLinkSender, frame: &[u8]) -> Result<()> {
    tx.send_to(frame, None)
        .ok_or_else(|| Error::transport("Failed to send packet"))?
        .map_err(|e| Error::transport(format!("Send error: {}", e)))
}

async fn blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::transport(format!("I/O task failed: {}", e)))?
}

#[async_trait]
impl Transport for RawTransport {
    async fn send(&self, interface: &str, frame: &[u8]) -> Result<()> {
        let senders = Arc::clone(&self.senders);
        let interface = interface.to_string();
        let frame = frame.to_vec();

        blocking(move || {
            let cached = senders.get(&interface).map(|s| Arc::clone(s.value()));
            let sender = match cached {
                Some(sender) => sender,
                None => {
                    let (tx, _) = open_channel(&interface, None)?;
                    debug!(interface = %interface, "Opened raw sender");
                    let sender: SharedSender = Arc::new(Mutex::new(tx));
                    senders.insert(interface.clone(), Arc::clone(&sender));
                    sender
                }
            };

            let result = send_on(&mut **sender.lock(), &frame);
            if result.is_err() {
                // channel may be stale after the link bounced
                senders.remove(&interface);
            }
            result
        })
        .await
    }

    async fn send_and_await_reply(
        &self,
        interface: &str,
        frame: &[u8],
        filter: &FrameFilter,
        timeout: Duration,
    ) -> Result<Option<Vec<u8>>> {
        // capture first so a fast reply is not missed
        self.capture(interface).await?;
        let since = Instant::now();
        let deadline = since + timeout;
        self.send(interface, frame).await?;
        trace!(interface = %interface, filter = filter.name(), "Awaiting reply");
        self.next_matching(interface, filter, Some(since), deadline).await
    }

    async fn receive_matching(
        &self,
        interface: &str,
        filter: &FrameFilter,
        timeout: Duration,
    ) -> Result<Option<Vec<u8>>> {
        let deadline = Instant::now() + timeout;
        self.next_matching(interface, filter, None, deadline).await
    }

    async fn hardware_address(&self, interface: &str) -> Result<MacAddr> {
        let iface = find_datalink_interface(interface)?;
        iface
            .mac
            .map(|mac| MacAddr::new([mac.0, mac.1, mac.2, mac.3, mac.4, mac.5]))
            .ok_or_else(|| Error::transport(format!("{} has no hardware address", interface)))
    }

    fn name(&self) -> &str {
        "raw"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_interface() {
        let transport = RawTransport::new();
        let err = transport
            .send("nonexistent_interface_xyz", &[0u8; 60])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InterfaceNotFound(_)));

        let err = transport
            .receive_matching("nonexistent_interface_xyz", &FrameFilter::any(), Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InterfaceNotFound(_)));
        assert!(transport.captures.is_empty());

        let err = transport
            .hardware_address("nonexistent_interface_xyz")
            .await
            .unwrap_err();
        assert!(err.is_transport());
    }

    #[test]
    fn test_permission_error_mapping() {
        let err = channel_error("eth0", io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(err, Error::InsufficientPrivileges(_)));
        let err = channel_error("eth0", io::Error::from(io::ErrorKind::Other));
        assert!(matches!(err, Error::Transport(_)));
    }
}
