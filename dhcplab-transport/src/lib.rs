//! Frame transports for dhcplab
//!
//! Two implementations of [`dhcplab_core::Transport`]:
//!
//! - [`RawTransport`] sends and receives real Ethernet frames through
//!   `pnet_datalink` channels. It needs raw-socket privileges. Each
//!   interface it receives on gets one long-lived [`Capture`] thread.
//! - [`MemoryTransport`] keeps everything in memory. Sent frames are
//!   recorded, inbound frames are scripted or produced by a responder
//!   closure, and sends can be made to fail. Dry runs and tests use it.
//!
//! ## Example
//!
//! ```no_run
//! use dhcplab_core::Transport;
//! use dhcplab_transport::RawTransport;
//!
//! # async fn demo() -> dhcplab_core::Result<()> {
//! let transport = RawTransport::new();
//! let mac = transport.hardware_address("eth0").await?;
//! println!("eth0 is {}", mac);
//! # Ok(())
//! # }
//! ```

pub mod capture;
pub mod interface;
pub mod memory;
pub mod raw;

pub use capture::Capture;
pub use interface::{get_interface, list_interfaces, InterfaceInfo};
pub use memory::{MemoryTransport, SentFrame};
pub use raw::RawTransport;
