//! Protocol implementations for dhcplab
//!
//! ### DHCP (Dynamic Host Configuration Protocol)
//! Message codec (RFC 2131/2132), frame constructors for every message the
//! attacks emit, and the attack tasks themselves: starvation, flood, NAK,
//! release and decline injection, and a rogue server answering DISCOVERs.
//! See [`dhcp`] module for details.

pub mod dhcp;
