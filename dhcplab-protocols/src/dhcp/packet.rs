//! DHCP message parsing and building
//!
//! BOOTP fixed header, magic cookie and the option subset the attacks and
//! the recon probe need (RFC 2131, RFC 2132). Unrecognised options are kept
//! verbatim so a parsed message re-encodes unchanged.

use bytes::{BufMut, BytesMut};
use dhcplab_core::{Error, MacAddr, Result};
use std::fmt;
use std::net::Ipv4Addr;

/// DHCP magic cookie value
pub const DHCP_MAGIC_COOKIE: u32 = 0x6382_5363;

/// Broadcast flag value
pub const DHCP_BROADCAST_FLAG: u16 = 0x8000;

/// BOOTREQUEST opcode
pub const BOOTREQUEST: u8 = 1;

/// BOOTREPLY opcode
pub const BOOTREPLY: u8 = 2;

/// Ethernet hardware type
pub const HTYPE_ETHERNET: u8 = 1;

/// Ethernet hardware address length
pub const HLEN_ETHERNET: u8 = 6;

/// Size of the fixed BOOTP header
pub const BOOTP_HEADER_SIZE: usize = 236;

/// DHCP Message Types (RFC 2132)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DhcpMessageType {
    Discover = 1,
    Offer = 2,
    Request = 3,
    Decline = 4,
    Ack = 5,
    Nak = 6,
    Release = 7,
    Inform = 8,
}

impl DhcpMessageType {
    pub fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            1 => DhcpMessageType::Discover,
            2 => DhcpMessageType::Offer,
            3 => DhcpMessageType::Request,
            4 => DhcpMessageType::Decline,
            5 => DhcpMessageType::Ack,
            6 => DhcpMessageType::Nak,
            7 => DhcpMessageType::Release,
            8 => DhcpMessageType::Inform,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DhcpMessageType::Discover => "DISCOVER",
            DhcpMessageType::Offer => "OFFER",
            DhcpMessageType::Request => "REQUEST",
            DhcpMessageType::Decline => "DECLINE",
            DhcpMessageType::Ack => "ACK",
            DhcpMessageType::Nak => "NAK",
            DhcpMessageType::Release => "RELEASE",
            DhcpMessageType::Inform => "INFORM",
        }
    }

    /// Messages a server sends (BOOTREPLY)
    pub fn is_server_message(&self) -> bool {
        matches!(
            self,
            DhcpMessageType::Offer | DhcpMessageType::Ack | DhcpMessageType::Nak
        )
    }
}

impl fmt::Display for DhcpMessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Option codes used below
pub mod codes {
    pub const PAD: u8 = 0;
    pub const SUBNET_MASK: u8 = 1;
    pub const ROUTER: u8 = 3;
    pub const DNS_SERVER: u8 = 6;
    pub const HOSTNAME: u8 = 12;
    pub const REQUESTED_IP: u8 = 50;
    pub const LEASE_TIME: u8 = 51;
    pub const MESSAGE_TYPE: u8 = 53;
    pub const SERVER_ID: u8 = 54;
    pub const PARAMETER_REQUEST_LIST: u8 = 55;
    pub const MESSAGE: u8 = 56;
    pub const RENEWAL_TIME: u8 = 58;
    pub const REBINDING_TIME: u8 = 59;
    pub const CLIENT_IDENTIFIER: u8 = 61;
    pub const END: u8 = 255;
}

/// DHCP Option
#[derive(Debug, Clone, PartialEq)]
pub enum DhcpOption {
    SubnetMask(Ipv4Addr),
    Router(Vec<Ipv4Addr>),
    DnsServer(Vec<Ipv4Addr>),
    Hostname(String),
    RequestedIpAddress(Ipv4Addr),
    LeaseTime(u32),
    MessageType(DhcpMessageType),
    ServerId(Ipv4Addr),
    ParameterRequestList(Vec<u8>),
    Message(String),
    RenewalTime(u32),
    RebindingTime(u32),
    ClientIdentifier(Vec<u8>),
    Unknown(u8, Vec<u8>),
}

fn ipv4_at(data: &[u8]) -> Ipv4Addr {
    Ipv4Addr::new(data[0], data[1], data[2], data[3])
}

fn one_addr(code: u8, data: &[u8]) -> Result<Ipv4Addr> {
    if data.len() != 4 {
        return Err(Error::PacketParsing(format!(
            "option {} must be 4 bytes, got {}",
            code,
            data.len()
        )));
    }
    Ok(ipv4_at(data))
}

fn addr_list(code: u8, data: &[u8]) -> Result<Vec<Ipv4Addr>> {
    if data.is_empty() || data.len() % 4 != 0 {
        return Err(Error::PacketParsing(format!(
            "option {} must hold a non-empty list of addresses",
            code
        )));
    }
    Ok(data.chunks_exact(4).map(ipv4_at).collect())
}

fn seconds(code: u8, data: &[u8]) -> Result<u32> {
    let bytes: [u8; 4] = data.try_into().map_err(|_| {
        Error::PacketParsing(format!("option {} must be 4 bytes", code))
    })?;
    Ok(u32::from_be_bytes(bytes))
}

impl DhcpOption {
    /// Decode one option body
    pub fn parse(code: u8, data: &[u8]) -> Result<Self> {
        Ok(match code {
            codes::SUBNET_MASK => DhcpOption::SubnetMask(one_addr(code, data)?),
            codes::ROUTER => DhcpOption::Router(addr_list(code, data)?),
            codes::DNS_SERVER => DhcpOption::DnsServer(addr_list(code, data)?),
            codes::HOSTNAME => DhcpOption::Hostname(String::from_utf8_lossy(data).into_owned()),
            codes::REQUESTED_IP => DhcpOption::RequestedIpAddress(one_addr(code, data)?),
            codes::LEASE_TIME => DhcpOption::LeaseTime(seconds(code, data)?),
            codes::MESSAGE_TYPE => {
                let value = match data {
                    [value] => *value,
                    _ => {
                        return Err(Error::PacketParsing(
                            "message type must be 1 byte".to_string(),
                        ))
                    }
                };
                DhcpOption::MessageType(DhcpMessageType::from_u8(value).ok_or_else(|| {
                    Error::PacketParsing(format!("invalid message type {}", value))
                })?)
            }
            codes::SERVER_ID => DhcpOption::ServerId(one_addr(code, data)?),
            codes::PARAMETER_REQUEST_LIST => DhcpOption::ParameterRequestList(data.to_vec()),
            codes::MESSAGE => DhcpOption::Message(String::from_utf8_lossy(data).into_owned()),
            codes::RENEWAL_TIME => DhcpOption::RenewalTime(seconds(code, data)?),
            codes::REBINDING_TIME => DhcpOption::RebindingTime(seconds(code, data)?),
            codes::CLIENT_IDENTIFIER => DhcpOption::ClientIdentifier(data.to_vec()),
            other => DhcpOption::Unknown(other, data.to_vec()),
        })
    }

    pub fn code(&self) -> u8 {
        match self {
            DhcpOption::SubnetMask(_) => codes::SUBNET_MASK,
            DhcpOption::Router(_) => codes::ROUTER,
            DhcpOption::DnsServer(_) => codes::DNS_SERVER,
            DhcpOption::Hostname(_) => codes::HOSTNAME,
            DhcpOption::RequestedIpAddress(_) => codes::REQUESTED_IP,
            DhcpOption::LeaseTime(_) => codes::LEASE_TIME,
            DhcpOption::MessageType(_) => codes::MESSAGE_TYPE,
            DhcpOption::ServerId(_) => codes::SERVER_ID,
            DhcpOption::ParameterRequestList(_) => codes::PARAMETER_REQUEST_LIST,
            DhcpOption::Message(_) => codes::MESSAGE,
            DhcpOption::RenewalTime(_) => codes::RENEWAL_TIME,
            DhcpOption::RebindingTime(_) => codes::REBINDING_TIME,
            DhcpOption::ClientIdentifier(_) => codes::CLIENT_IDENTIFIER,
            DhcpOption::Unknown(code, _) => *code,
        }
    }

    fn body(&self) -> Vec<u8> {
        match self {
            DhcpOption::SubnetMask(addr)
            | DhcpOption::RequestedIpAddress(addr)
            | DhcpOption::ServerId(addr) => addr.octets().to_vec(),
            DhcpOption::Router(addrs) | DhcpOption::DnsServer(addrs) => {
                addrs.iter().flat_map(|a| a.octets()).collect()
            }
            DhcpOption::Hostname(text) | DhcpOption::Message(text) => text.as_bytes().to_vec(),
            DhcpOption::LeaseTime(secs)
            | DhcpOption::RenewalTime(secs)
            | DhcpOption::RebindingTime(secs) => secs.to_be_bytes().to_vec(),
            DhcpOption::MessageType(msg_type) => vec![*msg_type as u8],
            DhcpOption::ParameterRequestList(data)
            | DhcpOption::ClientIdentifier(data)
            | DhcpOption::Unknown(_, data) => data.clone(),
        }
    }

    /// Encode as code, length, body
    ///
    /// Bodies longer than 255 bytes cannot be represented and fail.
    pub fn encode(&self, buffer: &mut BytesMut) -> Result<()> {
        let body = self.body();
        let len = u8::try_from(body.len()).map_err(|_| {
            Error::PacketConstruction(format!(
                "option {} body is {} bytes (max 255)",
                self.code(),
                body.len()
            ))
        })?;
        buffer.put_u8(self.code());
        buffer.put_u8(len);
        buffer.put_slice(&body);
        Ok(())
    }
}

/// DHCP message (RFC 2131 section 2)
#[derive(Debug, Clone, PartialEq)]
pub struct DhcpPacket {
    /// BOOTREQUEST or BOOTREPLY
    pub op: u8,
    pub htype: u8,
    pub hlen: u8,
    pub hops: u8,
    /// Transaction ID
    pub xid: u32,
    pub secs: u16,
    pub flags: u16,
    /// Client IP address (if known)
    pub ciaddr: Ipv4Addr,
    /// Your (client) IP address
    pub yiaddr: Ipv4Addr,
    /// Next server IP address
    pub siaddr: Ipv4Addr,
    /// Relay agent IP address
    pub giaddr: Ipv4Addr,
    /// Client hardware address
    pub chaddr: MacAddr,
    /// Options in wire order, without Pad and End
    pub options: Vec<DhcpOption>,
}

impl DhcpPacket {
    /// Empty request from `chaddr`
    pub fn new(op: u8, xid: u32, chaddr: MacAddr) -> Self {
        Self {
            op,
            htype: HTYPE_ETHERNET,
            hlen: HLEN_ETHERNET,
            hops: 0,
            xid,
            secs: 0,
            flags: 0,
            ciaddr: Ipv4Addr::UNSPECIFIED,
            yiaddr: Ipv4Addr::UNSPECIFIED,
            siaddr: Ipv4Addr::UNSPECIFIED,
            giaddr: Ipv4Addr::UNSPECIFIED,
            chaddr,
            options: Vec::new(),
        }
    }

    /// DISCOVER with the broadcast flag set
    pub fn discover(xid: u32, chaddr: MacAddr) -> Self {
        let mut packet = Self::new(BOOTREQUEST, xid, chaddr);
        packet.flags = DHCP_BROADCAST_FLAG;
        packet.options = vec![
            DhcpOption::MessageType(DhcpMessageType::Discover),
            DhcpOption::ParameterRequestList(vec![
                codes::SUBNET_MASK,
                codes::ROUTER,
                codes::DNS_SERVER,
            ]),
        ];
        packet
    }

    /// RELEASE of `client_ip`, addressed to `server_id`
    pub fn release(xid: u32, chaddr: MacAddr, client_ip: Ipv4Addr, server_id: Ipv4Addr) -> Self {
        let mut packet = Self::new(BOOTREQUEST, xid, chaddr);
        packet.ciaddr = client_ip;
        packet.options = vec![
            DhcpOption::MessageType(DhcpMessageType::Release),
            DhcpOption::ServerId(server_id),
        ];
        packet
    }

    /// DECLINE of `address`
    pub fn decline(xid: u32, chaddr: MacAddr, address: Ipv4Addr) -> Self {
        let mut packet = Self::new(BOOTREQUEST, xid, chaddr);
        packet.options = vec![
            DhcpOption::MessageType(DhcpMessageType::Decline),
            DhcpOption::RequestedIpAddress(address),
        ];
        packet
    }

    /// NAK claiming to come from `server_id`
    pub fn nak(xid: u32, chaddr: MacAddr, server_id: Ipv4Addr) -> Self {
        let mut packet = Self::new(BOOTREPLY, xid, chaddr);
        packet.options = vec![
            DhcpOption::MessageType(DhcpMessageType::Nak),
            DhcpOption::ServerId(server_id),
        ];
        packet
    }

    /// OFFER of `offered_ip` in answer to transaction `xid`
    pub fn offer(xid: u32, chaddr: MacAddr, offered_ip: Ipv4Addr, server_id: Ipv4Addr) -> Self {
        let mut packet = Self::new(BOOTREPLY, xid, chaddr);
        packet.flags = DHCP_BROADCAST_FLAG;
        packet.yiaddr = offered_ip;
        packet.siaddr = server_id;
        packet.options = vec![
            DhcpOption::MessageType(DhcpMessageType::Offer),
            DhcpOption::ServerId(server_id),
        ];
        packet
    }

    /// Append an option
    pub fn with_option(mut self, option: DhcpOption) -> Self {
        self.options.push(option);
        self
    }

    /// Parse a DHCP message from a UDP payload
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < BOOTP_HEADER_SIZE + 4 {
            return Err(Error::PacketParsing(format!(
                "DHCP message too short: {} bytes (minimum {})",
                data.len(),
                BOOTP_HEADER_SIZE + 4
            )));
        }

        let cookie = u32::from_be_bytes([data[236], data[237], data[238], data[239]]);
        if cookie != DHCP_MAGIC_COOKIE {
            return Err(Error::PacketParsing(format!(
                "bad magic cookie 0x{:08x}",
                cookie
            )));
        }

        let mut options = Vec::new();
        let mut offset = BOOTP_HEADER_SIZE + 4;
        while offset < data.len() {
            let code = data[offset];
            offset += 1;
            match code {
                codes::PAD => continue,
                codes::END => break,
                _ => {}
            }

            let len = *data.get(offset).ok_or_else(|| {
                Error::PacketParsing(format!("option {} is missing its length", code))
            })? as usize;
            offset += 1;

            let body = data.get(offset..offset + len).ok_or_else(|| {
                Error::PacketParsing(format!("option {} length {} exceeds message", code, len))
            })?;
            offset += len;

            options.push(DhcpOption::parse(code, body)?);
        }

        Ok(Self {
            op: data[0],
            htype: data[1],
            hlen: data[2],
            hops: data[3],
            xid: u32::from_be_bytes([data[4], data[5], data[6], data[7]]),
            secs: u16::from_be_bytes([data[8], data[9]]),
            flags: u16::from_be_bytes([data[10], data[11]]),
            ciaddr: ipv4_at(&data[12..16]),
            yiaddr: ipv4_at(&data[16..20]),
            siaddr: ipv4_at(&data[20..24]),
            giaddr: ipv4_at(&data[24..28]),
            chaddr: MacAddr::from_slice(&data[28..34])
                .ok_or_else(|| Error::PacketParsing("short chaddr".to_string()))?,
            options,
        })
    }

    /// Encode the message; End is always appended
    pub fn build(&self) -> Result<Vec<u8>> {
        let mut buffer = BytesMut::with_capacity(300);

        buffer.put_u8(self.op);
        buffer.put_u8(self.htype);
        buffer.put_u8(self.hlen);
        buffer.put_u8(self.hops);
        buffer.put_u32(self.xid);
        buffer.put_u16(self.secs);
        buffer.put_u16(self.flags);
        buffer.put_slice(&self.ciaddr.octets());
        buffer.put_slice(&self.yiaddr.octets());
        buffer.put_slice(&self.siaddr.octets());
        buffer.put_slice(&self.giaddr.octets());
        buffer.put_slice(self.chaddr.as_bytes());
        buffer.put_bytes(0, 10); // rest of chaddr
        buffer.put_bytes(0, 64); // sname
        buffer.put_bytes(0, 128); // file
        buffer.put_u32(DHCP_MAGIC_COOKIE);

        for option in &self.options {
            option.encode(&mut buffer)?;
        }
        buffer.put_u8(codes::END);

        Ok(buffer.to_vec())
    }

    pub fn message_type(&self) -> Option<DhcpMessageType> {
        self.options.iter().find_map(|opt| match opt {
            DhcpOption::MessageType(t) => Some(*t),
            _ => None,
        })
    }

    pub fn server_id(&self) -> Option<Ipv4Addr> {
        self.options.iter().find_map(|opt| match opt {
            DhcpOption::ServerId(addr) => Some(*addr),
            _ => None,
        })
    }

    pub fn requested_ip(&self) -> Option<Ipv4Addr> {
        self.options.iter().find_map(|opt| match opt {
            DhcpOption::RequestedIpAddress(addr) => Some(*addr),
            _ => None,
        })
    }

    pub fn lease_time(&self) -> Option<u32> {
        self.options.iter().find_map(|opt| match opt {
            DhcpOption::LeaseTime(secs) => Some(*secs),
            _ => None,
        })
    }

    pub fn routers(&self) -> &[Ipv4Addr] {
        self.options
            .iter()
            .find_map(|opt| match opt {
                DhcpOption::Router(addrs) => Some(addrs.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    pub fn dns_servers(&self) -> &[Ipv4Addr] {
        self.options
            .iter()
            .find_map(|opt| match opt {
                DhcpOption::DnsServer(addrs) => Some(addrs.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_type_conversion() {
        assert_eq!(DhcpMessageType::from_u8(1), Some(DhcpMessageType::Discover));
        assert_eq!(DhcpMessageType::from_u8(6), Some(DhcpMessageType::Nak));
        assert_eq!(DhcpMessageType::from_u8(99), None);
        assert_eq!(DhcpMessageType::Decline.to_string(), "DECLINE");
        assert!(DhcpMessageType::Offer.is_server_message());
        assert!(!DhcpMessageType::Release.is_server_message());
    }

    #[test]
    fn test_option_encoding() {
        let mut buffer = BytesMut::new();
        DhcpOption::MessageType(DhcpMessageType::Offer)
            .encode(&mut buffer)
            .unwrap();
        DhcpOption::LeaseTime(3600).encode(&mut buffer).unwrap();
        DhcpOption::DnsServer(vec![Ipv4Addr::new(8, 8, 8, 8), Ipv4Addr::new(1, 1, 1, 1)])
            .encode(&mut buffer)
            .unwrap();

        assert_eq!(
            buffer.to_vec(),
            vec![
                53, 1, 2, //
                51, 4, 0, 0, 0x0e, 0x10, //
                6, 8, 8, 8, 8, 8, 1, 1, 1, 1,
            ]
        );
    }

    #[test]
    fn test_option_too_long() {
        let mut buffer = BytesMut::new();
        let result = DhcpOption::Message("x".repeat(300)).encode(&mut buffer);
        assert!(matches!(result, Err(Error::PacketConstruction(_))));
    }

    #[test]
    fn test_option_parse_errors() {
        assert!(DhcpOption::parse(codes::SERVER_ID, &[1, 2, 3]).is_err());
        assert!(DhcpOption::parse(codes::ROUTER, &[]).is_err());
        assert!(DhcpOption::parse(codes::MESSAGE_TYPE, &[42]).is_err());
        assert_eq!(
            DhcpOption::parse(82, &[1, 2]).unwrap(),
            DhcpOption::Unknown(82, vec![1, 2])
        );
    }

    #[test]
    fn test_discover_layout() {
        let mac = MacAddr::new([0x02, 0x11, 0x22, 0x33, 0x44, 0x55]);
        let bytes = DhcpPacket::discover(0xdeadbeef, mac).build().unwrap();

        assert_eq!(bytes[0], BOOTREQUEST);
        assert_eq!(bytes[1], HTYPE_ETHERNET);
        assert_eq!(bytes[2], HLEN_ETHERNET);
        assert_eq!(&bytes[4..8], &[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(&bytes[10..12], &[0x80, 0x00]);
        assert_eq!(&bytes[28..34], mac.as_bytes());
        assert_eq!(&bytes[236..240], &[0x63, 0x82, 0x53, 0x63]);
        assert_eq!(&bytes[240..243], &[53, 1, 1]);
        assert_eq!(*bytes.last().unwrap(), codes::END);
    }

    #[test]
    fn test_parse_skips_pad_and_stops_at_end() {
        let mac = MacAddr::new([0x02, 0, 0, 0, 0, 9]);
        let mut bytes = DhcpPacket::new(BOOTREPLY, 5, mac).build().unwrap();
        // replace the lone END with pad, message type, END, trailing junk
        bytes.pop();
        bytes.extend_from_slice(&[0, 0, 53, 1, 2, 255, 0xde, 0xad]);

        let packet = DhcpPacket::parse(&bytes).unwrap();
        assert_eq!(packet.options, vec![DhcpOption::MessageType(DhcpMessageType::Offer)]);
        assert_eq!(packet.chaddr, mac);
        assert_eq!(packet.xid, 5);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(DhcpPacket::parse(&[0u8; 100]).is_err());

        let mut bytes = DhcpPacket::discover(1, MacAddr::zero()).build().unwrap();
        bytes[236] = 0;
        assert!(DhcpPacket::parse(&bytes).is_err());

        let mut truncated = DhcpPacket::discover(1, MacAddr::zero()).build().unwrap();
        truncated.truncate(241);
        truncated.push(10); // option length pointing past the end
        assert!(DhcpPacket::parse(&truncated).is_err());
    }

    #[test]
    fn test_offer_accessors() {
        let server = Ipv4Addr::new(10, 0, 0, 1);
        let packet = DhcpPacket::offer(7, MacAddr::zero(), Ipv4Addr::new(10, 0, 0, 50), server)
            .with_option(DhcpOption::LeaseTime(600))
            .with_option(DhcpOption::Router(vec![server]))
            .with_option(DhcpOption::DnsServer(vec![server]));

        let parsed = DhcpPacket::parse(&packet.build().unwrap()).unwrap();
        assert_eq!(parsed, packet);
        assert_eq!(parsed.message_type(), Some(DhcpMessageType::Offer));
        assert_eq!(parsed.server_id(), Some(server));
        assert_eq!(parsed.lease_time(), Some(600));
        assert_eq!(parsed.routers(), &[server]);
        assert_eq!(parsed.dns_servers(), &[server]);
        assert_eq!(parsed.yiaddr, Ipv4Addr::new(10, 0, 0, 50));
    }
}
