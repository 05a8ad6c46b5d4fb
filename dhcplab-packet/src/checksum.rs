//! Internet checksum (RFC 1071) used by the IPv4 header and UDP

/// One's-complement sum of 16-bit big-endian words, not yet folded
pub fn checksum_accumulate(data: &[u8]) -> u32 {
    let mut chunks = data.chunks_exact(2);
    let mut sum: u32 = chunks
        .by_ref()
        .map(|c| u16::from_be_bytes([c[0], c[1]]) as u32)
        .sum();

    if let Some(&last) = chunks.remainder().first() {
        sum += (last as u32) << 8;
    }
    sum
}

fn fold(mut sum: u32) -> u16 {
    while sum >> 16 != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    !(sum as u16)
}

/// Internet checksum of `data`
///
/// ```
/// use dhcplab_packet::checksum::internet_checksum;
///
/// assert_eq!(internet_checksum(&[0x00, 0x01, 0xf2, 0x03]), 0x0dfb);
/// ```
pub fn internet_checksum(data: &[u8]) -> u16 {
    fold(checksum_accumulate(data))
}

/// TCP/UDP checksum over the IPv4 pseudo-header plus `segment`
pub fn transport_checksum(src_ip: &[u8; 4], dst_ip: &[u8; 4], protocol: u8, segment: &[u8]) -> u16 {
    let mut sum = checksum_accumulate(src_ip);
    sum += checksum_accumulate(dst_ip);
    sum += protocol as u32;
    sum += segment.len() as u32;
    sum += checksum_accumulate(segment);
    fold(sum)
}

/// True when `data` (checksum field included) sums to zero
pub fn validate_checksum(data: &[u8]) -> bool {
    internet_checksum(data) == 0
}
