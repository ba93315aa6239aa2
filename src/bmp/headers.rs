use byteorder::{BigEndian, ByteOrder};
use derive_builder::Builder;
use num_traits::FromPrimitive;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::error::BridgeError;

use super::types::*;

/// BMP Common Header
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+
/// |    Version    |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                        Message Length                         |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |   Msg. Type   |
/// +---------------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommonHeader {
    pub version: u8,
    pub message_length: u32,
    pub message_type: MessageType,
}

impl CommonHeader {
    /// Route Monitoring header for a message of `message_length` bytes in total.
    pub fn route_monitoring(message_length: usize) -> Result<CommonHeader, BridgeError> {
        let message_length =
            u32::try_from(message_length).map_err(|_| BridgeError::Encode(message_length))?;
        Ok(CommonHeader {
            version: VERSION,
            message_length,
            message_type: MessageType::RouteMonitoring,
        })
    }

    pub fn to_bytes(&self) -> [u8; COMMON_HEADER_LENGTH] {
        let mut buf = [0u8; COMMON_HEADER_LENGTH];
        buf[0] = self.version;
        BigEndian::write_u32(&mut buf[1..5], self.message_length);
        buf[5] = self.message_type as u8;
        buf
    }
}

impl TryFrom<&[u8]> for CommonHeader {
    type Error = BmpValidationError;

    fn try_from(src: &[u8]) -> Result<Self, Self::Error> {
        let buf: [u8; COMMON_HEADER_LENGTH] = safe_array(src, 0)?;
        validate_bmp_version(buf[0])?;
        let message_length = BigEndian::read_u32(&buf[1..5]);
        let message_type =
            MessageType::from_u8(buf[5]).ok_or(BmpValidationError::InvalidMessageType(buf[5]))?;
        Ok(CommonHeader {
            version: buf[0],
            message_length,
            message_type,
        })
    }
}

/// Peer timestamp as carried by the RIS feed: the integer part and the digits
/// after the decimal point, each taken as a plain integer. `"1598790597.83"`
/// becomes `{ seconds: 1598790597, fraction: 83 }`; the fraction is not scaled
/// to microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PeerTimestamp {
    pub seconds: u32,
    pub fraction: u32,
}

impl PeerTimestamp {
    pub fn parse(timestamp: &str) -> PeerTimestamp {
        let mut parts = timestamp.trim().split('.');
        let seconds = parts.next().map(lenient_u32).unwrap_or(0);
        let fraction = parts.next().map(lenient_u32).unwrap_or(0);
        PeerTimestamp { seconds, fraction }
    }
}

// Unparsable digits count as zero; out-of-range values wrap to 32 bits.
fn lenient_u32(digits: &str) -> u32 {
    match digits.parse::<i64>() {
        Ok(v) => v as u32,
        Err(_) => {
            log::warn!("invalid timestamp component {:?}", digits);
            0
        }
    }
}

/// Parse a decimal peer ASN. Malformed values yield 0 so the message is still
/// forwarded.
pub fn parse_peer_asn(asn: &str) -> u32 {
    match asn.parse::<i64>() {
        Ok(v) => v as u32,
        Err(_) => {
            log::warn!("invalid peer asn {}", asn);
            0
        }
    }
}

/// Classify a textual peer address, trying IPv4 first and IPv6 second.
pub fn parse_peer_address(peer: &str) -> Result<IpAddr, BridgeError> {
    if let Ok(v4) = peer.parse::<Ipv4Addr>() {
        return Ok(IpAddr::V4(v4));
    }
    if let Ok(v6) = peer.parse::<Ipv6Addr>() {
        return Ok(IpAddr::V6(v6));
    }
    Err(BridgeError::Address(peer.to_string()))
}

pub fn address_family_flags(address: &IpAddr) -> u8 {
    match address {
        IpAddr::V4(_) => 0,
        IpAddr::V6(_) => PEER_FLAG_V,
    }
}

/// BMP Per-Peer Header
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |   Peer Type   |  Peer Flags   |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |         Peer Distinguisher (present based on peer type)       |
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                 Peer Address (16 bytes)                       |
/// ~                                                               ~
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                           Peer AS                             |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                         Peer BGP ID                           |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                    Timestamp (seconds)                        |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                  Timestamp (microseconds)                     |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Builder, Debug, Clone, PartialEq)]
#[builder(setter(into))]
pub struct PerPeerHeader {
    #[builder(default)]
    pub peer_type: PeerType,
    #[builder(default)]
    pub peer_flags: u8,
    #[builder(default)]
    pub peer_distinguisher: [u8; 8],
    pub peer_address: IpAddr,
    pub peer_as: u32,
    pub peer_bgp_id: Ipv4Addr,
    #[builder(default)]
    pub timestamp: PeerTimestamp,
}

impl fmt::Display for PerPeerHeader {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "peer : {} peer_as : {} bgp_id : {} timestamp : {}.{}",
            self.peer_address,
            self.peer_as,
            self.peer_bgp_id,
            self.timestamp.seconds,
            self.timestamp.fraction
        )
    }
}

impl PerPeerHeader {
    pub fn to_bytes(&self) -> [u8; PER_PEER_HEADER_LENGTH] {
        let mut buf = [0u8; PER_PEER_HEADER_LENGTH];
        buf[0] = self.peer_type as u8;
        buf[1] = self.peer_flags;
        buf[2..10].copy_from_slice(&self.peer_distinguisher);
        match self.peer_address {
            IpAddr::V4(a) => buf[22..26].copy_from_slice(&a.octets()),
            IpAddr::V6(a) => buf[10..26].copy_from_slice(&a.octets()),
        }
        BigEndian::write_u32(&mut buf[26..30], self.peer_as);
        buf[30..34].copy_from_slice(&self.peer_bgp_id.octets());
        BigEndian::write_u32(&mut buf[34..38], self.timestamp.seconds);
        BigEndian::write_u32(&mut buf[38..42], self.timestamp.fraction);
        buf
    }

    pub fn is_ipv6(&self) -> bool {
        self.peer_flags & PEER_FLAG_V != 0
    }
}

impl TryFrom<&[u8]> for PerPeerHeader {
    type Error = BmpValidationError;

    fn try_from(src: &[u8]) -> Result<Self, Self::Error> {
        let buf: [u8; PER_PEER_HEADER_LENGTH] = safe_array(src, 0)?;
        let peer_type =
            PeerType::from_u8(buf[0]).ok_or(BmpValidationError::InvalidPeerType(buf[0]))?;
        let peer_flags = buf[1];

        let peer_distinguisher: [u8; 8] = safe_array(&buf, 2)?;
        let peer_address = if peer_flags & PEER_FLAG_V != 0 {
            let octets: [u8; 16] = safe_array(&buf, 10)?;
            IpAddr::V6(Ipv6Addr::from(octets))
        } else {
            let octets: [u8; 4] = safe_array(&buf, 22)?;
            IpAddr::V4(Ipv4Addr::from(octets))
        };
        let bgp_id: [u8; 4] = safe_array(&buf, 30)?;

        Ok(PerPeerHeader {
            peer_type,
            peer_flags,
            peer_distinguisher,
            peer_address,
            peer_as: BigEndian::read_u32(&buf[26..30]),
            peer_bgp_id: Ipv4Addr::from(bgp_id),
            timestamp: PeerTimestamp {
                seconds: BigEndian::read_u32(&buf[34..38]),
                fraction: BigEndian::read_u32(&buf[38..42]),
            },
        })
    }
}
