use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

use crate::error::BridgeError;

use super::headers::{CommonHeader, PerPeerHeader};
use super::types::*;

/// A complete BMP message as written to the collector: Common Header,
/// Per-Peer Header and the raw BGP UPDATE, in that order. The length field of
/// the Common Header always equals `len()`.
#[derive(Clone, PartialEq, Eq)]
pub struct BmpFrame {
    bytes: Bytes,
}

/// Concatenate the two headers and the BGP payload, writing the total length
/// into the Common Header.
pub fn assemble_frame(
    mut common: CommonHeader,
    per_peer: &PerPeerHeader,
    payload: &[u8],
) -> Result<BmpFrame, BridgeError> {
    let total = HEADERS_LENGTH + payload.len();
    common.message_length = u32::try_from(total).map_err(|_| BridgeError::Encode(total))?;

    let mut buf = BytesMut::with_capacity(total);
    buf.put_slice(&common.to_bytes());
    buf.put_slice(&per_peer.to_bytes());
    buf.put_slice(payload);

    Ok(BmpFrame {
        bytes: buf.freeze(),
    })
}

impl BmpFrame {
    pub fn route_monitoring(
        per_peer: &PerPeerHeader,
        payload: &[u8],
    ) -> Result<BmpFrame, BridgeError> {
        let common = CommonHeader::route_monitoring(HEADERS_LENGTH + payload.len())?;
        assemble_frame(common, per_peer, payload)
    }

    // Used by the decoder once the common header has been validated.
    pub(crate) fn from_wire(bytes: Bytes) -> BmpFrame {
        BmpFrame { bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn common_header(&self) -> Result<CommonHeader, BmpValidationError> {
        CommonHeader::try_from(&self.bytes[..])
    }

    pub fn per_peer_header(&self) -> Result<PerPeerHeader, BmpValidationError> {
        validate_buffer_bounds(&self.bytes, COMMON_HEADER_LENGTH, PER_PEER_HEADER_LENGTH)?;
        PerPeerHeader::try_from(&self.bytes[COMMON_HEADER_LENGTH..])
    }

    /// Everything after the Per-Peer Header.
    pub fn payload(&self) -> &[u8] {
        self.bytes.get(HEADERS_LENGTH..).unwrap_or(&[])
    }
}

impl From<BmpFrame> for Bytes {
    fn from(frame: BmpFrame) -> Self {
        frame.bytes
    }
}

impl fmt::Debug for BmpFrame {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "BmpFrame({} bytes: {})", self.len(), hex::encode(&self.bytes))
    }
}
