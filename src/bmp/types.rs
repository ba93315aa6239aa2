use num_derive::FromPrimitive;
use thiserror::Error;

// Constants
pub const VERSION: u8 = 3;
pub const COMMON_HEADER_LENGTH: usize = 6;
pub const PER_PEER_HEADER_LENGTH: usize = 42;
pub const HEADERS_LENGTH: usize = COMMON_HEADER_LENGTH + PER_PEER_HEADER_LENGTH;
pub const MAX_MESSAGE_LENGTH: usize = u32::MAX as usize;

// Peer flags (RFC 7854 section 4.2)
pub const PEER_FLAG_V: u8 = 0x80;
pub const PEER_FLAG_L: u8 = 0x40;
pub const PEER_FLAG_A: u8 = 0x20;

// Basic enums
#[derive(Debug, Clone, Copy, FromPrimitive, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum MessageType {
    #[default]
    RouteMonitoring = 0,
    StatisticsReport,
    PeerDownNotification,
    PeerUpNotification,
    Initiation,
    Termination,
    RouteMirroring,
}

#[derive(Debug, Clone, Copy, FromPrimitive, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum PeerType {
    #[default]
    GlobalInstance = 0,
    RdInstance,
    LocalInstance,
}

// BMP-specific validation errors
#[derive(Error, Debug, PartialEq)]
pub enum BmpValidationError {
    #[error("Message too short: got {actual}, minimum {minimum}")]
    MessageTooShort { actual: usize, minimum: usize },

    #[error("Message too long: got {actual}, maximum {maximum}")]
    MessageTooLong { actual: usize, maximum: usize },

    #[error("Invalid BMP version: got {actual}, expected {expected}")]
    InvalidVersion { actual: u8, expected: u8 },

    #[error("Invalid message type: {0}")]
    InvalidMessageType(u8),

    #[error("Invalid peer type: {0}")]
    InvalidPeerType(u8),

    #[error("Invalid buffer bounds: offset {offset}, length {length}, buffer size {buffer_size}")]
    InvalidBufferBounds {
        offset: usize,
        length: usize,
        buffer_size: usize,
    },
}

impl From<BmpValidationError> for std::io::Error {
    fn from(e: BmpValidationError) -> Self {
        std::io::Error::new(std::io::ErrorKind::InvalidData, e)
    }
}

// Validation helper functions
pub fn validate_buffer_bounds(
    buffer: &[u8],
    offset: usize,
    length: usize,
) -> Result<(), BmpValidationError> {
    if offset + length > buffer.len() {
        return Err(BmpValidationError::InvalidBufferBounds {
            offset,
            length,
            buffer_size: buffer.len(),
        });
    }
    Ok(())
}

pub fn validate_message_length(length: usize) -> Result<(), BmpValidationError> {
    if length < COMMON_HEADER_LENGTH {
        return Err(BmpValidationError::MessageTooShort {
            actual: length,
            minimum: COMMON_HEADER_LENGTH,
        });
    }
    if length > MAX_MESSAGE_LENGTH {
        return Err(BmpValidationError::MessageTooLong {
            actual: length,
            maximum: MAX_MESSAGE_LENGTH,
        });
    }
    Ok(())
}

pub fn validate_bmp_version(version: u8) -> Result<(), BmpValidationError> {
    if version != VERSION {
        return Err(BmpValidationError::InvalidVersion {
            actual: version,
            expected: VERSION,
        });
    }
    Ok(())
}

// Safe array extraction with validation
pub fn safe_array<const N: usize>(
    buffer: &[u8],
    offset: usize,
) -> Result<[u8; N], BmpValidationError> {
    validate_buffer_bounds(buffer, offset, N)?;
    let mut array = [0u8; N];
    array.copy_from_slice(&buffer[offset..offset + N]);
    Ok(array)
}
