use byteorder::{BigEndian, ByteOrder};
use bytes::BytesMut;
use num_traits::FromPrimitive;
use tokio::io::AsyncWrite;
use tokio_util::codec::{Decoder, Encoder, FramedWrite};

use super::frame::BmpFrame;
use super::types::*;

pub struct BmpFrameCodec;

impl BmpFrameCodec {
    pub fn frame_it<W: AsyncWrite>(writer: W) -> FramedWrite<W, BmpFrameCodec> {
        FramedWrite::new(writer, BmpFrameCodec)
    }
}

impl Decoder for BmpFrameCodec {
    type Item = BmpFrame;
    type Error = std::io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // Wait for the complete common header
        if src.len() < COMMON_HEADER_LENGTH {
            return Ok(None);
        }

        validate_bmp_version(src[0])?;

        let length = BigEndian::read_u32(&src[1..5]) as usize;
        validate_message_length(length)?;

        if MessageType::from_u8(src[5]).is_none() {
            return Err(BmpValidationError::InvalidMessageType(src[5]).into());
        }

        // Check if we have the complete message
        if src.len() < length {
            src.reserve(length - src.len());
            return Ok(None);
        }

        let data = src.split_to(length).freeze();
        Ok(Some(BmpFrame::from_wire(data)))
    }
}

impl Encoder<BmpFrame> for BmpFrameCodec {
    type Error = std::io::Error;

    fn encode(&mut self, frame: BmpFrame, buf: &mut BytesMut) -> Result<(), Self::Error> {
        buf.reserve(frame.len());
        buf.extend_from_slice(frame.as_bytes());
        Ok(())
    }
}
