use crate::core::packet::Packet;
use crate::error::{ProtocolError, Result};
use bytes::BytesMut;
use tokio_util::codec::Decoder;

/// Datagram decoder for framed UDP sockets.
///
/// Each call consumes the whole buffer as one datagram, so a malformed packet
/// is dropped with its error instead of poisoning the next read.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrudpDecoder;

impl Decoder for PrudpDecoder {
    type Item = Packet;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Packet>> {
        if src.is_empty() {
            return Ok(None);
        }

        let datagram = src.split().freeze();
        Packet::decode(&datagram).map(Some)
    }
}
