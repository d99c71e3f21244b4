use crate::error::{ProtocolError, Result};
use bytes::{Buf, Bytes};
use tracing::debug;

/// Size, protocol id, call id and method id
pub const RMC_REQUEST_HEADER_SIZE: usize = 13;

/// Set on the protocol id byte of every request
pub const PROTOCOL_REQUEST_BIT: u8 = 0x80;

/// An inbound remote method call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RmcRequest {
    /// Declared remaining length, as transmitted
    pub size: u32,
    /// Service identifier with the request bit masked off
    pub protocol_id: u8,
    /// Whether the request bit was set on the wire
    pub request_bit: bool,
    pub call_id: u32,
    pub method_id: u32,
    /// Method-specific arguments, not interpreted here
    pub parameters: Bytes,
}

impl RmcRequest {
    /// Decode a request envelope.
    ///
    /// Header fields are read strictly left to right. Parameters start at
    /// absolute offset `size - 13` of `data`.
    ///
    /// # Errors
    /// `RmcTooShort` if the fixed header does not fit, `InvalidParameterOffset`
    /// if `size - 13` is negative or past the end of `data`.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < RMC_REQUEST_HEADER_SIZE {
            debug!(len = data.len(), "RMC request shorter than its fixed header");
            return Err(ProtocolError::RmcTooShort {
                actual: data.len(),
                required: RMC_REQUEST_HEADER_SIZE,
            });
        }

        let mut cursor = data;
        let size = cursor.get_u32_le();
        let raw_protocol_id = cursor.get_u8();
        let call_id = cursor.get_u32_le();
        let method_id = cursor.get_u32_le();

        let parameters_start = (size as usize)
            .checked_sub(RMC_REQUEST_HEADER_SIZE)
            .filter(|&start| start <= data.len())
            .ok_or(ProtocolError::InvalidParameterOffset {
                size,
                len: data.len(),
            })?;

        Ok(RmcRequest {
            size,
            protocol_id: raw_protocol_id & !PROTOCOL_REQUEST_BIT,
            request_bit: raw_protocol_id & PROTOCOL_REQUEST_BIT != 0,
            call_id,
            method_id,
            parameters: Bytes::copy_from_slice(&data[parameters_start..]),
        })
    }

    /// Whether the protocol id carried the request bit
    pub fn is_request(&self) -> bool {
        self.request_bit
    }
}
