use crate::error::{ProtocolError, Result};
use bytes::{Buf, BufMut};

/// Set on the method id of every successful response
pub const METHOD_RESPONSE_BIT: u32 = 0x8000;

/// Size of a response with no data: protocol id, success flag, two u32 fields
pub const RMC_RESPONSE_BASE_SIZE: u32 = 10;

/// Largest success payload whose declared size fits the 32-bit size field
pub const MAX_RESPONSE_DATA_LEN: usize = (u32::MAX - RMC_RESPONSE_BASE_SIZE) as usize;

/// Well-known error codes
pub mod error_codes {
    /// Marks a result code as an error
    pub const ERROR_MASK: u32 = 0x8000_0000;
    pub const UNKNOWN: u32 = 0x8001_0001;
    pub const NOT_IMPLEMENTED: u32 = 0x8001_0002;
}

/// Outcome carried by a response. Exactly one is ever present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RmcResponseBody {
    Success {
        call_id: u32,
        /// Includes [`METHOD_RESPONSE_BIT`]
        method_id: u32,
        data: Vec<u8>,
    },
    Error {
        error_code: u32,
        call_id: u32,
    },
}

impl RmcResponseBody {
    pub fn call_id(&self) -> u32 {
        match self {
            RmcResponseBody::Success { call_id, .. } | RmcResponseBody::Error { call_id, .. } => {
                *call_id
            }
        }
    }
}

/// An outbound method result.
///
/// A response is always built around a body, so there is no unset state to
/// serialize. [`set_success`](Self::set_success) and
/// [`set_error`](Self::set_error) replace whichever body was there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RmcResponse {
    protocol_id: u8,
    body: RmcResponseBody,
}

impl RmcResponse {
    pub fn success(protocol_id: u8, call_id: u32, method_id: u32, data: impl Into<Vec<u8>>) -> Self {
        Self {
            protocol_id: protocol_id & 0x7F,
            body: RmcResponseBody::Success {
                call_id,
                method_id: method_id | METHOD_RESPONSE_BIT,
                data: data.into(),
            },
        }
    }

    pub fn error(protocol_id: u8, error_code: u32, call_id: u32) -> Self {
        Self {
            protocol_id: protocol_id & 0x7F,
            body: RmcResponseBody::Error {
                error_code,
                call_id,
            },
        }
    }

    /// Replace the body with a success result; returns the declared size.
    pub fn set_success(&mut self, call_id: u32, method_id: u32, data: impl Into<Vec<u8>>) -> u32 {
        self.body = RmcResponseBody::Success {
            call_id,
            method_id: method_id | METHOD_RESPONSE_BIT,
            data: data.into(),
        };
        self.size()
    }

    /// Replace the body with an error result; returns the declared size.
    pub fn set_error(&mut self, error_code: u32, call_id: u32) -> u32 {
        self.body = RmcResponseBody::Error {
            error_code,
            call_id,
        };
        self.size()
    }

    pub fn protocol_id(&self) -> u8 {
        self.protocol_id
    }

    pub fn body(&self) -> &RmcResponseBody {
        &self.body
    }

    pub fn is_success(&self) -> bool {
        matches!(self.body, RmcResponseBody::Success { .. })
    }

    /// Byte count following the size field.
    ///
    /// Saturates at `u32::MAX` when the data exceeds [`MAX_RESPONSE_DATA_LEN`];
    /// use [`try_size`](Self::try_size) to reject such responses instead.
    pub fn size(&self) -> u32 {
        self.try_size().unwrap_or(u32::MAX)
    }

    /// Byte count following the size field.
    ///
    /// # Errors
    /// `ResponseTooLarge` if the data does not fit the 32-bit size field.
    pub fn try_size(&self) -> Result<u32> {
        match &self.body {
            RmcResponseBody::Success { data, .. } => declared_size(data.len()),
            RmcResponseBody::Error { .. } => Ok(RMC_RESPONSE_BASE_SIZE),
        }
    }

    /// Serialize as `[size][protocol id][success][body]`, little-endian
    pub fn to_bytes(&self) -> Vec<u8> {
        let size = self.size();
        let mut buf = Vec::with_capacity(4 + size as usize);
        buf.put_u32_le(size);
        buf.put_u8(self.protocol_id);

        match &self.body {
            RmcResponseBody::Success {
                call_id,
                method_id,
                data,
            } => {
                buf.put_u8(1);
                buf.put_u32_le(*call_id);
                buf.put_u32_le(*method_id);
                buf.put_slice(data);
            }
            RmcResponseBody::Error {
                error_code,
                call_id,
            } => {
                buf.put_u8(0);
                buf.put_u32_le(*error_code);
                buf.put_u32_le(*call_id);
            }
        }
        buf
    }

    /// Parse a serialized response. Bytes past the declared size are ignored.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let required = 4 + RMC_RESPONSE_BASE_SIZE as usize;
        if data.len() < required {
            return Err(ProtocolError::RmcTooShort {
                actual: data.len(),
                required,
            });
        }

        let mut cursor = data;
        let size = cursor.get_u32_le();
        let protocol_id = cursor.get_u8();
        let success = cursor.get_u8();

        let end = 4usize.saturating_add(size as usize);
        if size < RMC_RESPONSE_BASE_SIZE || end > data.len() {
            return Err(ProtocolError::RmcTooShort {
                actual: data.len(),
                required: end.max(required),
            });
        }

        let body = match success {
            1 => {
                let call_id = cursor.get_u32_le();
                let method_id = cursor.get_u32_le();
                RmcResponseBody::Success {
                    call_id,
                    method_id,
                    data: data[required..end].to_vec(),
                }
            }
            0 => {
                let error_code = cursor.get_u32_le();
                let call_id = cursor.get_u32_le();
                RmcResponseBody::Error {
                    error_code,
                    call_id,
                }
            }
            other => return Err(ProtocolError::InvalidResponseFlag(other)),
        };

        Ok(Self {
            protocol_id: protocol_id & 0x7F,
            body,
        })
    }
}

fn declared_size(data_len: usize) -> Result<u32> {
    u32::try_from(data_len)
        .ok()
        .and_then(|len| len.checked_add(RMC_RESPONSE_BASE_SIZE))
        .ok_or(ProtocolError::ResponseTooLarge(data_len))
}
