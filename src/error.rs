//! # Error Types
//!
//! Error handling for the PRUDP / RMC codec layer.
//!
//! Every decoder in this crate returns [`Result`]; nothing panics on malformed
//! input and no decoder hands back a half-populated structure.
//!
//! ## Error Categories
//! - **Malformed input**: short datagrams, option blocks running past the end,
//!   unknown option ids, RMC envelopes with impossible size fields
//! - **Corruption detected**: ratio witness mismatches and failures inside the
//!   underlying decompressor
//! - **Contract violations**: compressing into an empty buffer, ratios that do
//!   not fit the one-byte witness
//! - **Ambient**: I/O and configuration failures
//!
//! ## Example Usage
//! ```rust
//! use prudp_protocol::core::packet::Packet;
//! use prudp_protocol::error::ProtocolError;
//!
//! match Packet::from_bytes(&[0u8; 4]) {
//!     Err(ProtocolError::PacketTooShort { actual, required }) => {
//!         assert_eq!(actual, 4);
//!         assert_eq!(required, 30);
//!     }
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```

use std::io;
use thiserror::Error;

/// Error message constants to reduce allocations in error paths.
pub mod constants {
    /// Compression
    pub const ERR_DECOMPRESSION_FAILED: &str = "Decompression failed";

    /// Dispatcher
    pub const ERR_DISPATCHER_WRITE_LOCK: &str = "Failed to acquire write lock on dispatcher";
    pub const ERR_DISPATCHER_READ_LOCK: &str = "Failed to acquire read lock on dispatcher";

    /// Logging
    pub const ERR_SUBSCRIBER_SET: &str = "A global tracing subscriber is already installed";
}

/// ProtocolError is the error type for every codec operation
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Datagram too short: {actual} bytes, need at least {required}")]
    PacketTooShort { actual: usize, required: usize },

    #[error("Option {option_id} declares {option_size} bytes but only {available} remain")]
    OptionOutOfBounds {
        option_id: u8,
        option_size: u8,
        available: usize,
    },

    #[error("Unrecognized PRUDP option id: {0}")]
    UnknownOption(u8),

    #[error("Datagram has no room for the trailer byte")]
    MissingTrailer,

    #[error("RMC envelope too short: {actual} bytes, need at least {required}")]
    RmcTooShort { actual: usize, required: usize },

    #[error("RMC size field {size} places parameters outside a {len}-byte buffer")]
    InvalidParameterOffset { size: u32, len: usize },

    #[error("Invalid RMC success flag: {0}")]
    InvalidResponseFlag(u8),

    #[error("RMC response data of {0} bytes does not fit the 32-bit size field")]
    ResponseTooLarge(usize),

    #[error("Compression failed: {0}")]
    CompressionFailure(String),

    #[error("Compressor produced no output")]
    EmptyCompressedOutput,

    #[error("Compression ratio {0} does not fit in the ratio byte")]
    RatioOverflow(usize),

    #[error("Decompression failed: {0}")]
    DecompressionFailure(String),

    #[error("Compressed frame is empty (missing ratio byte)")]
    MissingRatioByte,

    #[error("Compression ratio mismatch: header says {expected}, payload gives {actual}")]
    RatioMismatch { expected: u8, actual: usize },

    #[error("Decompressed payload exceeds limit: {0} bytes")]
    DecompressedTooLarge(usize),

    #[error("Dispatcher error: {0}")]
    DispatchError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ProtocolError {
    /// Returns `true` for errors raised because the received bytes are damaged,
    /// as opposed to being structurally malformed.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            ProtocolError::DecompressionFailure(_)
                | ProtocolError::MissingRatioByte
                | ProtocolError::RatioMismatch { .. }
                | ProtocolError::DecompressedTooLarge(_)
        )
    }
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;
