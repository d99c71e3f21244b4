//! # PRUDP Protocol
//!
//! Wire codecs for the PRUDP reliable-datagram transport and the RMC
//! (remote method call) envelope carried in its payloads.
//!
//! ## Modules
//! - [`core`]: PRUDP version 1 datagram decoding
//! - [`protocol`]: RMC request/response envelopes and method dispatch
//! - [`utils`]: payload compression, logging and metrics
//! - [`service`]: the pipeline tying the three together
//! - [`config`]: constants and TOML/environment configuration
//! - [`error`]: the crate error type
//!
//! ## Example
//! ```rust
//! use prudp_protocol::utils::compression::{CompressionAlgorithm, DeflateCompression};
//! use prudp_protocol::RmcResponse;
//!
//! let response = RmcResponse::success(0x0A, 1, 5, vec![0xAA, 0xBB]);
//! let codec = DeflateCompression::new();
//! let frame = codec.compress(&response.to_bytes())?;
//! let restored = RmcResponse::from_bytes(&codec.decompress(&frame)?)?;
//! assert_eq!(restored, response);
//! # Ok::<(), prudp_protocol::ProtocolError>(())
//! ```
//!
//! Every operation is a synchronous, pure transformation over byte buffers
//! and is safe to call from many threads at once.

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod service;
pub mod utils;

pub use crate::core::packet::{Packet, PacketOption, PacketType, VirtualPort};
pub use error::{ProtocolError, Result};
pub use protocol::request::RmcRequest;
pub use protocol::response::{RmcResponse, RmcResponseBody};
pub use service::RmcPipeline;
pub use utils::compression::CompressionAlgorithm;
