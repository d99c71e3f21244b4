//! # Utility Modules
//!
//! Compression strategies, logging setup and metrics.
//!
//! ## Components
//! - **Compression**: no-op, DEFLATE and LZ4 strategies behind one trait,
//!   with ratio-byte framing and decompression size limits
//! - **Logging**: `tracing-subscriber` initialisation from configuration
//! - **Metrics**: lock-free counters for decode and compression outcomes

pub mod compression;
pub mod logging;
pub mod metrics;

pub use compression::{CompressionAlgorithm, CompressionKind};
