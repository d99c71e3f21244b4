//! # Payload Pipeline
//!
//! Glue between the packet decoder, the compression strategy and the RMC
//! envelope:
//!
//! ```text
//! datagram -> Packet -> decompress(payload) -> RmcRequest -> Dispatcher
//!                                                              |
//! transport <- compress(envelope) <- RmcResponse::to_bytes <---+
//! ```
//!
//! Sockets, acknowledgements, retransmission and signature checks stay with
//! the transport that owns the session.

pub mod pipeline;

pub use pipeline::RmcPipeline;
