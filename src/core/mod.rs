//! # PRUDP Packet Decoding
//!
//! Turns raw datagrams into [`packet::Packet`] values.
//!
//! ## Components
//! - **Packet**: version 1 header, option block and payload extraction
//! - **Codec**: `tokio_util` decoder for framed datagram sockets
//!
//! ## Wire Format
//! ```text
//! [Prelude(2)] [Size(2)] [Src(1)] [Dst(1)] [TypeFlags(2)] [Session(1)] [MultiAck(1)]
//! [Seq(2)] [Signature(16)] [OptionId(1)] [OptionSize(1)] [Option(n)] [Payload(N)] [Trailer(1)]
//! ```
//!
//! Building headers for transmission belongs to the session layer; this
//! module only decodes.

pub mod codec;
pub mod packet;
