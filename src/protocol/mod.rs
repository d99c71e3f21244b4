//! # RMC Envelope
//!
//! Remote method call requests and responses carried in PRUDP payloads.
//!
//! ## Wire Format
//! ```text
//! request:  [Size(4)] [ProtocolId|0x80(1)] [CallId(4)] [MethodId(4)] [Parameters...]
//! response: [Size(4)] [ProtocolId(1)] [Success(1)] [Body]
//!           success body: [CallId(4)] [MethodId|0x8000(4)] [Data...]
//!           error body:   [ErrorCode(4)] [CallId(4)]
//! ```
//!
//! All integers are little-endian.
//!
//! ## Components
//! - **Request**: inbound envelope decoding
//! - **Response**: success/error result envelope
//! - **Dispatcher**: routes requests to registered method handlers

pub mod dispatcher;
pub mod request;
pub mod response;
