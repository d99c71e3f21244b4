//! PRUDP version 1 datagram decoding.
//!
//! ```text
//! offset  size  field
//! 0       2     prelude (not interpreted)
//! 2       2     payload size (LE)
//! 4       1     source virtual port       (type << 4 | id)
//! 5       1     destination virtual port  (type << 4 | id)
//! 6       2     type/flags (LE): low nibble = packet type, rest = flags
//! 8       1     session id
//! 9       1     multi-ack version
//! 10      2     sequence id (LE)
//! 12      16    packet signature
//! 28      1     option id
//! 29      1     option size
//! 30      n     option data (depends on option id)
//! ...           payload
//! last    1     trailer
//! ```

use crate::config::{PACKET_SIGNATURE_SIZE, PRUDP_V1_HEADER_SIZE, PRUDP_VERSION};
use crate::error::{ProtocolError, Result};
use bytes::Bytes;
use std::fmt;
use tracing::{debug, trace};

/// Capability advertisement; carries no decoded data
pub const OPTION_CAPABILITIES: u8 = 0;
/// Connection signature
pub const OPTION_CONNECTION_SIGNATURE: u8 = 1;
/// Fragment id
pub const OPTION_FRAGMENT_ID: u8 = 2;
/// Reserved options whose bytes are skipped
pub const OPTION_RESERVED: [u8; 2] = [3, 4];

/// Endpoint address inside a session: service category plus instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VirtualPort {
    /// Service category (high nibble)
    pub port_type: u8,
    /// Instance within the category (low nibble)
    pub id: u8,
}

impl VirtualPort {
    pub const fn new(port_type: u8, id: u8) -> Self {
        Self {
            port_type: port_type & 0x0F,
            id: id & 0x0F,
        }
    }

    /// Split a wire byte into its two nibbles
    pub const fn from_byte(byte: u8) -> Self {
        Self {
            port_type: byte >> 4,
            id: byte & 0x0F,
        }
    }

    pub const fn to_byte(self) -> u8 {
        (self.port_type << 4) | (self.id & 0x0F)
    }
}

impl fmt::Display for VirtualPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}{:x}", self.port_type, self.id)
    }
}

/// Known packet types. The header keeps the raw nibble; this is a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PacketType {
    Syn = 0,
    Connect = 1,
    Data = 2,
    Disconnect = 3,
    Ping = 4,
}

impl PacketType {
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(PacketType::Syn),
            1 => Some(PacketType::Connect),
            2 => Some(PacketType::Data),
            3 => Some(PacketType::Disconnect),
            4 => Some(PacketType::Ping),
            _ => None,
        }
    }

    pub const fn raw(self) -> u8 {
        self as u8
    }
}

/// The 12-bit flag field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PacketFlags(u16);

impl PacketFlags {
    pub const ACK: u16 = 0x001;
    pub const RELIABLE: u16 = 0x002;
    pub const NEED_ACK: u16 = 0x004;
    pub const HAS_SIZE: u16 = 0x008;
    pub const MULTI_ACK: u16 = 0x200;

    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u16 {
        self.0
    }

    pub const fn contains(self, flag: u16) -> bool {
        self.0 & flag == flag
    }

    pub const fn is_ack(self) -> bool {
        self.contains(Self::ACK)
    }

    pub const fn is_reliable(self) -> bool {
        self.contains(Self::RELIABLE)
    }

    pub const fn needs_ack(self) -> bool {
        self.contains(Self::NEED_ACK)
    }

    pub const fn has_size(self) -> bool {
        self.contains(Self::HAS_SIZE)
    }
}

/// The single extension field selected by the option id
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketOption {
    /// Option 0: nothing beyond the option header
    Capabilities,
    /// Option 1
    ConnectionSignature(Bytes),
    /// Option 2
    FragmentId(Bytes),
    /// Options 3 and 4: consumed, not interpreted
    Reserved { id: u8, data: Bytes },
}

impl PacketOption {
    pub fn id(&self) -> u8 {
        match self {
            PacketOption::Capabilities => OPTION_CAPABILITIES,
            PacketOption::ConnectionSignature(_) => OPTION_CONNECTION_SIGNATURE,
            PacketOption::FragmentId(_) => OPTION_FRAGMENT_ID,
            PacketOption::Reserved { id, .. } => *id,
        }
    }

    /// Number of option bytes consumed after the option header
    pub fn consumed_len(&self) -> usize {
        match self {
            PacketOption::Capabilities => 0,
            PacketOption::ConnectionSignature(data)
            | PacketOption::FragmentId(data)
            | PacketOption::Reserved { data, .. } => data.len(),
        }
    }
}

/// A decoded version 1 datagram. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub version: u8,
    /// Declared payload size, carried as transmitted
    pub payload_size: u16,
    pub source: VirtualPort,
    pub destination: VirtualPort,
    /// Raw packet type nibble; see [`Packet::kind`]
    pub packet_type: u8,
    pub flags: PacketFlags,
    pub session_id: u8,
    pub multi_ack_version: u8,
    pub sequence_id: u16,
    /// Opaque authentication tag, not verified here
    pub signature: [u8; PACKET_SIGNATURE_SIZE],
    pub option: PacketOption,
    pub payload: Bytes,
}

impl Packet {
    /// Decode a datagram, copying what it keeps.
    ///
    /// # Errors
    /// `PacketTooShort` below 30 bytes, `UnknownOption` for option ids above 4,
    /// `OptionOutOfBounds` when the option runs past the datagram and
    /// `MissingTrailer` when no byte remains for the trailer.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::decode(&Bytes::copy_from_slice(data))
    }

    /// Decode a datagram already held in a [`Bytes`]; payload and option
    /// data share its allocation.
    pub fn decode(data: &Bytes) -> Result<Self> {
        if data.len() < PRUDP_V1_HEADER_SIZE {
            return Err(ProtocolError::PacketTooShort {
                actual: data.len(),
                required: PRUDP_V1_HEADER_SIZE,
            });
        }

        let payload_size = u16::from_le_bytes([data[2], data[3]]);
        let source = VirtualPort::from_byte(data[4]);
        let destination = VirtualPort::from_byte(data[5]);
        let type_flags = u16::from_le_bytes([data[6], data[7]]);
        let packet_type = (type_flags & 0x0F) as u8;
        let flags = PacketFlags::from_raw(type_flags >> 4);
        let session_id = data[8];
        let multi_ack_version = data[9];
        let sequence_id = u16::from_le_bytes([data[10], data[11]]);

        let mut signature = [0u8; PACKET_SIGNATURE_SIZE];
        signature.copy_from_slice(&data[12..12 + PACKET_SIGNATURE_SIZE]);

        let option_id = data[28];
        let option_size = data[29];
        let option = Self::decode_option(data, option_id, option_size)?;
        trace!(option_id, option_size, "Dispatched PRUDP option");

        let payload_start = PRUDP_V1_HEADER_SIZE + option.consumed_len();
        if data.len() <= payload_start {
            return Err(ProtocolError::MissingTrailer);
        }
        let payload = data.slice(payload_start..data.len() - 1);

        debug!(
            %source,
            %destination,
            packet_type,
            flags = flags.raw(),
            session_id,
            sequence_id,
            payload_len = payload.len(),
            "Decoded PRUDP packet"
        );

        Ok(Packet {
            version: PRUDP_VERSION,
            payload_size,
            source,
            destination,
            packet_type,
            flags,
            session_id,
            multi_ack_version,
            sequence_id,
            signature,
            option,
            payload,
        })
    }

    fn decode_option(data: &Bytes, option_id: u8, option_size: u8) -> Result<PacketOption> {
        if option_id == OPTION_CAPABILITIES {
            return Ok(PacketOption::Capabilities);
        }
        if option_id != OPTION_CONNECTION_SIGNATURE
            && option_id != OPTION_FRAGMENT_ID
            && !OPTION_RESERVED.contains(&option_id)
        {
            return Err(ProtocolError::UnknownOption(option_id));
        }

        let end = PRUDP_V1_HEADER_SIZE + option_size as usize;
        if end > data.len() {
            return Err(ProtocolError::OptionOutOfBounds {
                option_id,
                option_size,
                available: data.len() - PRUDP_V1_HEADER_SIZE,
            });
        }
        let bytes = data.slice(PRUDP_V1_HEADER_SIZE..end);

        Ok(match option_id {
            OPTION_CONNECTION_SIGNATURE => PacketOption::ConnectionSignature(bytes),
            OPTION_FRAGMENT_ID => PacketOption::FragmentId(bytes),
            id => PacketOption::Reserved { id, data: bytes },
        })
    }

    /// Typed view of the packet type nibble
    pub fn kind(&self) -> Option<PacketType> {
        PacketType::from_raw(self.packet_type)
    }

    pub fn connection_signature(&self) -> Option<&[u8]> {
        match &self.option {
            PacketOption::ConnectionSignature(sig) => Some(&sig[..]),
            _ => None,
        }
    }

    pub fn fragment_id(&self) -> Option<&[u8]> {
        match &self.option {
            PacketOption::FragmentId(id) => Some(&id[..]),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(option_id: u8, option_size: u8) -> Vec<u8> {
        let mut buf = vec![0xEA, 0xD0];
        buf.extend_from_slice(&8u16.to_le_bytes());
        buf.push(0x41); // source 4/1
        buf.push(0xAF); // destination a/f
        buf.extend_from_slice(&((0x00Cu16 << 4) | 2).to_le_bytes());
        buf.push(0x05);
        buf.push(0x01);
        buf.extend_from_slice(&0x0102u16.to_le_bytes());
        buf.extend_from_slice(&[0x5A; PACKET_SIGNATURE_SIZE]);
        buf.push(option_id);
        buf.push(option_size);
        buf
    }

    #[test]
    fn test_virtual_port_nibbles() {
        let port = VirtualPort::from_byte(0x41);
        assert_eq!(port.port_type, 4);
        assert_eq!(port.id, 1);
        assert_eq!(port.to_byte(), 0x41);
        assert_eq!(port.to_string(), "41");
        assert_eq!(VirtualPort::new(0x1F, 0x12).to_byte(), 0xF2);
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_fixed_fields() {
        let mut buf = header(OPTION_CAPABILITIES, 4);
        buf.extend_from_slice(&[1, 2, 3]);
        buf.push(0xFF);

        let packet = Packet::from_bytes(&buf).unwrap();
        assert_eq!(packet.version, PRUDP_VERSION);
        assert_eq!(packet.payload_size, 8);
        assert_eq!(packet.destination, VirtualPort::new(0xA, 0xF));
        assert_eq!(packet.kind(), Some(PacketType::Data));
        assert_eq!(packet.flags.raw(), 0x00C);
        assert!(packet.flags.needs_ack());
        assert!(packet.flags.has_size());
        assert!(!packet.flags.is_ack());
        assert_eq!(packet.multi_ack_version, 0x01);
        assert_eq!(packet.sequence_id, 0x0102);
        assert_eq!(packet.signature, [0x5A; PACKET_SIGNATURE_SIZE]);
        // option 0 consumes nothing even with a non-zero size
        assert_eq!(packet.option, PacketOption::Capabilities);
        assert_eq!(&packet.payload[..], &[1, 2, 3]);
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_flags_span_both_bytes() {
        let mut buf = header(OPTION_CAPABILITIES, 0);
        buf[6] = 0x13; // flags low nibble 1, type 3
        buf[7] = 0x20; // flags high byte
        buf.push(0);
        let packet = Packet::from_bytes(&buf).unwrap();
        assert_eq!(packet.kind(), Some(PacketType::Disconnect));
        assert_eq!(packet.flags.raw(), 0x201);
        assert!(packet.flags.contains(PacketFlags::MULTI_ACK));
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_fragment_option() {
        let mut buf = header(OPTION_FRAGMENT_ID, 1);
        buf.push(7);
        buf.extend_from_slice(b"data");
        buf.push(0);
        let packet = Packet::from_bytes(&buf).unwrap();
        assert_eq!(packet.fragment_id(), Some(&[7u8][..]));
        assert!(packet.connection_signature().is_none());
        assert_eq!(&packet.payload[..], b"data");
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_reserved_options_skipped() {
        for id in OPTION_RESERVED {
            let mut buf = header(id, 2);
            buf.extend_from_slice(&[0xEE, 0xEE]);
            buf.extend_from_slice(b"ok");
            buf.push(0);
            let packet = Packet::from_bytes(&buf).unwrap();
            assert_eq!(packet.option.id(), id);
            assert!(packet.fragment_id().is_none());
            assert!(packet.connection_signature().is_none());
            assert_eq!(&packet.payload[..], b"ok");
        }
    }

    #[test]
    fn test_unknown_option_rejected() {
        let mut buf = header(5, 0);
        buf.push(0);
        assert!(matches!(
            Packet::from_bytes(&buf),
            Err(ProtocolError::UnknownOption(5))
        ));
    }

    #[test]
    fn test_option_past_end_rejected() {
        let mut buf = header(OPTION_CONNECTION_SIGNATURE, 16);
        buf.extend_from_slice(&[0u8; 4]);
        assert!(matches!(
            Packet::from_bytes(&buf),
            Err(ProtocolError::OptionOutOfBounds {
                option_id: 1,
                option_size: 16,
                available: 4
            })
        ));
    }

    #[test]
    fn test_missing_trailer_rejected() {
        let buf = header(OPTION_CAPABILITIES, 0);
        assert!(matches!(
            Packet::from_bytes(&buf),
            Err(ProtocolError::MissingTrailer)
        ));
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_trailer_only_gives_empty_payload() {
        let mut buf = header(OPTION_CAPABILITIES, 0);
        buf.push(0xAA);
        assert!(Packet::from_bytes(&buf).unwrap().payload.is_empty());
    }

    #[test]
    fn test_short_header_rejected() {
        let buf = header(OPTION_CAPABILITIES, 0);
        assert!(matches!(
            Packet::from_bytes(&buf[..29]),
            Err(ProtocolError::PacketTooShort {
                actual: 29,
                required: 30
            })
        ));
    }
}
