//! Packet header and the framing shared by every packet schema.
//!
//! Wire layout: `[kind 4][version 8][sequence 16][body]`, padded with zero
//! bits to the next byte.
use crate::error::{CodecError, CodecResult};
use crate::serialize::{
    bit_io::{BitBuffer, BitRead, BitWrite},
    BitDeserialize, BitSerialize,
};
use log::debug;
use netplay_macros::NetworkSerialize;

/// Layout revision carried by every header. Bump on any wire change.
pub const SCHEMA_VERSION: u8 = 1;

pub const KIND_BITS: usize = 4;
pub const HEADER_BITS: usize = KIND_BITS + 8 + 16;

/// Delivery class of a packet, encoded in 4 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, NetworkSerialize)]
#[bits = 4]
pub enum PacketKind {
    /// High-frequency per-player state; loss is tolerated.
    #[variant_id = 0]
    Unreliable,
    /// Rare, must-arrive game configuration and commands.
    #[variant_id = 1]
    Reliable,
}

impl PacketKind {
    pub fn is_reliable(self) -> bool {
        matches!(self, PacketKind::Reliable)
    }

    /// Maps a raw header tag through the derived decoder, so `variant_id`
    /// stays the single source of truth.
    pub fn from_tag(tag: u64) -> CodecResult<Self> {
        let mut buf = BitBuffer::with_capacity(1);
        buf.write_bits(tag, KIND_BITS)?;
        Self::bit_deserialize(&mut buf)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, NetworkSerialize)]
pub struct PacketHeader {
    pub kind: PacketKind,
    pub version: u8,
    pub sequence: u16,
}

impl PacketHeader {
    pub fn new(kind: PacketKind, sequence: u16) -> Self {
        Self {
            kind,
            version: SCHEMA_VERSION,
            sequence,
        }
    }

    /// Reads a header and checks it against `expected`.
    ///
    /// The version is checked before the kind so a peer on another schema
    /// revision is reported as such even if its kind tags moved.
    pub fn read_expecting<R: BitRead>(expected: PacketKind, reader: &mut R) -> CodecResult<Self> {
        let header = Self::read_unchecked(reader)?;
        if header.kind != expected {
            debug!("Rejecting packet: expected {:?}, found {:?}", expected, header.kind);
            return Err(CodecError::UnexpectedKind {
                expected,
                found: header.kind,
            });
        }
        Ok(header)
    }

    /// Reads a header, checking only the schema version.
    pub fn read_unchecked<R: BitRead>(reader: &mut R) -> CodecResult<Self> {
        let kind_tag = reader.read_bits(KIND_BITS)?;
        let version = reader.read_bits(8)? as u8;
        let sequence = reader.read_bits(16)? as u16;
        if version != SCHEMA_VERSION {
            debug!(
                "Rejecting packet: schema version {} (local {})",
                version, SCHEMA_VERSION
            );
            return Err(CodecError::VersionMismatch {
                expected: SCHEMA_VERSION,
                found: version,
            });
        }
        let kind = PacketKind::from_tag(kind_tag).inspect_err(|_| {
            debug!("Rejecting packet: unknown kind tag {}", kind_tag);
        })?;
        Ok(Self {
            kind,
            version,
            sequence,
        })
    }
}

/// Reads the header of a received datagram without decoding the body.
pub fn peek_header(bytes: &[u8]) -> CodecResult<PacketHeader> {
    PacketHeader::read_unchecked(&mut BitBuffer::from_slice(bytes))
}

/// A packet schema: a header followed by a kind-specific body.
pub trait Packet: Sized {
    const KIND: PacketKind;

    fn sequence(&self) -> u16;

    fn write_body<W: BitWrite>(&self, writer: &mut W) -> CodecResult<()>;

    fn read_body<R: BitRead>(header: &PacketHeader, reader: &mut R) -> CodecResult<Self>;

    fn header(&self) -> PacketHeader {
        PacketHeader::new(Self::KIND, self.sequence())
    }

    fn encode_into<W: BitWrite>(&self, writer: &mut W) -> CodecResult<()> {
        self.header().bit_serialize(writer)?;
        self.write_body(writer)
    }

    /// Exact encoded size in bits, header included.
    fn size_bits(&self) -> CodecResult<usize> {
        let mut buffer = BitBuffer::measure();
        self.encode_into(&mut buffer)?;
        Ok(buffer.serialized_size_bits())
    }

    /// Encodes into a freshly allocated buffer of exactly the needed size.
    fn encode(&self) -> CodecResult<Vec<u8>> {
        let bits = self.size_bits()?;
        let mut buffer = BitBuffer::with_capacity(bits.div_ceil(8));
        self.encode_into(&mut buffer)?;
        Ok(buffer.into_bytes())
    }

    fn decode_from<R: BitRead>(reader: &mut R) -> CodecResult<Self> {
        let header = PacketHeader::read_expecting(Self::KIND, reader)?;
        Self::read_body(&header, reader)
    }

    fn decode(bytes: &[u8]) -> CodecResult<Self> {
        Self::decode_from(&mut BitBuffer::from_slice(bytes))
    }
}
