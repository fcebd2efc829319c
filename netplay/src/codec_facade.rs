//! Config-driven entry point tying packets, the scratch pool and the hasher
//! together.
use log::debug;

use crate::anticheat::StateHash;
use crate::config::{CodecConfig, ConfigError};
use crate::error::{CodecError, CodecResult};
use crate::packet::{Packet, PacketHeader, PacketKind};
use crate::pool::ScratchPool;
use crate::schema::{ReliablePacket, UnreliablePacket};
use crate::serialize::{bit_io::BitBuffer, BitSerialize};

/// A decoded packet of either kind.
#[derive(Debug, Clone, PartialEq)]
pub enum AnyPacket {
    Unreliable(UnreliablePacket),
    Reliable(ReliablePacket),
}

impl AnyPacket {
    pub fn kind(&self) -> PacketKind {
        match self {
            AnyPacket::Unreliable(_) => PacketKind::Unreliable,
            AnyPacket::Reliable(_) => PacketKind::Reliable,
        }
    }

    pub fn sequence(&self) -> u16 {
        match self {
            AnyPacket::Unreliable(packet) => packet.sequence,
            AnyPacket::Reliable(packet) => packet.sequence,
        }
    }
}

/// Encodes, decodes and hashes through pooled scratch buffers.
///
/// Not `Sync`: keep one codec per thread.
pub struct PacketCodec {
    config: CodecConfig,
    pool: ScratchPool,
}

impl PacketCodec {
    pub fn new(config: CodecConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let pool = ScratchPool::new(config.scratch_capacity, config.pool_size);
        Ok(Self { config, pool })
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn pool(&self) -> &ScratchPool {
        &self.pool
    }

    /// Encodes `packet`; fails with `CapacityExceeded` if it does not fit in
    /// one scratch buffer.
    pub fn encode<P: Packet>(&self, packet: &P) -> CodecResult<Vec<u8>> {
        let mut scratch = self.pool.acquire();
        packet.encode_into(&mut *scratch)?;
        Ok(scratch.as_bytes().to_vec())
    }

    /// Decodes a datagram of either kind.
    ///
    /// Input longer than the scratch capacity is still accepted; bytes past
    /// the body are padding.
    pub fn decode(&self, bytes: &[u8]) -> CodecResult<AnyPacket> {
        self.decode_with(bytes, |reader| {
            let header = PacketHeader::read_unchecked(reader)?;
            match header.kind {
                PacketKind::Unreliable => {
                    let packet = UnreliablePacket::read_body(&header, reader)?;
                    self.check_players(&packet)?;
                    Ok(AnyPacket::Unreliable(packet))
                }
                PacketKind::Reliable => Ok(AnyPacket::Reliable(ReliablePacket::read_body(
                    &header, reader,
                )?)),
            }
        })
    }

    pub fn decode_unreliable(&self, bytes: &[u8]) -> CodecResult<UnreliablePacket> {
        self.decode_with(bytes, |reader| {
            let packet = UnreliablePacket::decode_from(reader)?;
            self.check_players(&packet)?;
            Ok(packet)
        })
    }

    pub fn decode_reliable(&self, bytes: &[u8]) -> CodecResult<ReliablePacket> {
        self.decode_with(bytes, ReliablePacket::decode_from)
    }

    /// Hash of the canonical encoding of `value`.
    pub fn hash<T: BitSerialize>(&self, value: &T) -> CodecResult<StateHash> {
        let mut scratch = self.pool.acquire();
        StateHash::of_canonical(value, &mut scratch)
    }

    /// Runs `decode` over `bytes`, loaded into a pooled buffer when they fit
    /// and read from a private copy otherwise.
    fn decode_with<T>(
        &self,
        bytes: &[u8],
        decode: impl FnOnce(&mut BitBuffer) -> CodecResult<T>,
    ) -> CodecResult<T> {
        let mut scratch = self.pool.acquire();
        if bytes.len() * 8 <= scratch.capacity_bits() {
            scratch.load(bytes)?;
            return decode(&mut *scratch);
        }
        debug!(
            "Datagram of {} bytes exceeds scratch capacity {}, decoding from a copy",
            bytes.len(),
            self.config.scratch_capacity
        );
        decode(&mut BitBuffer::from_slice(bytes))
    }

    fn check_players(&self, packet: &UnreliablePacket) -> CodecResult<()> {
        let max = self.config.max_players;
        if packet.players.len() > max {
            debug!(
                "Rejecting unreliable packet {}: {} players, limit {}",
                packet.sequence,
                packet.players.len(),
                max
            );
            return Err(CodecError::LengthExceeded {
                field: "players",
                len: packet.players.len(),
                max,
            });
        }
        Ok(())
    }
}
