//! Must-arrive messages: game configuration and host commands.
use crate::anticheat::StateHash;
use crate::error::CodecResult;
use crate::packet::{Packet, PacketHeader, PacketKind};
use crate::serialize::{
    bit_io::{BitRead, BitWrite},
    BitDeserialize, BitSerialize,
};
use netplay_macros::NetworkSerialize;

use super::game::{GameData, RaceSettings};
use super::modifiers::GameModifiers;

/// Host to client control messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, NetworkSerialize)]
#[bits = 4]
pub enum ServerCommand {
    /// Race begins on this frame for every peer.
    #[variant_id = 0]
    StartRace { start_frame: u32 },
    #[variant_id = 1]
    SetPlayerCount {
        #[bits = 4]
        players: u8,
    },
    /// Seed for the shared random number generator.
    #[variant_id = 2]
    SyncSeed { seed: u32 },
    /// Expected hash of the host's game data.
    #[variant_id = 3]
    AntiCheatHash { hash: StateHash },
    #[variant_id = 4]
    Kick {
        #[bits = 8]
        reason: u8,
    },
}

#[derive(Debug, Clone, PartialEq, NetworkSerialize)]
#[bits = 4]
pub enum ReliableMessage {
    #[variant_id = 0]
    RaceSettings(RaceSettings),
    #[variant_id = 1]
    GameData(GameData),
    #[variant_id = 2]
    GameModifiers(GameModifiers),
    #[variant_id = 3]
    Command(ServerCommand),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReliablePacket {
    pub sequence: u16,
    pub message: ReliableMessage,
}

impl ReliablePacket {
    pub fn new(sequence: u16, message: ReliableMessage) -> Self {
        Self { sequence, message }
    }
}

impl Packet for ReliablePacket {
    const KIND: PacketKind = PacketKind::Reliable;

    fn sequence(&self) -> u16 {
        self.sequence
    }

    fn write_body<W: BitWrite>(&self, writer: &mut W) -> CodecResult<()> {
        self.message.bit_serialize(writer)
    }

    fn read_body<R: BitRead>(header: &PacketHeader, reader: &mut R) -> CodecResult<Self> {
        Ok(Self {
            sequence: header.sequence,
            message: ReliableMessage::bit_deserialize(reader)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CodecError;
    use crate::packet::HEADER_BITS;

    #[test]
    fn test_command_roundtrip() {
        for command in [
            ServerCommand::StartRace { start_frame: 600 },
            ServerCommand::SetPlayerCount { players: 4 },
            ServerCommand::SyncSeed { seed: 0xDEAD_BEEF },
            ServerCommand::AntiCheatHash {
                hash: StateHash(0x0123_4567_89AB_CDEF),
            },
            ServerCommand::Kick { reason: 2 },
        ] {
            let packet = ReliablePacket::new(9, ReliableMessage::Command(command));
            let bytes = packet.encode().unwrap();
            assert_eq!(ReliablePacket::decode(&bytes).unwrap(), packet);
        }
    }

    #[test]
    fn test_race_settings_packet_size() {
        let packet = ReliablePacket::new(
            1,
            ReliableMessage::RaceSettings(RaceSettings {
                laps: 3,
                announcer_enabled: true,
                stage: 12,
                item_boxes_enabled: true,
            }),
        );
        assert_eq!(packet.size_bits().unwrap(), HEADER_BITS + 4 + 15);
        let bytes = packet.encode().unwrap();
        assert_eq!(bytes.len(), 6);
        assert_eq!(ReliablePacket::decode(&bytes).unwrap(), packet);
    }

    #[test]
    fn test_unknown_message_tag_rejected() {
        let packet = ReliablePacket::new(
            0,
            ReliableMessage::Command(ServerCommand::Kick { reason: 0 }),
        );
        let mut bytes = packet.encode().unwrap();
        // message tag occupies bits 28..32
        bytes[3] |= 0x0F;
        assert_eq!(
            ReliablePacket::decode(&bytes).unwrap_err(),
            CodecError::UnknownVariant {
                type_name: "ReliableMessage",
                tag: 15
            }
        );
    }

    #[test]
    fn test_unreliable_bytes_rejected_as_reliable() {
        let bytes = crate::schema::UnreliablePacket::default().encode().unwrap();
        assert_eq!(
            ReliablePacket::decode(&bytes).unwrap_err(),
            CodecError::UnexpectedKind {
                expected: PacketKind::Reliable,
                found: PacketKind::Unreliable
            }
        );
    }
}
