//! Property tests for packet encoding and state hashing
//!
//! Arbitrary snapshots must round-trip within quantization tolerance, and
//! arbitrary network input must be rejected without panicking.

use netplay::schema::{ServerCommand, POSITION, ROTATION, VELOCITY};
use netplay::{
    CodecConfig, Packet, PacketCodec, PlayerState, RaceSettings, ReliableMessage, ReliablePacket,
    StateHash, UnreliablePacket, UnreliablePlayer, Vec2, Vec3, MAX_PLAYERS,
};
use proptest::prelude::*;
use std::f32::consts::TAU;

fn player_state() -> impl Strategy<Value = PlayerState> {
    prop::sample::select(vec![
        PlayerState::None,
        PlayerState::NormalOnBoard,
        PlayerState::Jump,
        PlayerState::Grinding,
        PlayerState::Fly,
        PlayerState::TrickJumpRamp,
        PlayerState::Turbulence,
        PlayerState::Retire,
        PlayerState::ElectricShockCrash,
        PlayerState::Running,
    ])
}

fn player() -> impl Strategy<Value = UnreliablePlayer> {
    let axis = -16384.0f32..16384.0;
    let speed = -8.0f32..8.0;
    (
        prop::option::of(
            (axis.clone(), axis.clone(), axis).prop_map(|(x, y, z)| Vec3::new(x, y, z)),
        ),
        prop::option::of(0.0f32..TAU),
        prop::option::of(0u8..128),
        prop::option::of(0u32..(1 << 18)),
        prop::option::of((speed.clone(), speed).prop_map(|(x, y)| Vec2::new(x, y))),
        prop::option::of(player_state()),
    )
        .prop_map(
            |(position, rotation, rings, air, velocity, state)| UnreliablePlayer {
                position,
                rotation,
                rings,
                air,
                velocity,
                state,
            },
        )
}

/// Distance between two angles on the circle.
fn angle_distance(a: f32, b: f32) -> f32 {
    let d = (a - b).abs() % TAU;
    d.min(TAU - d)
}

proptest! {
    /// Property: Player packets roundtrip within quantization tolerance
    #[test]
    fn player_packet_roundtrips(
        sequence in any::<u16>(),
        players in prop::collection::vec(player(), 0..=MAX_PLAYERS),
    ) {
        let packet = UnreliablePacket::new(sequence, players);
        let bytes = packet.encode().unwrap();
        prop_assert_eq!(bytes.len(), packet.size_bits().unwrap().div_ceil(8));

        let decoded = UnreliablePacket::decode(&bytes).unwrap();
        prop_assert_eq!(decoded.header(), packet.header());
        prop_assert_eq!(decoded.players.len(), packet.players.len());

        for (got, sent) in decoded.players.iter().zip(&packet.players) {
            // Absent fields stay absent, present fields stay present.
            prop_assert_eq!(got.position.is_some(), sent.position.is_some());
            prop_assert_eq!(got.rotation.is_some(), sent.rotation.is_some());
            prop_assert_eq!(got.velocity.is_some(), sent.velocity.is_some());
            prop_assert_eq!(got.rings, sent.rings);
            prop_assert_eq!(got.air, sent.air);
            prop_assert_eq!(got.state, sent.state);

            if let (Some(a), Some(b)) = (got.position, sent.position) {
                prop_assert!(a.max_abs_diff(&b) <= POSITION.max_error() + 1e-3);
            }
            if let (Some(a), Some(b)) = (got.rotation, sent.rotation) {
                prop_assert!(angle_distance(a, b) <= ROTATION.max_error() + 1e-5);
            }
            if let (Some(a), Some(b)) = (got.velocity, sent.velocity) {
                prop_assert!(a.max_abs_diff(&b) <= VELOCITY.max_error() + 1e-5);
            }
        }
    }

    /// Property: Commands roundtrip exactly
    #[test]
    fn command_roundtrips(
        sequence in any::<u16>(),
        frame in any::<u32>(),
        seed in any::<u32>(),
        hash in any::<u64>(),
        players in 0u8..16,
    ) {
        for command in [
            ServerCommand::StartRace { start_frame: frame },
            ServerCommand::SyncSeed { seed },
            ServerCommand::AntiCheatHash { hash: StateHash(hash) },
            ServerCommand::SetPlayerCount { players },
        ] {
            let packet = ReliablePacket::new(sequence, ReliableMessage::Command(command));
            prop_assert_eq!(ReliablePacket::decode(&packet.encode().unwrap()).unwrap(), packet);
        }
    }

    /// Property: Race settings roundtrip exactly
    #[test]
    fn race_settings_roundtrip(
        laps in 0u8..128,
        announcer_enabled in any::<bool>(),
        stage in 0u8..64,
        item_boxes_enabled in any::<bool>(),
    ) {
        let settings = RaceSettings { laps, announcer_enabled, stage, item_boxes_enabled };
        let packet = ReliablePacket::new(0, ReliableMessage::RaceSettings(settings));
        prop_assert_eq!(ReliablePacket::decode(&packet.encode().unwrap()).unwrap(), packet);
    }

    /// Property: Arbitrary bytes don't crash decoders
    #[test]
    fn arbitrary_bytes_dont_crash(
        random_bytes in prop::collection::vec(any::<u8>(), 0..512),
    ) {
        let _ = UnreliablePacket::decode(&random_bytes);
        let _ = ReliablePacket::decode(&random_bytes);
        let codec = PacketCodec::new(CodecConfig::default()).unwrap();
        let _ = codec.decode(&random_bytes);
    }

    /// Property: Hashing is a pure function of the bytes
    #[test]
    fn hash_is_deterministic(
        bytes in prop::collection::vec(any::<u8>(), 0..1024),
    ) {
        let first = StateHash::of(&bytes);
        prop_assert_eq!(first, StateHash::of(&bytes));
    }

    /// Property: Flipping any bit changes the hash
    #[test]
    fn hash_detects_single_bit_flip(
        bytes in prop::collection::vec(any::<u8>(), 1..256),
        index in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let mut flipped = bytes.clone();
        let i = index.index(bytes.len());
        flipped[i] ^= 1 << bit;
        prop_assert_ne!(StateHash::of(&bytes), StateHash::of(&flipped));
    }
}
