//! Per-player race state sent every tick over the unreliable channel.
use smallvec::SmallVec;

use crate::codec::{Quantizer, Vec2, Vec3};
use crate::config::MAX_PLAYERS;
use crate::error::{CodecError, CodecResult};
use crate::packet::{Packet, PacketHeader, PacketKind};
use crate::serialize::{
    bit_io::{BitRead, BitWrite},
    BitDeserialize, BitSerialize,
};
use log::debug;
use netplay_macros::NetworkSerialize;

/// World position, per axis.
pub const POSITION: Quantizer = Quantizer::range(-16384.0, 16384.0, 24);
/// Heading in radians.
pub const ROTATION: Quantizer = Quantizer::angle(16);
/// Planar velocity, per axis.
pub const VELOCITY: Quantizer = Quantizer::range(-8.0, 8.0, 16);

pub const PLAYER_COUNT_BITS: usize = 4;
pub const RINGS_BITS: usize = 7;
pub const AIR_BITS: usize = 18;

/// Largest ring count representable on the wire.
pub const MAX_RINGS: u8 = (1 << RINGS_BITS) - 1;
/// Largest air value representable on the wire.
pub const MAX_AIR: u32 = (1 << AIR_BITS) - 1;

/// Movement state of a racer. Tags are fixed; new states take new ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, NetworkSerialize)]
#[bits = 5]
pub enum PlayerState {
    #[default]
    #[variant_id = 0]
    None,
    #[variant_id = 1]
    NormalOnBoard,
    #[variant_id = 2]
    Jump,
    #[variant_id = 3]
    FreeFalling,
    #[variant_id = 4]
    Grinding,
    #[variant_id = 5]
    RotateSection,
    #[variant_id = 6]
    Fly,
    #[variant_id = 7]
    Attacking,
    #[variant_id = 8]
    AttackedByPlayer,
    #[variant_id = 9]
    TrickJumpVertical,
    #[variant_id = 10]
    TrickJumpHorizontal,
    #[variant_id = 11]
    TrickJumpFlatVertical,
    #[variant_id = 12]
    TrickJumpFlatHorizontal,
    #[variant_id = 13]
    TrickJumpRamp,
    #[variant_id = 14]
    TrickJumpTurbulence,
    #[variant_id = 15]
    TurbulenceTrick,
    #[variant_id = 16]
    TurbulenceTrick2,
    #[variant_id = 17]
    Turbulence,
    #[variant_id = 18]
    Retire,
    #[variant_id = 19]
    ElectricShock,
    #[variant_id = 20]
    ElectricShockCrash,
    #[variant_id = 21]
    Reset,
    #[variant_id = 22]
    Cruise,
    #[variant_id = 23]
    Running,
}

/// One player slot. Every field is optional; a 6-bit presence mask leads
/// the slot and only present fields follow.
#[derive(Debug, Clone, Copy, PartialEq, Default, NetworkSerialize)]
#[presence_mask]
pub struct UnreliablePlayer {
    #[quantize = "POSITION"]
    pub position: Option<Vec3>,
    #[quantize = "ROTATION"]
    pub rotation: Option<f32>,
    #[bits = 7]
    pub rings: Option<u8>,
    #[bits = 18]
    pub air: Option<u32>,
    #[quantize = "VELOCITY"]
    pub velocity: Option<Vec2>,
    pub state: Option<PlayerState>,
}

/// Complete state of one player as held by the sender.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlayerSnapshot {
    pub position: Vec3,
    pub rotation: f32,
    pub rings: u8,
    pub air: u32,
    pub velocity: Vec2,
    pub state: PlayerState,
}

fn same_vec3(q: &Quantizer, a: &Vec3, b: &Vec3) -> bool {
    q.quantize(a.x) == q.quantize(b.x)
        && q.quantize(a.y) == q.quantize(b.y)
        && q.quantize(a.z) == q.quantize(b.z)
}

fn same_vec2(q: &Quantizer, a: &Vec2, b: &Vec2) -> bool {
    q.quantize(a.x) == q.quantize(b.x) && q.quantize(a.y) == q.quantize(b.y)
}

impl UnreliablePlayer {
    /// Slot carrying every field of `snapshot`.
    pub fn full(snapshot: &PlayerSnapshot) -> Self {
        Self {
            position: Some(snapshot.position),
            rotation: Some(snapshot.rotation),
            rings: Some(snapshot.rings),
            air: Some(snapshot.air),
            velocity: Some(snapshot.velocity),
            state: Some(snapshot.state),
        }
    }

    /// Slot carrying only the fields of `current` whose wire value differs
    /// from `previous`.
    pub fn changes_since(current: &PlayerSnapshot, previous: &PlayerSnapshot) -> Self {
        Self {
            position: (!same_vec3(&POSITION, &current.position, &previous.position))
                .then_some(current.position),
            rotation: (ROTATION.quantize(current.rotation) != ROTATION.quantize(previous.rotation))
                .then_some(current.rotation),
            rings: (current.rings & MAX_RINGS != previous.rings & MAX_RINGS)
                .then_some(current.rings),
            air: (current.air & MAX_AIR != previous.air & MAX_AIR).then_some(current.air),
            velocity: (!same_vec2(&VELOCITY, &current.velocity, &previous.velocity))
                .then_some(current.velocity),
            state: (current.state != previous.state).then_some(current.state),
        }
    }

    /// True when no field is present; the slot still occupies its 6 mask bits.
    pub fn is_empty(&self) -> bool {
        self.present_fields() == 0
    }

    pub fn present_fields(&self) -> usize {
        [
            self.position.is_some(),
            self.rotation.is_some(),
            self.rings.is_some(),
            self.air.is_some(),
            self.velocity.is_some(),
            self.state.is_some(),
        ]
        .into_iter()
        .filter(|present| *present)
        .count()
    }
}

impl PlayerSnapshot {
    /// Overwrites the fields present in `update`, keeping the rest.
    pub fn apply(&mut self, update: &UnreliablePlayer) {
        if let Some(position) = update.position {
            self.position = position;
        }
        if let Some(rotation) = update.rotation {
            self.rotation = rotation;
        }
        if let Some(rings) = update.rings {
            self.rings = rings;
        }
        if let Some(air) = update.air {
            self.air = air;
        }
        if let Some(velocity) = update.velocity {
            self.velocity = velocity;
        }
        if let Some(state) = update.state {
            self.state = state;
        }
    }
}

pub type PlayerSlots = SmallVec<[UnreliablePlayer; MAX_PLAYERS]>;

/// Per-tick player state for up to [`MAX_PLAYERS`] slots. Slot order is the
/// player index.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UnreliablePacket {
    pub sequence: u16,
    pub players: PlayerSlots,
}

impl UnreliablePacket {
    pub fn new(sequence: u16, players: impl IntoIterator<Item = UnreliablePlayer>) -> Self {
        Self {
            sequence,
            players: players.into_iter().collect(),
        }
    }

    fn check_count(count: usize) -> CodecResult<()> {
        if count > MAX_PLAYERS {
            return Err(CodecError::LengthExceeded {
                field: "players",
                len: count,
                max: MAX_PLAYERS,
            });
        }
        Ok(())
    }
}

impl Packet for UnreliablePacket {
    const KIND: PacketKind = PacketKind::Unreliable;

    fn sequence(&self) -> u16 {
        self.sequence
    }

    fn write_body<W: BitWrite>(&self, writer: &mut W) -> CodecResult<()> {
        Self::check_count(self.players.len())?;
        writer.write_bits(self.players.len() as u64, PLAYER_COUNT_BITS)?;
        for player in &self.players {
            player.bit_serialize(writer)?;
        }
        Ok(())
    }

    fn read_body<R: BitRead>(header: &PacketHeader, reader: &mut R) -> CodecResult<Self> {
        let count = reader.read_bits(PLAYER_COUNT_BITS)? as usize;
        if let Err(err) = Self::check_count(count) {
            debug!("Rejecting unreliable packet {}: {}", header.sequence, err);
            return Err(err);
        }
        let mut players = PlayerSlots::new();
        for _ in 0..count {
            players.push(UnreliablePlayer::bit_deserialize(reader)?);
        }
        Ok(Self {
            sequence: header.sequence,
            players,
        })
    }
}
