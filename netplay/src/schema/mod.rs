//! Packet schemas and the game structures they carry.
//!
//! Unreliable packets carry per-player state every tick; reliable packets
//! carry configuration and commands. Field order in every derive is the wire
//! order.

mod game;
mod modifiers;
mod player;
mod reliable;

pub use game::{
    CharacterTypeStats, ExtremeGear, GameData, GearLevelStats, GearType, RaceSettings,
    RunningPhysics, RunningPhysics2, MAX_GEARS, ORIGINAL_NUMBER_OF_GEARS,
};
pub use modifiers::{
    EasingSetting, GameModifiers, ItemBoxAttribute, RingLossBehaviour, SlipstreamSettings,
    SpeedShoeProperties, SpeedShoesMode,
};
pub use player::{
    PlayerSlots, PlayerSnapshot, PlayerState, UnreliablePacket, UnreliablePlayer, AIR_BITS,
    MAX_AIR, MAX_RINGS, PLAYER_COUNT_BITS, POSITION, RINGS_BITS, ROTATION, VELOCITY,
};
pub use reliable::{ReliableMessage, ReliablePacket, ServerCommand};
