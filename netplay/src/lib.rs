//! # netplay
//!
//! Bitpacked, versioned game-state packets for a racing netplay layer.
//!
//! ## Features
//!
//! - **Bit-level serialization** with `#[derive(NetworkSerialize)]`,
//!   `#[bits = N]` and fixed-point `#[quantize = "PATH"]` fields
//! - **Presence bitmasks**: per-player optional fields cost one bit when absent
//! - **Two packet kinds**: unreliable per-tick player state, reliable game
//!   configuration and host commands, behind a versioned 28-bit header
//! - **Anti-cheat hashing** over the canonical encoding of [`GameData`], never
//!   over memory
//! - **Scratch pooling**: encode and decode rent fixed-capacity buffers that
//!   return on every exit path
//!
//! ## Quick Start
//!
//! ```no_run
//! use netplay::prelude::*;
//!
//! let codec = PacketCodec::new(CodecConfig::default()).unwrap();
//! let player = UnreliablePlayer {
//!     position: Some(Vec3::new(-49.85, -41.55, 167.27)),
//!     rings: Some(52),
//!     ..Default::default()
//! };
//! let bytes = codec.encode(&UnreliablePacket::new(1, [player])).unwrap();
//!
//! match codec.decode(&bytes).unwrap() {
//!     AnyPacket::Unreliable(packet) => println!("{} players", packet.players.len()),
//!     AnyPacket::Reliable(packet) => println!("{:?}", packet.message),
//! }
//! ```

extern crate self as netplay;

pub mod anticheat;
pub mod codec;
pub mod codec_facade;
pub mod config;
pub mod error;
pub mod packet;
pub mod pool;
pub mod schema;
pub mod serialize;


pub use anticheat::StateHash;
pub use codec::{PresenceMask, Quantize, Quantizer, Vec2, Vec3};
pub use codec_facade::{AnyPacket, PacketCodec};
pub use config::{CodecConfig, ConfigError, MAX_PLAYERS};
pub use error::{CodecError, CodecResult};
pub use packet::{peek_header, Packet, PacketHeader, PacketKind, HEADER_BITS, SCHEMA_VERSION};
pub use pool::{ScratchBuffer, ScratchPool};
pub use schema::{
    GameData, GameModifiers, PlayerSnapshot, PlayerState, RaceSettings, ReliableMessage,
    ReliablePacket, ServerCommand, UnreliablePacket, UnreliablePlayer,
};

pub use netplay_macros::NetworkSerialize;

pub use serialize::bit_io::{BitBuffer, BitRead, BitWrite};
pub use serialize::{measure_bits, BitDeserialize, BitSerialize};

/// Prelude: import everything commonly needed.
pub mod prelude {
    pub use crate::{
        AnyPacket, BitBuffer, BitDeserialize, BitRead, BitSerialize, BitWrite, CodecConfig,
        CodecError, GameData, Packet, PacketCodec, PacketKind, PlayerState, Quantizer,
        ReliableMessage, ReliablePacket, StateHash, UnreliablePacket, UnreliablePlayer, Vec2,
        Vec3, NetworkSerialize,
    };
}
