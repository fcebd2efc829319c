//! Content hash over the canonical encoding of game state.
//!
//! Peers compare hashes of their [`GameData`] before a race. Hashing always
//! goes through the bit encoding, never through in-memory representations,
//! so two peers with the same logical state agree regardless of platform.
use std::fmt;

use crate::error::CodecResult;
use crate::packet::SCHEMA_VERSION;
use crate::schema::GameData;
use crate::serialize::{bit_io::BitBuffer, BitSerialize};
use netplay_macros::NetworkSerialize;

const DOMAIN: &[u8] = b"netplay-state";

/// 64-bit digest of a canonical encoding.
///
/// Equality is over the encoded bits, not `PartialEq` on the value. Floats
/// encode as their IEEE-754 bit patterns, so `0.0` and `-0.0` hash
/// differently although they compare equal, and NaNs with different
/// payloads hash differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, NetworkSerialize)]
pub struct StateHash(pub u64);

impl StateHash {
    /// Digest of already-encoded bytes. Pure: equal input, equal output.
    pub fn of(bytes: &[u8]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(DOMAIN);
        hasher.update(&[SCHEMA_VERSION]);
        hasher.update(bytes);
        let digest = hasher.finalize();
        let mut word = [0u8; 8];
        word.copy_from_slice(&digest.as_bytes()[..8]);
        StateHash(u64::from_le_bytes(word))
    }

    /// Encodes `value` into `scratch` (cleared first) and hashes the result.
    pub fn of_canonical<T: BitSerialize>(value: &T, scratch: &mut BitBuffer) -> CodecResult<Self> {
        scratch.clear();
        value.bit_serialize(scratch)?;
        Ok(Self::of(scratch.as_bytes()))
    }
}

impl fmt::Display for StateHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl GameData {
    /// Anti-cheat hash of this game data.
    pub fn state_hash(&self) -> CodecResult<StateHash> {
        StateHash::of_canonical(self, &mut BitBuffer::new())
    }
}
