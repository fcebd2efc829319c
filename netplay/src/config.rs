//! Codec configuration constants and structures.
//!
//! [`CodecConfig`] sizes the scratch buffers rented for each encode, bounds
//! the scratch pool, and caps how many player slots a decoded packet may
//! carry.

/// Scratch buffer size in bytes; generous so a full reliable packet always fits.
pub const DEFAULT_SCRATCH_CAPACITY: usize = 32 * 1024;
pub const DEFAULT_POOL_SIZE: usize = 4;
pub const DEFAULT_MAX_PLAYERS: usize = MAX_PLAYERS;

/// Player slots a single unreliable packet can describe.
pub const MAX_PLAYERS: usize = 8;
pub const MAX_SCRATCH_CAPACITY: usize = 1024 * 1024;

/// Configuration validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidScratchCapacity,
    InvalidMaxPlayers,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidScratchCapacity => {
                write!(f, "scratch_capacity must be > 0 and <= {MAX_SCRATCH_CAPACITY}")
            }
            ConfigError::InvalidMaxPlayers => {
                write!(f, "max_players must be > 0 and <= {MAX_PLAYERS}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Tunables for [`PacketCodec`](crate::PacketCodec).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecConfig {
    /// Bytes per rented scratch buffer; encodes needing more fail with
    /// `CapacityExceeded`.
    pub scratch_capacity: usize,
    /// Scratch buffers kept for reuse. Zero disables pooling.
    pub pool_size: usize,
    /// Player slots accepted when decoding an unreliable packet.
    pub max_players: usize,
}

impl CodecConfig {
    /// Validates the configuration, returning an error if any values are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scratch_capacity == 0 || self.scratch_capacity > MAX_SCRATCH_CAPACITY {
            return Err(ConfigError::InvalidScratchCapacity);
        }
        if self.max_players == 0 || self.max_players > MAX_PLAYERS {
            return Err(ConfigError::InvalidMaxPlayers);
        }
        Ok(())
    }

    pub fn with_scratch_capacity(mut self, bytes: usize) -> Self {
        self.scratch_capacity = bytes;
        self
    }
    pub fn with_pool_size(mut self, size: usize) -> Self {
        self.pool_size = size;
        self
    }
    pub fn with_max_players(mut self, max: usize) -> Self {
        self.max_players = max;
        self
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            scratch_capacity: DEFAULT_SCRATCH_CAPACITY,
            pool_size: DEFAULT_POOL_SIZE,
            max_players: DEFAULT_MAX_PLAYERS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(CodecConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_rejects_bad_values() {
        let config = CodecConfig::default().with_scratch_capacity(0);
        assert_eq!(config.validate(), Err(ConfigError::InvalidScratchCapacity));

        let config = CodecConfig::default().with_scratch_capacity(MAX_SCRATCH_CAPACITY + 1);
        assert_eq!(config.validate(), Err(ConfigError::InvalidScratchCapacity));

        let config = CodecConfig::default().with_max_players(MAX_PLAYERS + 1);
        assert_eq!(config.validate(), Err(ConfigError::InvalidMaxPlayers));

        let config = CodecConfig::default().with_max_players(0);
        assert!(config.validate().unwrap_err().to_string().contains("max_players"));
    }

    #[test]
    fn test_zero_pool_is_allowed() {
        assert!(CodecConfig::default().with_pool_size(0).validate().is_ok());
    }
}
