//! Server-authoritative game configuration: gear table, running physics and
//! race settings. Sent reliably at race start and hashed for anti-cheat.
use netplay_macros::NetworkSerialize;

/// Gears shipped with the unmodified game.
pub const ORIGINAL_NUMBER_OF_GEARS: usize = 41;
/// Upper bound on the gear table, custom gears included.
pub const MAX_GEARS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, NetworkSerialize)]
pub struct RaceSettings {
    #[bits = 7]
    pub laps: u8,
    pub announcer_enabled: bool,
    #[bits = 6]
    pub stage: u8,
    pub item_boxes_enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, NetworkSerialize)]
#[bits = 2]
pub enum GearType {
    #[default]
    Board,
    Skate,
    Bike,
}

/// Stats of one gear level (levels 1 to 3).
#[derive(Debug, Clone, Copy, PartialEq, Default, NetworkSerialize)]
pub struct GearLevelStats {
    #[bits = 20]
    pub max_air: u32,
    pub passive_air_drain: i32,
    pub drift_air_cost: i32,
    pub boost_cost: i32,
    pub tornado_cost: i32,
    pub drift_dash_speed: f32,
    pub boost_speed: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, NetworkSerialize)]
pub struct ExtremeGear {
    pub gear_type: GearType,
    /// Bitset of characters allowed to pick this gear.
    #[bits = 16]
    pub who_can_select: u16,
    pub speed_handling_multiplier: f32,
    pub weight: f32,
    #[bits = 8]
    pub extra_type_flags: u8,
    #[bits = 8]
    pub gear_model: u8,
    pub turn_low_speed_multiplier: f32,
    pub levels: [GearLevelStats; 3],
}

#[derive(Debug, Clone, Copy, PartialEq, Default, NetworkSerialize)]
pub struct RunningPhysics {
    pub gravity: f32,
    pub max_speed: f32,
    pub drift_dash_threshold: f32,
    pub offroad_speed_multiplier: f32,
    pub wall_bounce_speed_multiplier: f32,
    #[bits = 8]
    pub drift_dash_frames: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, NetworkSerialize)]
pub struct CharacterTypeStats {
    pub speed_level_1: f32,
    pub speed_level_2: f32,
    pub speed_level_3: f32,
    pub acceleration: f32,
}

/// Per character type (speed, fly, power) speed curves.
#[derive(Debug, Clone, Copy, PartialEq, Default, NetworkSerialize)]
pub struct RunningPhysics2 {
    pub type_stats: [CharacterTypeStats; 3],
}

/// Everything that must agree between peers before a race starts.
///
/// Never partially optional: its canonical encoding is the anti-cheat hash
/// input.
#[derive(Debug, Clone, PartialEq, Default, NetworkSerialize)]
pub struct GameData {
    #[max_len = 64]
    pub gears: Vec<ExtremeGear>,
    pub running_physics_1: RunningPhysics,
    pub running_physics_2: RunningPhysics2,
    pub race_settings: RaceSettings,
}

impl GameData {
    /// Game data with the stock number of (zeroed) gears.
    pub fn with_original_gears() -> Self {
        Self {
            gears: vec![ExtremeGear::default(); ORIGINAL_NUMBER_OF_GEARS],
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CodecError;
    use crate::serialize::{bit_io::BitBuffer, measure_bits, BitDeserialize, BitSerialize};

    const LEVEL_BITS: usize = 20 + 4 * 32 + 2 * 32;
    const GEAR_BITS: usize = 2 + 16 + 32 + 32 + 8 + 8 + 32 + 3 * LEVEL_BITS;

    #[test]
    fn test_block_sizes() {
        assert_eq!(measure_bits(&RaceSettings::default()).unwrap(), 15);
        assert_eq!(measure_bits(&GearLevelStats::default()).unwrap(), LEVEL_BITS);
        assert_eq!(measure_bits(&ExtremeGear::default()).unwrap(), GEAR_BITS);
        assert_eq!(measure_bits(&RunningPhysics::default()).unwrap(), 5 * 32 + 8);
        assert_eq!(measure_bits(&RunningPhysics2::default()).unwrap(), 12 * 32);
    }

    #[test]
    fn test_game_data_size() {
        let data = GameData::with_original_gears();
        let expected = 7 + ORIGINAL_NUMBER_OF_GEARS * GEAR_BITS + (5 * 32 + 8) + 12 * 32 + 15;
        assert_eq!(measure_bits(&data).unwrap(), expected);
    }

    #[test]
    fn test_negative_costs_roundtrip() {
        let gear = ExtremeGear {
            gear_type: GearType::Bike,
            levels: [GearLevelStats {
                max_air: 200_000,
                passive_air_drain: -16,
                drift_air_cost: -1,
                boost_cost: i32::MIN,
                tornado_cost: 3_000,
                drift_dash_speed: 0.35,
                boost_speed: -0.0,
            }; 3],
            ..Default::default()
        };
        let mut buf = BitBuffer::with_capacity(256);
        gear.bit_serialize(&mut buf).unwrap();
        buf.rewind();
        let decoded = ExtremeGear::bit_deserialize(&mut buf).unwrap();
        assert_eq!(decoded, gear);
        assert!(decoded.levels[0].boost_speed.is_sign_negative());
    }

    #[test]
    fn test_max_air_wraps_to_20_bits() {
        let stats = GearLevelStats {
            max_air: (1 << 20) + 5,
            ..Default::default()
        };
        let mut buf = BitBuffer::with_capacity(64);
        stats.bit_serialize(&mut buf).unwrap();
        buf.rewind();
        assert_eq!(GearLevelStats::bit_deserialize(&mut buf).unwrap().max_air, 5);
    }

    #[test]
    fn test_gear_table_bounded() {
        let data = GameData {
            gears: vec![ExtremeGear::default(); MAX_GEARS + 1],
            ..Default::default()
        };
        assert_eq!(
            measure_bits(&data).unwrap_err(),
            CodecError::LengthExceeded {
                field: "gears",
                len: MAX_GEARS + 1,
                max: MAX_GEARS
            }
        );
    }

    #[test]
    fn test_unused_gear_type_rejected() {
        let mut buf = BitBuffer::with_capacity(1);
        crate::serialize::bit_io::BitWrite::write_bits(&mut buf, 3, 2).unwrap();
        assert_eq!(
            GearType::bit_deserialize(&mut buf).unwrap_err(),
            CodecError::UnknownVariant {
                type_name: "GearType",
                tag: 3
            }
        );
    }
}
