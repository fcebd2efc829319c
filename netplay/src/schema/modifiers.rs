//! Host-selected gameplay modifiers. Only the data layout lives here; the
//! game applies them.
use netplay_macros::NetworkSerialize;

/// Contents of an item box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, NetworkSerialize)]
#[bits = 4]
pub enum ItemBoxAttribute {
    Ring10,
    Ring20,
    Ring30,
    #[default]
    Ring100,
    AirMax,
    Air30,
    Air50,
    SpeedShoes,
    Invincibility,
    Magnet,
    Bomb,
}

/// Ring loss applied on a hit or death: a flat amount before, a percentage
/// of what is left, then a flat amount after.
#[derive(Debug, Clone, Copy, PartialEq, Default, NetworkSerialize)]
pub struct RingLossBehaviour {
    pub enabled: bool,
    #[bits = 8]
    pub ring_loss_before: u8,
    pub ring_loss_percentage: f32,
    #[bits = 8]
    pub ring_loss_after: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, NetworkSerialize)]
#[bits = 3]
pub enum EasingSetting {
    #[default]
    Linear,
    InQuad,
    OutQuad,
    InOutQuad,
    InCubic,
    OutCubic,
    InOutSine,
}

#[derive(Debug, Clone, Copy, PartialEq, NetworkSerialize)]
pub struct SlipstreamSettings {
    pub enabled: bool,
    /// Degrees either side of the leader's heading.
    pub max_angle: f32,
    pub max_distance: f32,
    pub max_strength: f32,
    pub easing: EasingSetting,
}

impl Default for SlipstreamSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            max_angle: 45.0,
            max_distance: 80.0,
            max_strength: 0.01,
            easing: EasingSetting::OutCubic,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, NetworkSerialize)]
#[bits = 3]
pub enum SpeedShoesMode {
    #[default]
    Vanilla,
    Fixed,
    Additive,
    Multiplicative,
    /// Whichever of multiplicative or fixed yields more speed.
    MultiplyOrFixed,
}

#[derive(Debug, Clone, Copy, PartialEq, NetworkSerialize)]
pub struct SpeedShoeProperties {
    pub mode: SpeedShoesMode,
    pub fixed_speed: f32,
    pub additive_speed: f32,
    /// Fraction of current speed added; 0.2 is +20%.
    pub multiplicative_speed: f32,
    pub multiplicative_min_speed: f32,
}

impl Default for SpeedShoeProperties {
    fn default() -> Self {
        Self {
            mode: SpeedShoesMode::Vanilla,
            fixed_speed: 1.075,
            additive_speed: 0.10,
            multiplicative_speed: 0.20,
            multiplicative_min_speed: 0.95,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, NetworkSerialize)]
pub struct GameModifiers {
    pub disable_tornadoes: bool,
    pub disable_attacks: bool,
    pub no_turbulence: bool,
    pub always_turbulence: bool,
    pub disable_small_turbulence: bool,
    pub replace_air_max_box: bool,
    pub air_max_replacement: ItemBoxAttribute,
    pub replace_ring100_box: bool,
    pub ring100_replacement: ItemBoxAttribute,
    pub hit_ring_loss: RingLossBehaviour,
    pub death_ring_loss: RingLossBehaviour,
    pub slipstream: SlipstreamSettings,
    pub speed_shoes: SpeedShoeProperties,
}

impl GameModifiers {
    /// Item box contents after applying the replacement toggles.
    pub fn replace_item_box(&self, attribute: ItemBoxAttribute) -> ItemBoxAttribute {
        match attribute {
            ItemBoxAttribute::AirMax if self.replace_air_max_box => self.air_max_replacement,
            ItemBoxAttribute::Ring100 if self.replace_ring100_box => self.ring100_replacement,
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialize::{bit_io::BitBuffer, measure_bits, BitDeserialize, BitSerialize};

    #[test]
    fn test_defaults_match_vanilla_game() {
        let shoes = SpeedShoeProperties::default();
        assert_eq!(shoes.mode, SpeedShoesMode::Vanilla);
        assert_eq!(shoes.fixed_speed, 1.075);
        assert_eq!(shoes.multiplicative_min_speed, 0.95);
        assert!(!GameModifiers::default().slipstream.enabled);
    }

    #[test]
    fn test_modifiers_roundtrip() {
        let modifiers = GameModifiers {
            no_turbulence: true,
            replace_air_max_box: true,
            air_max_replacement: ItemBoxAttribute::Bomb,
            hit_ring_loss: RingLossBehaviour {
                enabled: true,
                ring_loss_before: 5,
                ring_loss_percentage: 50.0,
                ring_loss_after: 10,
            },
            slipstream: SlipstreamSettings {
                enabled: true,
                easing: EasingSetting::InOutSine,
                ..Default::default()
            },
            speed_shoes: SpeedShoeProperties {
                mode: SpeedShoesMode::MultiplyOrFixed,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut buf = BitBuffer::with_capacity(64);
        modifiers.bit_serialize(&mut buf).unwrap();
        buf.rewind();
        assert_eq!(GameModifiers::bit_deserialize(&mut buf).unwrap(), modifiers);
    }

    #[test]
    fn test_modifiers_size() {
        let ring_loss = 1 + 8 + 32 + 8;
        let slipstream = 1 + 3 * 32 + 3;
        let shoes = 3 + 4 * 32;
        let expected = 7 + 2 * 4 + 2 * ring_loss + slipstream + shoes;
        assert_eq!(measure_bits(&GameModifiers::default()).unwrap(), expected);
    }

    #[test]
    fn test_item_box_replacement() {
        let modifiers = GameModifiers {
            replace_ring100_box: true,
            ring100_replacement: ItemBoxAttribute::Magnet,
            air_max_replacement: ItemBoxAttribute::Bomb,
            ..Default::default()
        };
        assert_eq!(
            modifiers.replace_item_box(ItemBoxAttribute::Ring100),
            ItemBoxAttribute::Magnet
        );
        assert_eq!(
            modifiers.replace_item_box(ItemBoxAttribute::AirMax),
            ItemBoxAttribute::AirMax
        );
    }
}
