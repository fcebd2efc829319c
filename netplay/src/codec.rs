//! Field codecs beyond native primitives: fixed-point quantization, vectors
//! and presence bitmasks.
//!
//! A [`Quantizer`] is a stateless description of how one kind of float field
//! is squeezed into a fixed bit width. Fields opt in with
//! `#[quantize = "PATH"]`, where `PATH` names a `const Quantizer`.

use std::f64::consts::TAU;

use log::debug;

use crate::error::CodecResult;
use crate::serialize::bit_io::{BitRead, BitWrite};
use netplay_macros::NetworkSerialize;

/// Widest quantized representation; keeps the integer math exact in `f64`.
pub const MAX_QUANTIZED_BITS: u8 = 32;

/// Fixed-point mapping of a float onto an unsigned integer of `bits` bits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Quantizer {
    /// Linear map of `[min, max]` onto `0..=2^bits - 1`. Out-of-range input
    /// saturates to the nearest bound.
    Range { min: f32, max: f32, bits: u8 },
    /// Angle in radians taken modulo 2π and mapped onto `0..2^bits`.
    /// Decodes into `[0, 2π)`.
    Angle { bits: u8 },
}

impl Quantizer {
    pub const fn range(min: f32, max: f32, bits: u8) -> Self {
        assert!(bits > 0 && bits <= MAX_QUANTIZED_BITS);
        assert!(min < max);
        Quantizer::Range { min, max, bits }
    }

    pub const fn angle(bits: u8) -> Self {
        assert!(bits > 0 && bits <= MAX_QUANTIZED_BITS);
        Quantizer::Angle { bits }
    }

    pub const fn bits(&self) -> usize {
        match self {
            Quantizer::Range { bits, .. } | Quantizer::Angle { bits } => *bits as usize,
        }
    }

    fn max_code(&self) -> u64 {
        (1u64 << self.bits()) - 1
    }

    /// Distance between two adjacent representable values.
    pub fn step(&self) -> f64 {
        match *self {
            Quantizer::Range { min, max, .. } => (max as f64 - min as f64) / self.max_code() as f64,
            Quantizer::Angle { bits } => TAU / (1u64 << bits) as f64,
        }
    }

    /// Worst-case absolute error of an in-range round trip.
    pub fn max_error(&self) -> f32 {
        (self.step() / 2.0) as f32
    }

    pub fn quantize(&self, value: f32) -> u64 {
        if value.is_nan() {
            debug!("Quantizing NaN as 0 ({:?})", self);
            return 0;
        }
        match *self {
            Quantizer::Range { min, max, .. } => {
                let clamped = if value < min || value > max {
                    debug!("Saturating {} to [{}, {}]", value, min, max);
                    value.clamp(min, max)
                } else {
                    value
                };
                let t = (clamped as f64 - min as f64) / (max as f64 - min as f64);
                ((t * self.max_code() as f64).round() as u64).min(self.max_code())
            }
            Quantizer::Angle { bits } => {
                let turns = (value as f64).rem_euclid(TAU) / TAU;
                let full = 1u64 << bits;
                // Rounding up to a full turn wraps to zero.
                ((turns * full as f64).round() as u64) % full
            }
        }
    }

    pub fn dequantize(&self, code: u64) -> f32 {
        let code = code & self.max_code();
        match *self {
            Quantizer::Range { min, .. } => (min as f64 + code as f64 * self.step()) as f32,
            Quantizer::Angle { .. } => (code as f64 * self.step()) as f32,
        }
    }

    pub fn write<W: BitWrite>(&self, value: f32, writer: &mut W) -> CodecResult<()> {
        writer.write_bits(self.quantize(value), self.bits())
    }

    pub fn read<R: BitRead>(&self, reader: &mut R) -> CodecResult<f32> {
        Ok(self.dequantize(reader.read_bits(self.bits())?))
    }
}

/// Values encodable through a [`Quantizer`]; vectors apply it to each axis.
pub trait Quantize: Sized {
    fn write_quantized<W: BitWrite>(&self, quantizer: &Quantizer, writer: &mut W)
        -> CodecResult<()>;
    fn read_quantized<R: BitRead>(quantizer: &Quantizer, reader: &mut R) -> CodecResult<Self>;
}

impl Quantize for f32 {
    fn write_quantized<W: BitWrite>(
        &self,
        quantizer: &Quantizer,
        writer: &mut W,
    ) -> CodecResult<()> {
        quantizer.write(*self, writer)
    }

    fn read_quantized<R: BitRead>(quantizer: &Quantizer, reader: &mut R) -> CodecResult<Self> {
        quantizer.read(reader)
    }
}

/// Two-component vector, serialized X then Y.
#[derive(Debug, Clone, Copy, PartialEq, Default, NetworkSerialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Largest per-axis absolute difference.
    pub fn max_abs_diff(&self, other: &Vec2) -> f32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }
}

impl Quantize for Vec2 {
    fn write_quantized<W: BitWrite>(
        &self,
        quantizer: &Quantizer,
        writer: &mut W,
    ) -> CodecResult<()> {
        quantizer.write(self.x, writer)?;
        quantizer.write(self.y, writer)
    }

    fn read_quantized<R: BitRead>(quantizer: &Quantizer, reader: &mut R) -> CodecResult<Self> {
        let x = quantizer.read(reader)?;
        let y = quantizer.read(reader)?;
        Ok(Vec2 { x, y })
    }
}

/// Three-component vector, serialized X, Y, then Z.
#[derive(Debug, Clone, Copy, PartialEq, Default, NetworkSerialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Largest per-axis absolute difference.
    pub fn max_abs_diff(&self, other: &Vec3) -> f32 {
        (self.x - other.x)
            .abs()
            .max((self.y - other.y).abs())
            .max((self.z - other.z).abs())
    }
}

impl Quantize for Vec3 {
    fn write_quantized<W: BitWrite>(
        &self,
        quantizer: &Quantizer,
        writer: &mut W,
    ) -> CodecResult<()> {
        quantizer.write(self.x, writer)?;
        quantizer.write(self.y, writer)?;
        quantizer.write(self.z, writer)
    }

    fn read_quantized<R: BitRead>(quantizer: &Quantizer, reader: &mut R) -> CodecResult<Self> {
        let x = quantizer.read(reader)?;
        let y = quantizer.read(reader)?;
        let z = quantizer.read(reader)?;
        Ok(Vec3 { x, y, z })
    }
}

/// Maximum number of flags in one [`PresenceMask`].
pub const MAX_PRESENCE_BITS: usize = 64;

/// Fixed-size set of presence flags written as one `len`-bit field.
///
/// Flag 0 is the first bit on the wire. The flag order is the declaration
/// order of the optional fields it guards and is part of the wire contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PresenceMask {
    word: u64,
    len: u8,
}

impl PresenceMask {
    pub const fn new(len: usize) -> Self {
        assert!(len <= MAX_PRESENCE_BITS);
        Self {
            word: 0,
            len: len as u8,
        }
    }

    fn flag(&self, index: usize) -> u64 {
        assert!(index < self.len(), "presence flag {index} out of range");
        1u64 << (self.len() - 1 - index)
    }

    pub fn set(&mut self, index: usize, present: bool) {
        let flag = self.flag(index);
        if present {
            self.word |= flag;
        } else {
            self.word &= !flag;
        }
    }

    pub fn is_set(&self, index: usize) -> bool {
        self.word & self.flag(index) != 0
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of flags set.
    pub fn count(&self) -> u32 {
        self.word.count_ones()
    }

    pub fn write<W: BitWrite>(&self, writer: &mut W) -> CodecResult<()> {
        writer.write_bits(self.word, self.len())
    }

    pub fn read<R: BitRead>(len: usize, reader: &mut R) -> CodecResult<Self> {
        let mut mask = Self::new(len);
        mask.word = reader.read_bits(len)?;
        Ok(mask)
    }
}
