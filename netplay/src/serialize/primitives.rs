//! Native-width codecs for primitives, `Option<T>` and fixed-size arrays.

use super::bit_io::{BitRead, BitWrite};
use super::{BitDeserialize, BitSerialize};
use crate::error::{CodecError, CodecResult};

impl BitSerialize for bool {
    fn bit_serialize<W: BitWrite>(&self, writer: &mut W) -> CodecResult<()> {
        writer.write_bit(*self)
    }
}

impl BitDeserialize for bool {
    fn bit_deserialize<R: BitRead>(reader: &mut R) -> CodecResult<Self> {
        reader.read_bit()
    }
}

macro_rules! impl_unsigned {
    ($($ty:ty),*) => {
        $(
            impl BitSerialize for $ty {
                fn bit_serialize<W: BitWrite>(&self, writer: &mut W) -> CodecResult<()> {
                    writer.write_bits(*self as u64, <$ty>::BITS as usize)
                }
            }

            impl BitDeserialize for $ty {
                fn bit_deserialize<R: BitRead>(reader: &mut R) -> CodecResult<Self> {
                    Ok(reader.read_bits(<$ty>::BITS as usize)? as $ty)
                }
            }
        )*
    };
}

macro_rules! impl_signed {
    ($($ty:ty),*) => {
        $(
            impl BitSerialize for $ty {
                fn bit_serialize<W: BitWrite>(&self, writer: &mut W) -> CodecResult<()> {
                    // `as u64` sign-extends; the writer keeps only the low bits.
                    writer.write_bits(*self as u64, <$ty>::BITS as usize)
                }
            }

            impl BitDeserialize for $ty {
                fn bit_deserialize<R: BitRead>(reader: &mut R) -> CodecResult<Self> {
                    Ok(reader.read_bits(<$ty>::BITS as usize)? as $ty)
                }
            }
        )*
    };
}

impl_unsigned!(u8, u16, u32, u64);
impl_signed!(i8, i16, i32, i64);

impl BitSerialize for f32 {
    fn bit_serialize<W: BitWrite>(&self, writer: &mut W) -> CodecResult<()> {
        writer.write_bits(self.to_bits() as u64, 32)
    }
}

impl BitDeserialize for f32 {
    fn bit_deserialize<R: BitRead>(reader: &mut R) -> CodecResult<Self> {
        Ok(f32::from_bits(reader.read_bits(32)? as u32))
    }
}

impl BitSerialize for f64 {
    fn bit_serialize<W: BitWrite>(&self, writer: &mut W) -> CodecResult<()> {
        writer.write_bits(self.to_bits(), 64)
    }
}

impl BitDeserialize for f64 {
    fn bit_deserialize<R: BitRead>(reader: &mut R) -> CodecResult<Self> {
        Ok(f64::from_bits(reader.read_bits(64)?))
    }
}

/// One presence bit, then the value when present.
impl<T: BitSerialize> BitSerialize for Option<T> {
    fn bit_serialize<W: BitWrite>(&self, writer: &mut W) -> CodecResult<()> {
        match self {
            Some(value) => {
                writer.write_bit(true)?;
                value.bit_serialize(writer)
            }
            None => writer.write_bit(false),
        }
    }
}

impl<T: BitDeserialize> BitDeserialize for Option<T> {
    fn bit_deserialize<R: BitRead>(reader: &mut R) -> CodecResult<Self> {
        if reader.read_bit()? {
            Ok(Some(T::bit_deserialize(reader)?))
        } else {
            Ok(None)
        }
    }
}

impl<T: BitSerialize, const N: usize> BitSerialize for [T; N] {
    fn bit_serialize<W: BitWrite>(&self, writer: &mut W) -> CodecResult<()> {
        for item in self {
            item.bit_serialize(writer)?;
        }
        Ok(())
    }
}

impl<T: BitDeserialize, const N: usize> BitDeserialize for [T; N] {
    fn bit_deserialize<R: BitRead>(reader: &mut R) -> CodecResult<Self> {
        let mut items = Vec::with_capacity(N);
        for _ in 0..N {
            items.push(T::bit_deserialize(reader)?);
        }
        let len = items.len();
        items.try_into().map_err(|_| CodecError::LengthExceeded {
            field: "array",
            len,
            max: N,
        })
    }
}
