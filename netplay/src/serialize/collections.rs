//! Length-prefixed `Vec<T>`.
//!
//! Derived fields override the prefix width with `#[max_len = N]`; the trait
//! impl here is the fallback for nested vectors.

use super::bit_io::{BitRead, BitWrite};
use super::{BitDeserialize, BitSerialize};
use crate::error::{CodecError, CodecResult};

/// Length prefix width used when no `max_len` is declared.
pub const DEFAULT_LEN_BITS: usize = 16;

/// Largest length representable by [`DEFAULT_LEN_BITS`].
pub const DEFAULT_MAX_LEN: usize = 65535;

impl<T: BitSerialize> BitSerialize for Vec<T> {
    fn bit_serialize<W: BitWrite>(&self, writer: &mut W) -> CodecResult<()> {
        if self.len() > DEFAULT_MAX_LEN {
            return Err(CodecError::LengthExceeded {
                field: "Vec",
                len: self.len(),
                max: DEFAULT_MAX_LEN,
            });
        }
        writer.write_bits(self.len() as u64, DEFAULT_LEN_BITS)?;
        for item in self {
            item.bit_serialize(writer)?;
        }
        Ok(())
    }
}

impl<T: BitDeserialize> BitDeserialize for Vec<T> {
    fn bit_deserialize<R: BitRead>(reader: &mut R) -> CodecResult<Self> {
        let len = reader.read_bits(DEFAULT_LEN_BITS)? as usize;
        // Never trust the prefix for the allocation size.
        let mut items = Vec::with_capacity(len.min(reader.remaining_bits()));
        for _ in 0..len {
            items.push(T::bit_deserialize(reader)?);
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialize::bit_io::BitBuffer;

    #[test]
    fn test_vec_roundtrip() {
        let values = vec![3u16, 500, 65535];
        let mut buf = BitBuffer::with_capacity(16);
        values.bit_serialize(&mut buf).unwrap();
        assert_eq!(buf.serialized_size_bits(), DEFAULT_LEN_BITS + 48);
        buf.rewind();
        assert_eq!(Vec::<u16>::bit_deserialize(&mut buf).unwrap(), values);
    }

    #[test]
    fn test_truncated_vec_fails() {
        let mut buf = BitBuffer::with_capacity(8);
        buf.write_bits(1000, DEFAULT_LEN_BITS).unwrap();
        buf.write_bits(1, 8).unwrap();
        buf.rewind();
        assert!(matches!(
            Vec::<u8>::bit_deserialize(&mut buf),
            Err(CodecError::Underflow { .. })
        ));
    }
}
