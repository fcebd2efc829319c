//! Bitpacked serialization for game-state packets.
//!
//! Provides [`BitBuffer`](bit_io::BitBuffer) for sub-byte serialization, the
//! [`BitSerialize`] and [`BitDeserialize`] traits, and the
//! `#[derive(NetworkSerialize)]` proc macro with `#[bits = N]` and
//! `#[quantize = "PATH"]` field attributes.
//!
//! Bit order is MSB-first: a `w`-bit value is written most significant bit
//! first, filling each byte from its high bit down. Every peer relies on this.

use crate::error::CodecResult;

mod collections;
mod primitives;

pub use collections::{DEFAULT_LEN_BITS, DEFAULT_MAX_LEN};

pub mod bit_io {
    use crate::config::DEFAULT_SCRATCH_CAPACITY;
    use crate::error::{CodecError, CodecResult};
    use log::{debug, trace};

    /// Widest value a single `write_bits`/`read_bits` call can move.
    pub const MAX_BITS_PER_CALL: usize = 64;

    /// Trait for writing individual bits and bit-packed values.
    pub trait BitWrite {
        fn write_bit(&mut self, bit: bool) -> CodecResult<()>;
        fn write_bits(&mut self, value: u64, bits: usize) -> CodecResult<()>;
        fn bit_pos(&self) -> usize;
    }

    /// Trait for reading individual bits and bit-packed values.
    pub trait BitRead {
        fn read_bit(&mut self) -> CodecResult<bool>;
        fn read_bits(&mut self, bits: usize) -> CodecResult<u64>;
        fn bit_pos(&self) -> usize;
        /// Bits left before the readable limit.
        fn remaining_bits(&self) -> usize;
    }

    /// Fixed-capacity bit cursor over a byte buffer, with optional measure-only mode.
    ///
    /// Writes advance `bit_pos`; reads advance an independent read cursor and
    /// may never pass `bit_pos`. A buffer built with [`BitBuffer::from_bytes`]
    /// starts full, so everything received is readable and nothing more can be
    /// written.
    pub struct BitBuffer {
        storage: Vec<u8>,
        capacity_bits: usize,
        bit_pos: usize,
        read_pos: usize,
        measure_only: bool,
    }

    impl Default for BitBuffer {
        fn default() -> Self {
            Self::new()
        }
    }

    impl BitBuffer {
        /// Buffer with the default scratch capacity.
        pub fn new() -> Self {
            Self::with_capacity(DEFAULT_SCRATCH_CAPACITY)
        }

        /// Buffer holding at most `bytes` bytes.
        pub fn with_capacity(bytes: usize) -> Self {
            BitBuffer {
                storage: vec![0; bytes],
                capacity_bits: bytes * 8,
                bit_pos: 0,
                read_pos: 0,
                measure_only: false,
            }
        }

        /// Reuse an existing allocation as a `bytes`-byte buffer.
        ///
        /// Old contents are not cleared; the writer masks every bit it touches.
        pub fn recycle(mut storage: Vec<u8>, bytes: usize) -> Self {
            storage.resize(bytes, 0);
            BitBuffer {
                storage,
                capacity_bits: bytes * 8,
                bit_pos: 0,
                read_pos: 0,
                measure_only: false,
            }
        }

        /// Create a measure-only buffer that tracks serialized size without allocation.
        pub fn measure() -> Self {
            BitBuffer {
                storage: Vec::new(),
                capacity_bits: usize::MAX,
                bit_pos: 0,
                read_pos: 0,
                measure_only: true,
            }
        }

        /// Wrap received bytes for reading. All `8 * len` bits are readable.
        pub fn from_bytes(bytes: Vec<u8>) -> Self {
            let bits = bytes.len() * 8;
            BitBuffer {
                storage: bytes,
                capacity_bits: bits,
                bit_pos: bits,
                read_pos: 0,
                measure_only: false,
            }
        }

        pub fn from_slice(bytes: &[u8]) -> Self {
            Self::from_bytes(bytes.to_vec())
        }

        /// Replace the contents with received bytes, making all of them readable.
        pub fn load(&mut self, bytes: &[u8]) -> CodecResult<()> {
            let bits = bytes.len() * 8;
            if self.measure_only || bits > self.capacity_bits {
                return Err(CodecError::CapacityExceeded {
                    bit_pos: 0,
                    requested: bits,
                    capacity: if self.measure_only { 0 } else { self.capacity_bits },
                });
            }
            self.storage[..bytes.len()].copy_from_slice(bytes);
            self.bit_pos = bits;
            self.read_pos = 0;
            Ok(())
        }

        /// Returns the serialized size in bits.
        pub fn serialized_size_bits(&self) -> usize {
            self.bit_pos
        }

        /// Returns the serialized size in bytes (rounded up).
        pub fn serialized_size_bytes(&self) -> usize {
            self.bit_pos.div_ceil(8)
        }

        pub fn capacity_bits(&self) -> usize {
            self.capacity_bits
        }

        pub fn is_measure_only(&self) -> bool {
            self.measure_only
        }

        /// Move the read cursor back to the start, keeping written bits.
        pub fn rewind(&mut self) {
            self.read_pos = 0;
        }

        /// Reset both cursors so the buffer can be written again.
        pub fn clear(&mut self) {
            self.bit_pos = 0;
            self.read_pos = 0;
        }

        /// Written bytes; bits past `bit_pos` in the last byte are zero.
        pub fn as_bytes(&self) -> &[u8] {
            if self.measure_only {
                return &[];
            }
            &self.storage[..self.serialized_size_bytes()]
        }

        pub fn into_bytes(mut self) -> Vec<u8> {
            let len = if self.measure_only {
                0
            } else {
                self.serialized_size_bytes()
            };
            self.storage.truncate(len);
            self.storage
        }

        /// Give back the full backing allocation, e.g. to a scratch pool.
        pub fn into_storage(self) -> Vec<u8> {
            self.storage
        }

        pub fn to_bit_string(&self, bit_length: usize) -> String {
            let mut bit_string = String::new();
            let bit_length = bit_length.min(self.bit_pos);
            for i in 0..bit_length {
                if i > 0 && i % 8 == 0 {
                    bit_string.push(' ');
                }
                let bit = (self.storage[i / 8] >> (7 - i % 8)) & 1;
                bit_string.push(if bit == 1 { '1' } else { '0' });
            }
            bit_string
        }

        fn readable_bits(&self) -> usize {
            if self.measure_only {
                0
            } else {
                self.bit_pos
            }
        }

        fn check_width(bits: usize) -> CodecResult<()> {
            if bits > MAX_BITS_PER_CALL {
                return Err(CodecError::InvalidWidth { width: bits });
            }
            Ok(())
        }

        fn reserve_write(&self, bits: usize) -> CodecResult<()> {
            if bits > self.capacity_bits - self.bit_pos {
                debug!(
                    "Capacity exceeded: {} bits at {} of {}",
                    bits, self.bit_pos, self.capacity_bits
                );
                return Err(CodecError::CapacityExceeded {
                    bit_pos: self.bit_pos,
                    requested: bits,
                    capacity: self.capacity_bits,
                });
            }
            Ok(())
        }

        fn reserve_read(&self, bits: usize) -> CodecResult<()> {
            let available = self.readable_bits().saturating_sub(self.read_pos);
            if bits > available {
                debug!(
                    "Buffer underflow: {} bits at read_pos {} ({} available)",
                    bits, self.read_pos, available
                );
                return Err(CodecError::Underflow {
                    read_pos: self.read_pos,
                    requested: bits,
                    available,
                });
            }
            Ok(())
        }

        fn write_bytes_fast(&mut self, value: u64, bytes: usize) {
            let start = self.bit_pos / 8;
            for i in 0..bytes {
                self.storage[start + i] = (value >> (8 * (bytes - 1 - i))) as u8;
            }
            self.bit_pos += bytes * 8;
        }

        fn write_bits_optimized(&mut self, value: u64, bits: usize) {
            let mut remaining_bits = bits;

            while remaining_bits > 0 {
                let byte_pos = self.bit_pos / 8;
                let bit_offset = self.bit_pos % 8;
                let bits_available_in_byte = 8 - bit_offset;
                let bits_to_write = remaining_bits.min(bits_available_in_byte);

                let chunk = ((value >> (remaining_bits - bits_to_write))
                    & ((1u64 << bits_to_write) - 1)) as u8;
                let byte_shift = bits_available_in_byte - bits_to_write;

                // Clear from the cursor to the end of the byte so padding stays zero.
                let tail_mask = 0xFFu8 >> bit_offset;
                let byte = &mut self.storage[byte_pos];
                *byte = (*byte & !tail_mask) | (chunk << byte_shift);

                self.bit_pos += bits_to_write;
                remaining_bits -= bits_to_write;
            }
        }

        fn read_bytes_fast(&mut self, bytes: usize) -> u64 {
            let start_byte = self.read_pos / 8;
            let mut value = 0u64;
            for i in 0..bytes {
                value = (value << 8) | self.storage[start_byte + i] as u64;
            }
            self.read_pos += bytes * 8;
            value
        }

        fn read_bits_optimized(&mut self, bits: usize) -> u64 {
            let mut remaining_bits = bits;
            let mut value = 0u64;

            while remaining_bits > 0 {
                let byte_pos = self.read_pos / 8;
                let bit_offset = self.read_pos % 8;
                let bits_available_in_byte = 8 - bit_offset;
                let bits_to_read = remaining_bits.min(bits_available_in_byte);

                let byte_shift = bits_available_in_byte - bits_to_read;
                let mask = ((1u16 << bits_to_read) - 1) as u8;
                let chunk = (self.storage[byte_pos] >> byte_shift) & mask;

                value = (value << bits_to_read) | chunk as u64;
                self.read_pos += bits_to_read;
                remaining_bits -= bits_to_read;
            }

            value
        }
    }

    impl BitWrite for BitBuffer {
        fn write_bit(&mut self, bit: bool) -> CodecResult<()> {
            self.write_bits(bit as u64, 1)
        }

        fn write_bits(&mut self, value: u64, bits: usize) -> CodecResult<()> {
            Self::check_width(bits)?;
            if bits == 0 {
                return Ok(());
            }
            self.reserve_write(bits)?;

            if self.measure_only {
                self.bit_pos += bits;
                return Ok(());
            }

            let val = if bits >= MAX_BITS_PER_CALL {
                value
            } else {
                value & ((1u64 << bits) - 1)
            };

            trace!("Write {} bits (value {}) at bit {}", bits, val, self.bit_pos);

            if self.bit_pos.is_multiple_of(8) && bits.is_multiple_of(8) {
                self.write_bytes_fast(val, bits / 8);
            } else {
                self.write_bits_optimized(val, bits);
            }
            Ok(())
        }

        fn bit_pos(&self) -> usize {
            self.bit_pos
        }
    }

    impl BitRead for BitBuffer {
        fn read_bit(&mut self) -> CodecResult<bool> {
            Ok(self.read_bits(1)? != 0)
        }

        fn read_bits(&mut self, bits: usize) -> CodecResult<u64> {
            Self::check_width(bits)?;
            if bits == 0 {
                return Ok(0);
            }
            self.reserve_read(bits)?;

            let value = if self.read_pos.is_multiple_of(8) && bits.is_multiple_of(8) {
                self.read_bytes_fast(bits / 8)
            } else {
                self.read_bits_optimized(bits)
            };
            trace!("Read {} bits (value {}) ending at bit {}", bits, value, self.read_pos);
            Ok(value)
        }

        #[allow(clippy::misnamed_getters)]
        fn bit_pos(&self) -> usize {
            self.read_pos
        }

        fn remaining_bits(&self) -> usize {
            self.readable_bits().saturating_sub(self.read_pos)
        }
    }

}

pub trait BitSerialize {
    fn bit_serialize<W: bit_io::BitWrite>(&self, writer: &mut W) -> CodecResult<()>;
}

pub trait BitDeserialize: Sized {
    fn bit_deserialize<R: bit_io::BitRead>(reader: &mut R) -> CodecResult<Self>;
}

/// Interpret the low `bits` of `value` as a two's-complement integer.
pub fn sign_extend(value: u64, bits: usize) -> i64 {
    if bits == 0 || bits >= 64 {
        return value as i64;
    }
    let shift = 64 - bits;
    ((value << shift) as i64) >> shift
}

/// Bits `value` would occupy when serialized.
pub fn measure_bits<T: BitSerialize>(value: &T) -> CodecResult<usize> {
    let mut buffer = bit_io::BitBuffer::measure();
    value.bit_serialize(&mut buffer)?;
    Ok(buffer.serialized_size_bits())
}
