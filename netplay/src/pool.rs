//! Reusable scratch buffers for encode, decode and hash calls.
//!
//! A [`ScratchBuffer`] guard hands its storage back to the pool when dropped,
//! so a rental is returned on every exit path, `?` errors included.
use std::cell::{Cell, RefCell};
use std::ops::{Deref, DerefMut};

use log::debug;

use crate::serialize::bit_io::BitBuffer;

/// Single-threaded pool of fixed-capacity byte buffers.
pub struct ScratchPool {
    free: RefCell<Vec<Vec<u8>>>,
    buffer_capacity: usize,
    max_retained: usize,
    misses: Cell<u64>,
}

impl ScratchPool {
    /// Pool renting `buffer_capacity`-byte buffers and keeping at most
    /// `max_retained` of them between rentals.
    pub fn new(buffer_capacity: usize, max_retained: usize) -> Self {
        Self {
            free: RefCell::new(Vec::with_capacity(max_retained)),
            buffer_capacity,
            max_retained,
            misses: Cell::new(0),
        }
    }

    pub fn acquire(&self) -> ScratchBuffer<'_> {
        let buffer = match self.free.borrow_mut().pop() {
            Some(storage) => BitBuffer::recycle(storage, self.buffer_capacity),
            None => {
                self.misses.set(self.misses.get() + 1);
                debug!(
                    "Scratch pool miss, allocating {} bytes",
                    self.buffer_capacity
                );
                BitBuffer::with_capacity(self.buffer_capacity)
            }
        };
        ScratchBuffer { pool: self, buffer }
    }

    fn release(&self, storage: Vec<u8>) {
        let mut free = self.free.borrow_mut();
        if free.len() < self.max_retained {
            free.push(storage);
        }
    }

    /// Buffers currently waiting for reuse.
    pub fn available(&self) -> usize {
        self.free.borrow().len()
    }

    /// Rentals that had to allocate.
    pub fn misses(&self) -> u64 {
        self.misses.get()
    }

    pub fn buffer_capacity(&self) -> usize {
        self.buffer_capacity
    }
}

/// A rented [`BitBuffer`]; returns its storage to the pool on drop.
pub struct ScratchBuffer<'a> {
    pool: &'a ScratchPool,
    buffer: BitBuffer,
}

impl Deref for ScratchBuffer<'_> {
    type Target = BitBuffer;

    fn deref(&self) -> &Self::Target {
        &self.buffer
    }
}

impl DerefMut for ScratchBuffer<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buffer
    }
}

impl Drop for ScratchBuffer<'_> {
    fn drop(&mut self) {
        // measure() owns no storage, so the swap allocates nothing.
        let buffer = std::mem::replace(&mut self.buffer, BitBuffer::measure());
        self.pool.release(buffer.into_storage());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CodecError;
    use crate::serialize::bit_io::BitWrite;

    #[test]
    fn test_storage_returns_on_drop() {
        let pool = ScratchPool::new(16, 2);
        {
            let mut scratch = pool.acquire();
            scratch.write_bits(0xAB, 8).unwrap();
            assert_eq!(pool.available(), 0);
        }
        assert_eq!(pool.available(), 1);
        assert_eq!(pool.misses(), 1);

        let scratch = pool.acquire();
        assert_eq!(scratch.serialized_size_bits(), 0);
        assert_eq!(scratch.capacity_bits(), 128);
        assert_eq!(pool.misses(), 1);
    }

    #[test]
    fn test_returns_on_error_path() {
        fn overflow(pool: &ScratchPool) -> Result<(), CodecError> {
            let mut scratch = pool.acquire();
            scratch.write_bits(0, 8)?;
            scratch.write_bits(0, 1)?;
            Ok(())
        }
        let pool = ScratchPool::new(1, 1);
        assert!(matches!(
            overflow(&pool),
            Err(CodecError::CapacityExceeded { .. })
        ));
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn test_retention_is_bounded() {
        let pool = ScratchPool::new(8, 2);
        let rentals: Vec<_> = (0..4).map(|_| pool.acquire()).collect();
        drop(rentals);
        assert_eq!(pool.available(), 2);
        assert_eq!(pool.misses(), 4);

        let unpooled = ScratchPool::new(8, 0);
        drop(unpooled.acquire());
        assert_eq!(unpooled.available(), 0);
    }
}
