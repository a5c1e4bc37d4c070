//! Growable byte accumulator used to stage bytes in both directions.
//!
//! A [`ByteBuffer`] is owned by exactly one connection (or one channel) and is
//! cleared and reused between flush cycles instead of being reallocated. When
//! it runs out of room it grows by doubling its capacity.

use bytes::{Bytes, BytesMut};

/// Smallest capacity a buffer grows to on its first reservation
const MIN_CAPACITY: usize = 64;

#[derive(Debug, Default)]
pub struct ByteBuffer {
    bytes: BytesMut,
}

impl ByteBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { bytes: BytesMut::with_capacity(capacity) }
    }

    /// Current logical size, in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.bytes.capacity()
    }

    /// The bytes accumulated so far
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn push(&mut self, byte: u8) {
        self.ensure_additional(1);
        self.bytes.extend_from_slice(&[byte]);
    }

    pub fn extend_from_slice(&mut self, src: &[u8]) {
        self.ensure_additional(src.len());
        self.bytes.extend_from_slice(src);
    }

    /// Drops the content but keeps the allocation for the next cycle.
    #[inline]
    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    /// Takes the accumulated bytes out as an immutable [`Bytes`], leaving the
    /// buffer empty.
    pub fn split(&mut self) -> Bytes {
        self.bytes.split().freeze()
    }

    /// Access to the underlying `BytesMut`, for codecs that decode in place.
    #[inline]
    pub fn as_bytes_mut(&mut self) -> &mut BytesMut {
        &mut self.bytes
    }

    fn ensure_additional(&mut self, additional: usize) {
        let required = self.bytes.len() + additional;
        let capacity = self.bytes.capacity();
        if required <= capacity {
            return;
        }

        let mut target = capacity.max(MIN_CAPACITY);
        while target < required {
            target = target.saturating_mul(2);
        }
        self.bytes.reserve(target - self.bytes.len());
    }
}

impl AsRef<[u8]> for ByteBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}
