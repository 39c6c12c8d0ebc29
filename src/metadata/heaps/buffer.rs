//! Growable byte buffer backing the metadata heaps.
//!
//! [`HeapBuffer`] is the append primitive all heap interners are written against. Besides
//! appending raw bytes and compressed integers it can reserve a zero-filled byte range and
//! hand back a [`Reservation`] token. The token is an offset into the buffer, not a pointer,
//! so the buffer can keep growing while reservations are outstanding and be patched later.
//!
//! # Examples
//!
//! ```rust
//! use cilheaps::metadata::heaps::HeapBuffer;
//!
//! let mut buffer = HeapBuffer::new();
//! buffer.write_u8(0);
//! let reserved = buffer.reserve(4);
//! buffer.write_bytes(b"tail");
//!
//! buffer.patch(&reserved, 0, &[1, 2, 3, 4])?;
//! assert_eq!(buffer.as_slice(), &[0, 1, 2, 3, 4, b't', b'a', b'i', b'l']);
//! # Ok::<(), cilheaps::Error>(())
//! ```

use crate::{
    utils::{encode_compressed_uint, heap_padding},
    Error::OutOfBounds,
    Result,
};

/// A byte range reserved in a [`HeapBuffer`] to be filled in later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    start: usize,
    len: usize,
}

impl Reservation {
    /// Offset of the first reserved byte within the buffer.
    #[must_use]
    pub fn start(&self) -> usize {
        self.start
    }

    /// Number of reserved bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the reservation covers no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Append-only byte arena with reserve-then-patch support.
#[derive(Debug, Default, Clone)]
pub struct HeapBuffer {
    data: Vec<u8>,
}

impl HeapBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty buffer with room for `capacity` bytes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        HeapBuffer {
            data: Vec::with_capacity(capacity),
        }
    }

    /// Current length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if nothing has been written yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The bytes written so far.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the buffer and returns its bytes.
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Appends a single byte.
    pub fn write_u8(&mut self, value: u8) {
        self.data.push(value);
    }

    /// Appends raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Appends `count` zero bytes.
    pub fn write_zeros(&mut self, count: usize) {
        self.data.resize(self.data.len() + count, 0);
    }

    /// Appends UTF-16 code units in little-endian byte order.
    pub fn write_utf16(&mut self, units: &[u16]) {
        self.data.reserve(units.len() * 2);
        for unit in units {
            self.data.extend_from_slice(&unit.to_le_bytes());
        }
    }

    /// Appends `value` as an ECMA-335 compressed unsigned integer.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::CompressedOverflow`] if `value` exceeds `0x1FFF_FFFF`.
    pub fn write_compressed_uint(&mut self, value: u32) -> Result<()> {
        let mut encoded = [0u8; 4];
        let len = encode_compressed_uint(value, &mut encoded)?;
        self.data.extend_from_slice(&encoded[..len]);
        Ok(())
    }

    /// Appends zero bytes until the length is a multiple of 4, returning the padding size.
    pub fn align_heap(&mut self) -> usize {
        let padding = heap_padding(self.data.len());
        self.write_zeros(padding);
        padding
    }

    /// Reserves `len` zero-filled bytes at the current end of the buffer.
    pub fn reserve(&mut self, len: usize) -> Reservation {
        let start = self.data.len();
        self.write_zeros(len);
        Reservation { start, len }
    }

    /// Overwrites bytes inside `reservation`, starting `offset` bytes into it.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OutOfBounds`] if the write would leave the reserved range
    /// or the reservation does not belong to this buffer.
    pub fn patch(&mut self, reservation: &Reservation, offset: usize, bytes: &[u8]) -> Result<()> {
        let end = offset.checked_add(bytes.len()).ok_or(OutOfBounds)?;
        if end > reservation.len || reservation.start + reservation.len > self.data.len() {
            return Err(OutOfBounds);
        }

        let start = reservation.start + offset;
        self.data[start..start + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    /// Writes `value` as a compressed integer inside `reservation` at `offset`, returning
    /// the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not encodable or the write leaves the reservation.
    pub fn patch_compressed_uint(
        &mut self,
        reservation: &Reservation,
        offset: usize,
        value: u32,
    ) -> Result<usize> {
        let mut encoded = [0u8; 4];
        let len = encode_compressed_uint(value, &mut encoded)?;
        self.patch(reservation, offset, &encoded[..len])?;
        Ok(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn append_primitives() {
        let mut buffer = HeapBuffer::with_capacity(16);
        assert!(buffer.is_empty());

        buffer.write_u8(0x01);
        buffer.write_bytes(&[0x02, 0x03]);
        buffer.write_zeros(2);
        buffer.write_utf16(&[0x0041, 0x20AC]);
        buffer.write_compressed_uint(0x80).unwrap();

        assert_eq!(
            buffer.as_slice(),
            &[0x01, 0x02, 0x03, 0x00, 0x00, 0x41, 0x00, 0xAC, 0x20, 0x80, 0x80]
        );
        assert_eq!(buffer.len(), 11);
    }

    #[test]
    fn align_heap_pads_with_zeros() {
        let mut buffer = HeapBuffer::new();
        buffer.write_bytes(&[0xFF; 5]);

        assert_eq!(buffer.align_heap(), 3);
        assert_eq!(buffer.as_slice(), &[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 0]);
        assert_eq!(buffer.align_heap(), 0);
    }

    #[test]
    fn reservation_survives_growth() {
        let mut buffer = HeapBuffer::new();
        buffer.write_u8(0xAA);
        let reserved = buffer.reserve(16);
        buffer.write_bytes(&[0xBB; 64]);

        assert_eq!(reserved.start(), 1);
        assert_eq!(reserved.len(), 16);
        buffer.patch(&reserved, 0, &[0x11; 16]).unwrap();

        assert_eq!(buffer.as_slice()[0], 0xAA);
        assert_eq!(&buffer.as_slice()[1..17], &[0x11; 16]);
        assert_eq!(buffer.as_slice()[17], 0xBB);
    }

    #[test]
    fn patch_outside_reservation_fails() {
        let mut buffer = HeapBuffer::new();
        let reserved = buffer.reserve(4);
        buffer.write_u8(0xCC);

        assert!(matches!(
            buffer.patch(&reserved, 2, &[1, 2, 3]),
            Err(Error::OutOfBounds)
        ));
        assert!(matches!(
            buffer.patch(&reserved, usize::MAX, &[1]),
            Err(Error::OutOfBounds)
        ));
        assert_eq!(buffer.as_slice(), &[0, 0, 0, 0, 0xCC]);
    }

    #[test]
    fn patch_compressed_uint_in_place() {
        let mut buffer = HeapBuffer::new();
        let reserved = buffer.reserve(6);

        assert_eq!(buffer.patch_compressed_uint(&reserved, 0, 0x7F).unwrap(), 1);
        assert_eq!(buffer.patch_compressed_uint(&reserved, 1, 0x4000).unwrap(), 4);
        assert_eq!(buffer.as_slice(), &[0x7F, 0xC0, 0x00, 0x40, 0x00, 0x00]);
    }
}
