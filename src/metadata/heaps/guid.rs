//! `#GUID` heap interner.
//!
//! The GUID heap is an array of 16-byte records addressed by 1-based index (ECMA-335
//! §II.24.2.5). Records are written as soon as they are interned. When building a delta
//! generation the buffer is first zero-padded up to the start offset of the previous
//! generation, so new indices continue where the previous heap ended.

use rustc_hash::FxHashMap;
use uguid::Guid;

use crate::{
    metadata::heaps::{GuidHandle, HeapBuffer, Reservation},
    utils::to_u32,
    Error::OutOfBounds,
    Result,
};

/// Size of a single `#GUID` heap record.
pub const GUID_SIZE: usize = 16;

/// Content-addressed GUID store.
#[derive(Debug)]
pub(crate) struct GuidHeap {
    guids: FxHashMap<Guid, GuidHandle>,
    buffer: HeapBuffer,
}

impl GuidHeap {
    /// Creates a heap zero-padded to `start_offset` bytes.
    pub(crate) fn new(start_offset: u32) -> Self {
        let mut buffer = HeapBuffer::with_capacity(start_offset as usize + GUID_SIZE);
        buffer.write_zeros(start_offset as usize);

        GuidHeap {
            guids: FxHashMap::default(),
            buffer,
        }
    }

    /// Returns the handle of `guid`, appending a record if it was not seen before.
    ///
    /// The all-zero GUID is never stored and always maps to the nil handle.
    pub(crate) fn get_or_add(&mut self, guid: Guid) -> Result<GuidHandle> {
        if guid == Guid::ZERO {
            return Ok(GuidHandle::NIL);
        }

        if let Some(&handle) = self.guids.get(&guid) {
            return Ok(handle);
        }

        let handle = self.next_handle()?;
        self.guids.insert(guid, handle);
        self.buffer.write_bytes(&guid.to_bytes());
        Ok(handle)
    }

    /// Reserves a zeroed record whose content is supplied later through
    /// [`GuidHeap::write_reserved`].
    ///
    /// Reserved records do not take part in deduplication.
    pub(crate) fn reserve(&mut self) -> Result<(GuidHandle, Reservation)> {
        let handle = self.next_handle()?;
        Ok((handle, self.buffer.reserve(GUID_SIZE)))
    }

    /// Fills a record obtained from [`GuidHeap::reserve`].
    pub(crate) fn write_reserved(&mut self, reservation: &Reservation, guid: Guid) -> Result<()> {
        if reservation.len() != GUID_SIZE {
            return Err(OutOfBounds);
        }

        self.buffer.patch(reservation, 0, &guid.to_bytes())
    }

    /// Unpadded size of the heap, including the zero-padding of previous generations.
    pub(crate) fn size(&self) -> usize {
        self.buffer.len()
    }

    /// Number of distinct interned GUIDs.
    pub(crate) fn len(&self) -> usize {
        self.guids.len()
    }

    pub(crate) fn as_slice(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    fn next_handle(&self) -> Result<GuidHandle> {
        Ok(GuidHandle::new(to_u32(self.buffer.len() / GUID_SIZE + 1)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    const MVID: Guid = uguid::guid!("d437908e-65e6-487c-9735-7bdff699bea5");
    const ENC_ID: Guid = uguid::guid!("AAAAAAAA-AAAA-AAAA-AAAA-AAAAAAAAAAAA");

    #[test]
    fn zero_guid_is_nil() {
        let mut heap = GuidHeap::new(0);
        assert_eq!(heap.get_or_add(Guid::ZERO).unwrap(), GuidHandle::NIL);
        assert_eq!(heap.size(), 0);
    }

    #[test]
    fn indices_are_one_based() {
        let mut heap = GuidHeap::new(0);
        assert_eq!(heap.get_or_add(MVID).unwrap().value(), 1);
        assert_eq!(heap.get_or_add(ENC_ID).unwrap().value(), 2);
        assert_eq!(heap.get_or_add(MVID).unwrap().value(), 1);
        assert_eq!(heap.size(), 32);
        assert_eq!(heap.len(), 2);

        #[rustfmt::skip]
        let expected: [u8; 16] = [
            0x8e, 0x90, 0x37, 0xd4, 0xe6, 0x65, 0x7c, 0x48, 0x97, 0x35, 0x7b, 0xdf, 0xf6, 0x99, 0xbe, 0xa5,
        ];
        assert_eq!(&heap.as_slice()[..16], &expected);
    }

    #[test]
    fn delta_generation_is_zero_padded() {
        let mut heap = GuidHeap::new(32);
        assert_eq!(heap.size(), 32);
        assert!(heap.as_slice().iter().all(|&b| b == 0));

        assert_eq!(heap.get_or_add(MVID).unwrap().value(), 3);
        assert_eq!(heap.size(), 48);
    }

    #[test]
    fn reserved_record_is_patched() {
        let mut heap = GuidHeap::new(0);
        let (handle, reservation) = heap.reserve().unwrap();
        let next = heap.get_or_add(ENC_ID).unwrap();

        assert_eq!(handle.value(), 1);
        assert_eq!(next.value(), 2);
        assert_eq!(&heap.as_slice()[..16], &[0u8; 16]);

        heap.write_reserved(&reservation, MVID).unwrap();
        assert_eq!(&heap.as_slice()[..16], &MVID.to_bytes());
    }

    #[test]
    fn reservation_of_another_size_is_rejected() {
        let mut heap = GuidHeap::new(0);
        let mut other = HeapBuffer::new();
        let foreign = other.reserve(4);

        assert!(matches!(
            heap.write_reserved(&foreign, MVID),
            Err(Error::OutOfBounds)
        ));
    }
}
