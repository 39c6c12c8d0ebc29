//! `#Blob` heap interner and finalizer.
//!
//! Blobs are assigned their offset the moment they are first interned, in bump-allocator
//! fashion, but their bytes stay in the dedup table until emission. The finalizer then
//! reserves the whole (aligned) heap at once and places every blob at its known offset, so
//! no second ordering pass is needed.
//!
//! Each entry is encoded as a compressed length followed by the raw bytes (ECMA-335
//! §II.24.2.4). Offset 0 holds the empty blob, a single `0x00` length byte.

use rustc_hash::FxHashMap;

use crate::{
    metadata::heaps::{BlobHandle, HeapBuffer, HeapIndex},
    utils::{compressed_uint_size, heap_padding, to_u32, MAX_COMPRESSED_UINT},
    Error, Result,
};

/// Content-addressed blob store with pre-assigned heap offsets.
#[derive(Debug)]
pub(crate) struct BlobHeap {
    blobs: FxHashMap<Box<[u8]>, BlobHandle>,
    size: usize,
    start_offset: u32,
}

impl BlobHeap {
    /// Creates a heap holding only the empty blob at offset 0.
    pub(crate) fn new(start_offset: u32) -> Self {
        let mut blobs = FxHashMap::default();
        blobs.insert(Box::default(), BlobHandle::NIL);

        BlobHeap {
            blobs,
            size: 1,
            start_offset,
        }
    }

    /// Returns the handle of `blob`, reserving space for it if it was not seen before.
    pub(crate) fn get_or_add(&mut self, blob: &[u8]) -> Result<BlobHandle> {
        if let Some(&handle) = self.blobs.get(blob) {
            return Ok(handle);
        }

        let length = u32::try_from(blob.len()).unwrap_or(u32::MAX);
        if length > MAX_COMPRESSED_UINT {
            return Err(Error::CompressedOverflow(length));
        }

        let new_size = self.size + compressed_uint_size(length) + blob.len();
        if to_u32(new_size)?.checked_add(self.start_offset).is_none() {
            return Err(Error::HeapOverflow {
                heap: HeapIndex::Blob,
                size: new_size,
            });
        }

        let handle = BlobHandle::new(to_u32(self.size)?);
        self.blobs.insert(blob.into(), handle);
        self.size = new_size;
        Ok(handle)
    }

    /// Offset of `handle` as seen by readers of the merged heap of all generations.
    pub(crate) fn heap_offset(&self, handle: BlobHandle) -> u32 {
        if handle.is_nil() {
            0
        } else {
            self.start_offset + handle.value()
        }
    }

    /// Unpadded size of this generation's blob heap.
    pub(crate) fn size(&self) -> usize {
        self.size
    }

    /// Number of distinct blobs, including the empty blob.
    pub(crate) fn len(&self) -> usize {
        self.blobs.len()
    }

    /// Appends the heap, zero-padded to a 4-byte boundary, to `buffer`.
    pub(crate) fn write_aligned(&self, buffer: &mut HeapBuffer) -> Result<()> {
        let reserved = buffer.reserve(self.size + heap_padding(self.size));

        for (blob, handle) in &self.blobs {
            let offset = handle.value() as usize;
            let prefix = buffer.patch_compressed_uint(&reserved, offset, to_u32(blob.len())?)?;
            buffer.patch(&reserved, offset + prefix, blob)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn written(heap: &BlobHeap) -> Vec<u8> {
        let mut buffer = HeapBuffer::new();
        heap.write_aligned(&mut buffer).unwrap();
        buffer.into_vec()
    }

    #[test]
    fn empty_blob_is_nil() {
        let mut heap = BlobHeap::new(0);
        assert_eq!(heap.get_or_add(&[]).unwrap(), BlobHandle::NIL);
        assert_eq!(heap.size(), 1);
        assert_eq!(written(&heap), [0, 0, 0, 0]);
    }

    #[test]
    fn offsets_are_bump_allocated() {
        let mut heap = BlobHeap::new(0);
        let first = heap.get_or_add(&[0x06, 0x08]).unwrap();
        let second = heap.get_or_add(&[0x07, 0x01, 0x08]).unwrap();

        assert_eq!(first.value(), 1);
        assert_eq!(second.value(), 4);
        assert_eq!(heap.size(), 8);
        assert_eq!(written(&heap), [0x00, 0x02, 0x06, 0x08, 0x03, 0x07, 0x01, 0x08]);
    }

    #[test]
    fn dedup_does_not_grow() {
        let mut heap = BlobHeap::new(0);
        let first = heap.get_or_add(b"signature").unwrap();
        let size = heap.size();
        let again = heap.get_or_add(b"signature".to_vec().as_slice()).unwrap();

        assert_eq!(first, again);
        assert_eq!(heap.size(), size);
        assert_eq!(heap.len(), 2);
    }

    #[test]
    fn length_prefix_widths() {
        let mut heap = BlobHeap::new(0);
        let small = heap.get_or_add(&[0xAB; 0x7F]).unwrap();
        let medium = heap.get_or_add(&[0xCD; 0x80]).unwrap();

        assert_eq!(small.value(), 1);
        assert_eq!(medium.value(), 1 + 1 + 0x7F);
        assert_eq!(heap.size(), 1 + (1 + 0x7F) + (2 + 0x80));

        let bytes = written(&heap);
        assert_eq!(bytes[1], 0x7F);
        assert_eq!(&bytes[medium.value() as usize..][..2], &[0x80, 0x80]);
        assert_eq!(bytes.len() % 4, 0);
    }

    #[test]
    fn start_offset_applies_to_queries_only() {
        let mut heap = BlobHeap::new(0x100);
        let handle = heap.get_or_add(&[1]).unwrap();

        assert_eq!(handle.value(), 1);
        assert_eq!(heap.heap_offset(handle), 0x101);
        assert_eq!(heap.heap_offset(BlobHandle::NIL), 0);
    }

    #[test]
    fn start_offset_overflow() {
        let mut heap = BlobHeap::new(u32::MAX - 3);
        assert!(heap.get_or_add(&[1]).is_ok());
        assert!(matches!(
            heap.get_or_add(&[2, 3]),
            Err(Error::HeapOverflow {
                heap: HeapIndex::Blob,
                ..
            })
        ));
    }
}
