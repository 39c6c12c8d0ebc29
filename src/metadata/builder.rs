//! Two-phase builder for the metadata heaps.
//!
//! [`MetadataHeapsBuilder`] is the *building* state: values are interned and receive a
//! stable handle right away. [`MetadataHeapsBuilder::finalize`] consumes it and returns
//! [`SealedHeaps`], the *sealed* state, in which the `#Strings` heap has been laid out and
//! every string handle resolves to its final offset. [`SealedHeaps::write_heaps`] consumes
//! the sealed heaps and assembles the four streams into one aligned byte block.
//!
//! Because each transition moves the value, interning after sealing and resolving string
//! offsets before sealing are rejected at compile time.
//!
//! # Examples
//!
//! ```rust
//! use cilheaps::prelude::*;
//!
//! let mut builder = MetadataHeapsBuilder::new();
//! let namespace = builder.get_or_add_string("System.Collections")?;
//! let name = builder.get_or_add_string("List`1")?;
//! let literal = builder.get_or_add_user_string("Hello")?;
//! let signature = builder.get_or_add_blob(&[0x20, 0x00, 0x01])?;
//! let mvid = builder.get_or_add_guid(uguid::guid!("d437908e-65e6-487c-9735-7bdff699bea5"))?;
//!
//! let sealed = builder.finalize()?;
//! let name_offset = sealed.string_offset(name)?;
//! assert_ne!(name_offset, sealed.string_offset(namespace)?);
//! assert_eq!(sealed.guid_index(mvid), 1);
//! assert_eq!(sealed.user_string_offset(literal), 1);
//! assert_eq!(sealed.blob_offset(signature), 1);
//!
//! let heaps = sealed.write_heaps()?;
//! for stream in heaps.streams() {
//!     println!("{} at {:#x}, {} bytes", stream.name(), stream.offset, stream.size);
//! }
//! # Ok::<(), cilheaps::Error>(())
//! ```

use strum::IntoEnumIterator;
use uguid::Guid;
use widestring::{U16Str, U16String};

use crate::{
    metadata::heaps::{
        blob::BlobHeap, constant::utf16_blob, guid::GuidHeap, strings::ResolvedStrings,
        strings::StringHeap, userstrings::UserStringHeap, BlobHandle, ConstantValue, GuidHandle,
        HeapBuffer, HeapIndex, HeapSizes, HeapStartOffsets, Reservation, StringHandle,
        UserStringHandle,
    },
    Result,
};

/// Accumulates strings, user strings, GUIDs and blobs while metadata is being emitted.
#[derive(Debug)]
pub struct MetadataHeapsBuilder {
    user_strings: UserStringHeap,
    strings: StringHeap,
    blobs: BlobHeap,
    guids: GuidHeap,
    start_offsets: HeapStartOffsets,
}

impl Default for MetadataHeapsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataHeapsBuilder {
    /// Creates a builder for a full metadata image.
    #[must_use]
    pub fn new() -> Self {
        Self::with_start_offsets(HeapStartOffsets::default())
    }

    /// Creates a builder whose heaps continue after those of previous generations.
    #[must_use]
    pub fn with_start_offsets(start_offsets: HeapStartOffsets) -> Self {
        MetadataHeapsBuilder {
            user_strings: UserStringHeap::new(start_offsets.user_string),
            strings: StringHeap::new(start_offsets.string),
            blobs: BlobHeap::new(start_offsets.blob),
            guids: GuidHeap::new(start_offsets.guid),
            start_offsets,
        }
    }

    /// The start offsets this builder was created with.
    #[must_use]
    pub fn start_offsets(&self) -> HeapStartOffsets {
        self.start_offsets
    }

    /// Interns an identifier in the `#Strings` heap.
    ///
    /// The returned handle is a virtual sequence number; the empty string is always nil.
    ///
    /// # Errors
    ///
    /// Returns an error if the number of strings exceeds the 32-bit handle range.
    pub fn get_or_add_string(&mut self, value: &str) -> Result<StringHandle> {
        self.strings.get_or_add(&U16String::from_str(value))
    }

    /// Interns UTF-16 content in the `#Strings` heap.
    ///
    /// Unpaired surrogates are accepted and written as U+FFFD.
    ///
    /// # Errors
    ///
    /// Returns an error if the number of strings exceeds the 32-bit handle range.
    pub fn get_or_add_string_utf16(&mut self, value: &U16Str) -> Result<StringHandle> {
        self.strings.get_or_add(value)
    }

    /// Interns a string literal in the `#US` heap.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is too long for a compressed length or the heap
    /// exceeds the 32-bit offset range.
    pub fn get_or_add_user_string(&mut self, value: &str) -> Result<UserStringHandle> {
        self.user_strings.get_or_add(&U16String::from_str(value))
    }

    /// Interns UTF-16 content in the `#US` heap.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is too long for a compressed length or the heap
    /// exceeds the 32-bit offset range.
    pub fn get_or_add_user_string_utf16(&mut self, value: &U16Str) -> Result<UserStringHandle> {
        self.user_strings.get_or_add(value)
    }

    /// Interns raw bytes in the `#Blob` heap.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::CompressedOverflow`] if the blob is longer than `0x1FFF_FFFF`
    /// bytes, or [`crate::Error::HeapOverflow`] if the heap exceeds the 32-bit offset range.
    pub fn get_or_add_blob(&mut self, blob: &[u8]) -> Result<BlobHandle> {
        self.blobs.get_or_add(blob)
    }

    /// Interns the UTF-16LE bytes of `value` in the `#Blob` heap.
    ///
    /// # Errors
    ///
    /// See [`MetadataHeapsBuilder::get_or_add_blob`].
    pub fn get_or_add_blob_utf16(&mut self, value: &str) -> Result<BlobHandle> {
        self.blobs.get_or_add(&utf16_blob(value))
    }

    /// Interns the UTF-8 bytes of `value` in the `#Blob` heap.
    ///
    /// # Errors
    ///
    /// See [`MetadataHeapsBuilder::get_or_add_blob`].
    pub fn get_or_add_blob_utf8(&mut self, value: &str) -> Result<BlobHandle> {
        self.blobs.get_or_add(value.as_bytes())
    }

    /// Interns the blob encoding of a constant value.
    ///
    /// # Errors
    ///
    /// See [`MetadataHeapsBuilder::get_or_add_blob`].
    pub fn get_or_add_constant_blob(&mut self, value: &ConstantValue) -> Result<BlobHandle> {
        self.blobs.get_or_add(&value.to_blob())
    }

    /// Interns a GUID in the `#GUID` heap; the all-zero GUID is always nil.
    ///
    /// # Errors
    ///
    /// Returns an error if the record index exceeds the 32-bit handle range.
    pub fn get_or_add_guid(&mut self, guid: Guid) -> Result<GuidHandle> {
        self.guids.get_or_add(guid)
    }

    /// Reserves a `#GUID` record whose value is written later with
    /// [`MetadataHeapsBuilder::write_reserved_guid`] or [`SealedHeaps::write_reserved_guid`].
    ///
    /// Typically used for a module version id that is only known once the image is hashed.
    ///
    /// # Errors
    ///
    /// Returns an error if the record index exceeds the 32-bit handle range.
    pub fn reserve_guid(&mut self) -> Result<(GuidHandle, Reservation)> {
        self.guids.reserve()
    }

    /// Fills a record obtained from [`MetadataHeapsBuilder::reserve_guid`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OutOfBounds`] if the reservation is not a `#GUID` record.
    pub fn write_reserved_guid(&mut self, reservation: &Reservation, guid: Guid) -> Result<()> {
        self.guids.write_reserved(reservation, guid)
    }

    /// Offset of `handle` in the merged `#Blob` heap of all generations.
    #[must_use]
    pub fn blob_offset(&self, handle: BlobHandle) -> u32 {
        self.blobs.heap_offset(handle)
    }

    /// Index of `handle` in the `#GUID` heap.
    #[must_use]
    pub fn guid_index(&self, handle: GuidHandle) -> u32 {
        handle.value()
    }

    /// Offset of `handle` in the merged `#US` heap of all generations.
    #[must_use]
    pub fn user_string_offset(&self, handle: UserStringHandle) -> u32 {
        handle.value()
    }

    /// Number of distinct non-empty strings interned so far.
    #[must_use]
    pub fn string_count(&self) -> usize {
        self.strings.len()
    }

    /// Seals the heaps, laying out the `#Strings` heap with suffix folding.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::HeapOverflow`] if a string offset exceeds the 32-bit range.
    pub fn finalize(self) -> Result<SealedHeaps> {
        let string_count = self.strings.len();
        let strings = self.strings.serialize()?;

        log::debug!(
            "Sealed heaps: {} strings ({} folded), {} user strings, {} guids, {} blobs",
            string_count,
            strings.folded(),
            self.user_strings.len(),
            self.guids.len(),
            self.blobs.len()
        );

        Ok(SealedHeaps {
            strings,
            user_strings: self.user_strings,
            blobs: self.blobs,
            guids: self.guids,
        })
    }
}

/// The heaps after sealing: no more interning, every handle has its final value.
#[derive(Debug)]
pub struct SealedHeaps {
    strings: ResolvedStrings,
    user_strings: UserStringHeap,
    blobs: BlobHeap,
    guids: GuidHeap,
}

impl SealedHeaps {
    /// Final offset of `handle` in the merged `#Strings` heap of all generations.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidHandle`] if the handle was not issued by the builder
    /// these heaps were sealed from.
    pub fn string_offset(&self, handle: StringHandle) -> Result<u32> {
        self.strings.offset(handle)
    }

    /// Offset of `handle` in the merged `#Blob` heap of all generations.
    #[must_use]
    pub fn blob_offset(&self, handle: BlobHandle) -> u32 {
        self.blobs.heap_offset(handle)
    }

    /// Index of `handle` in the `#GUID` heap.
    #[must_use]
    pub fn guid_index(&self, handle: GuidHandle) -> u32 {
        handle.value()
    }

    /// Offset of `handle` in the merged `#US` heap of all generations.
    #[must_use]
    pub fn user_string_offset(&self, handle: UserStringHandle) -> u32 {
        handle.value()
    }

    /// Fills a record obtained from [`MetadataHeapsBuilder::reserve_guid`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OutOfBounds`] if the reservation is not a `#GUID` record.
    pub fn write_reserved_guid(&mut self, reservation: &Reservation, guid: Guid) -> Result<()> {
        self.guids.write_reserved(reservation, guid)
    }

    /// Unpadded sizes of the four heaps, as recorded in the stream directory.
    #[must_use]
    pub fn heap_sizes(&self) -> HeapSizes {
        HeapSizes {
            string: self.strings.size(),
            user_string: self.user_strings.size(),
            guid: self.guids.size(),
            blob: self.blobs.size(),
        }
    }

    /// Writes `#Strings`, `#US`, `#GUID` and `#Blob`, each zero-padded to 4 bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if a blob can not be placed at its reserved offset.
    pub fn write_heaps(self) -> Result<SerializedHeaps> {
        let sizes = self.heap_sizes();
        let mut buffer = HeapBuffer::with_capacity(sizes.total_aligned());

        buffer.write_bytes(self.strings.as_slice());
        buffer.align_heap();
        buffer.write_bytes(self.user_strings.as_slice());
        buffer.align_heap();
        buffer.write_bytes(self.guids.as_slice());
        buffer.align_heap();
        self.blobs.write_aligned(&mut buffer)?;

        log::debug!(
            "Wrote heaps: #Strings {} / #US {} / #GUID {} / #Blob {} bytes, {} total",
            sizes.string,
            sizes.user_string,
            sizes.guid,
            sizes.blob,
            buffer.len()
        );

        Ok(SerializedHeaps {
            data: buffer.into_vec(),
            sizes,
        })
    }
}

/// Location of one heap stream within [`SerializedHeaps::data`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamLayout {
    /// The heap stored in this stream
    pub heap: HeapIndex,
    /// Offset from the start of the serialized block
    pub offset: usize,
    /// Size including alignment padding
    pub size: usize,
}

impl StreamLayout {
    /// Stream name for the metadata stream directory.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.heap.stream_name()
    }
}

/// The assembled heap streams.
#[derive(Debug, Clone)]
pub struct SerializedHeaps {
    data: Vec<u8>,
    sizes: HeapSizes,
}

impl SerializedHeaps {
    /// All four heaps back to back, each padded to a 4-byte boundary.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the heaps and returns the assembled bytes.
    #[must_use]
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Unpadded sizes of the four heaps.
    #[must_use]
    pub fn sizes(&self) -> HeapSizes {
        self.sizes
    }

    /// Stream layouts in emission order.
    pub fn streams(&self) -> impl Iterator<Item = StreamLayout> + '_ {
        HeapIndex::iter().scan(0usize, |offset, heap| {
            let size = self.sizes.aligned(heap);
            let layout = StreamLayout {
                heap,
                offset: *offset,
                size,
            };
            *offset += size;
            Some(layout)
        })
    }

    /// The padded bytes of a single heap.
    #[must_use]
    pub fn heap(&self, heap: HeapIndex) -> &[u8] {
        match self.streams().find(|layout| layout.heap == heap) {
            Some(layout) => &self.data[layout.offset..layout.offset + layout.size],
            None => &[],
        }
    }
}
