//! The four ECMA-335 metadata heaps and their building blocks.
//!
//! .NET metadata stores variable-length data in four heaps (ECMA-335 §II.24.2):
//!
//! - **#Strings**: Null-terminated UTF-8 identifiers, suffix-folded on serialization
//! - **#US**: Length-prefixed UTF-16 string literals with a trailing classification byte
//! - **#GUID**: An array of 16-byte GUIDs addressed by 1-based index
//! - **#Blob**: Length-prefixed binary data such as signatures and constants
//!
//! # Module Structure
//!
//! - [`buffer`] - The append buffer with reserve-then-patch support
//! - [`handles`] - Typed handles for each heap
//! - [`constant`] - Constant values encoded as blobs
//! - `strings`, `userstrings`, `guid`, `blob` - The content-addressed interners
//!
//! The interners are driven through [`crate::MetadataHeapsBuilder`].

pub mod buffer;
pub mod constant;
pub mod handles;

pub(crate) mod blob;
pub(crate) mod guid;
pub(crate) mod strings;
pub(crate) mod userstrings;

pub use buffer::{HeapBuffer, Reservation};
pub use constant::ConstantValue;
pub use guid::GUID_SIZE;
pub use handles::{BlobHandle, GuidHandle, StringHandle, UserStringHandle};

use std::ops::Index;

use strum::{Display, EnumCount, EnumIter, IntoEnumIterator, IntoStaticStr};

use crate::utils::{align_to, HEAP_ALIGNMENT};

/// Identifies one of the four metadata heaps.
///
/// Iteration order (via [`strum::IntoEnumIterator`]) is the order in which the heaps are
/// emitted: `#Strings`, `#US`, `#GUID`, `#Blob`. The displayed form is the stream name.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumCount, IntoStaticStr,
)]
pub enum HeapIndex {
    /// The `#Strings` heap
    #[strum(serialize = "#Strings")]
    String,
    /// The `#US` heap
    #[strum(serialize = "#US")]
    UserString,
    /// The `#GUID` heap
    #[strum(serialize = "#GUID")]
    Guid,
    /// The `#Blob` heap
    #[strum(serialize = "#Blob")]
    Blob,
}

impl HeapIndex {
    /// Stream name of this heap as it appears in the metadata stream directory.
    #[must_use]
    pub fn stream_name(&self) -> &'static str {
        self.into()
    }
}

/// Unpadded byte sizes of the four heaps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeapSizes {
    /// Size of the `#Strings` heap
    pub string: usize,
    /// Size of the `#US` heap
    pub user_string: usize,
    /// Size of the `#GUID` heap
    pub guid: usize,
    /// Size of the `#Blob` heap
    pub blob: usize,
}

impl HeapSizes {
    /// Size of `heap` after padding to a 4-byte boundary.
    #[must_use]
    pub fn aligned(&self, heap: HeapIndex) -> usize {
        align_to(self[heap], HEAP_ALIGNMENT)
    }

    /// Combined size of all heaps after padding.
    #[must_use]
    pub fn total_aligned(&self) -> usize {
        HeapIndex::iter().map(|heap| self.aligned(heap)).sum()
    }
}

impl Index<HeapIndex> for HeapSizes {
    type Output = usize;

    fn index(&self, heap: HeapIndex) -> &usize {
        match heap {
            HeapIndex::String => &self.string,
            HeapIndex::UserString => &self.user_string,
            HeapIndex::Guid => &self.guid,
            HeapIndex::Blob => &self.blob,
        }
    }
}

/// Sizes of the heaps of all previous generations.
///
/// A fresh image starts every heap at 0. An edit-and-continue delta is appended to the heaps
/// of the generations before it, so the handles of new `#US`, `#Strings` and `#Blob` entries
/// are shifted by these offsets. The `#GUID` heap of a delta is instead zero-padded to its
/// start offset before new records are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeapStartOffsets {
    /// Start offset of the `#US` heap
    pub user_string: u32,
    /// Start offset of the `#Strings` heap
    pub string: u32,
    /// Start offset of the `#Blob` heap
    pub blob: u32,
    /// Start offset of the `#GUID` heap
    pub guid: u32,
}

impl HeapStartOffsets {
    /// Start offsets for a full metadata image, all heaps starting at 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start offsets for a delta appended to heaps of the given sizes.
    #[must_use]
    pub fn for_delta(previous: &HeapSizes) -> Self {
        let clamp = |size: usize| u32::try_from(size).unwrap_or(u32::MAX);

        HeapStartOffsets {
            user_string: clamp(previous.user_string),
            string: clamp(previous.string),
            blob: clamp(previous.blob),
            guid: clamp(previous.guid),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emission_order_and_names() {
        let names: Vec<String> = HeapIndex::iter().map(|heap| heap.to_string()).collect();
        assert_eq!(names, ["#Strings", "#US", "#GUID", "#Blob"]);
        assert_eq!(HeapIndex::COUNT, 4);

        for heap in HeapIndex::iter() {
            assert_eq!(heap.stream_name(), heap.to_string());
        }
    }

    #[test]
    fn sizes_index_and_align() {
        let sizes = HeapSizes {
            string: 9,
            user_string: 1,
            guid: 16,
            blob: 8,
        };

        assert_eq!(sizes[HeapIndex::String], 9);
        assert_eq!(sizes.aligned(HeapIndex::String), 12);
        assert_eq!(sizes.aligned(HeapIndex::UserString), 4);
        assert_eq!(sizes.aligned(HeapIndex::Guid), 16);
        assert_eq!(sizes.total_aligned(), 12 + 4 + 16 + 8);
    }

    #[test]
    fn delta_offsets_from_sizes() {
        let previous = HeapSizes {
            string: 0x120,
            user_string: 0x40,
            guid: 32,
            blob: 0x88,
        };

        let offsets = HeapStartOffsets::for_delta(&previous);
        assert_eq!(offsets.string, 0x120);
        assert_eq!(offsets.user_string, 0x40);
        assert_eq!(offsets.guid, 32);
        assert_eq!(offsets.blob, 0x88);
        assert_eq!(HeapStartOffsets::new(), HeapStartOffsets::default());
    }
}
