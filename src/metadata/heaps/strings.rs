//! `#Strings` heap interner and suffix-folding serializer.
//!
//! Identifier strings are not written while the metadata is being built. Interning only
//! hands out a virtual, 1-based sequence number; the real layout is decided once, when the
//! heaps are sealed:
//!
//! 1. All strings are sorted by comparing UTF-16 code units from the end towards the start,
//!    longer strings first when one is a suffix of the other. Every string is thereby
//!    followed by all strings that are a suffix of it.
//! 2. Walking the sorted list, a string whose full content is a suffix of the previous one
//!    is *folded*: it reuses the tail of the bytes already written, including the
//!    terminator, and occupies no space of its own.
//! 3. All other strings are written as UTF-8 followed by a single `0x00` byte.
//!
//! Namespace- and type-qualified names share long suffixes, so folding shrinks the heap
//! noticeably without changing lookups.
//!
//! # Examples
//!
//! ```rust
//! use cilheaps::MetadataHeapsBuilder;
//!
//! let mut builder = MetadataHeapsBuilder::new();
//! let foo = builder.get_or_add_string("Foo")?;
//! let oo = builder.get_or_add_string("oo")?;
//!
//! let sealed = builder.finalize()?;
//! assert_eq!(sealed.string_offset(oo)?, sealed.string_offset(foo)? + 1);
//! # Ok::<(), cilheaps::Error>(())
//! ```

use std::cmp::Ordering;

use rustc_hash::FxHashMap;
use widestring::{U16Str, U16String};

use crate::{
    metadata::heaps::{HeapBuffer, HeapIndex, StringHandle},
    utils::to_u32,
    Error, Result,
};

/// String store handing out virtual handles until serialization.
#[derive(Debug)]
pub(crate) struct StringHeap {
    strings: FxHashMap<U16String, StringHandle>,
    start_offset: u32,
}

/// The serialized `#Strings` heap together with the virtual handle to offset table.
#[derive(Debug)]
pub(crate) struct ResolvedStrings {
    offsets: Vec<u32>,
    buffer: HeapBuffer,
    folded: usize,
}

impl StringHeap {
    pub(crate) fn new(start_offset: u32) -> Self {
        StringHeap {
            strings: FxHashMap::default(),
            start_offset,
        }
    }

    /// Returns the virtual handle of `value`; the empty string is always nil.
    pub(crate) fn get_or_add(&mut self, value: &U16Str) -> Result<StringHandle> {
        if value.is_empty() {
            return Ok(StringHandle::NIL);
        }

        if let Some(&handle) = self.strings.get(value) {
            return Ok(handle);
        }

        let handle = StringHandle::new(to_u32(self.strings.len() + 1)?);
        self.strings.insert(value.to_owned(), handle);
        Ok(handle)
    }

    /// Number of distinct non-empty strings.
    pub(crate) fn len(&self) -> usize {
        self.strings.len()
    }

    /// Sorts, folds and writes all strings, resolving every virtual handle.
    pub(crate) fn serialize(self) -> Result<ResolvedStrings> {
        let mut sorted: Vec<(U16String, StringHandle)> = self.strings.into_iter().collect();
        sorted.sort_unstable_by(|(x, _), (y, _)| suffix_order(x.as_slice(), y.as_slice()));

        let mut buffer = HeapBuffer::with_capacity(1024);
        let mut offsets = vec![0u32; sorted.len() + 1];
        let mut folded = 0;

        buffer.write_u8(0);

        let mut previous: &[u16] = &[];
        for (value, handle) in &sorted {
            let units = value.as_slice();
            let position = to_u32(buffer.len())?
                .checked_add(self.start_offset)
                .ok_or(Error::HeapOverflow {
                    heap: HeapIndex::String,
                    size: buffer.len(),
                })?;

            let offset = if previous.ends_with(units) && !is_low_surrogate(units[0]) {
                // The tail of the previous string, including its terminator.
                folded += 1;
                log::trace!(
                    "#Strings: folding '{}' into '{}'",
                    value.display(),
                    U16Str::from_slice(previous).display()
                );
                position - (to_u32(utf8_len(units))? + 1)
            } else {
                write_utf8(&mut buffer, units);
                buffer.write_u8(0);
                position
            };

            offsets[handle.value() as usize] = offset;
            previous = units;
        }

        log::debug!(
            "#Strings: {} strings, {} folded into a suffix, {} bytes",
            sorted.len(),
            folded,
            buffer.len()
        );

        Ok(ResolvedStrings {
            offsets,
            buffer,
            folded,
        })
    }
}

impl ResolvedStrings {
    /// Final heap offset of `handle`.
    pub(crate) fn offset(&self, handle: StringHandle) -> Result<u32> {
        self.offsets
            .get(handle.value() as usize)
            .copied()
            .ok_or(Error::InvalidHandle {
                heap: HeapIndex::String,
                value: handle.value(),
            })
    }

    /// Unpadded size of this generation's string heap.
    pub(crate) fn size(&self) -> usize {
        self.buffer.len()
    }

    /// Number of strings that share the bytes of a longer string.
    pub(crate) fn folded(&self) -> usize {
        self.folded
    }

    pub(crate) fn as_slice(&self) -> &[u8] {
        self.buffer.as_slice()
    }
}

/// Orders strings by their code units from the last towards the first.
///
/// When one string is a proper suffix of the other, the longer string sorts first.
pub(crate) fn suffix_order(x: &[u16], y: &[u16]) -> Ordering {
    x.iter()
        .rev()
        .zip(y.iter().rev())
        .map(|(a, b)| a.cmp(b))
        .find(|ordering| ordering.is_ne())
        .unwrap_or_else(|| y.len().cmp(&x.len()))
}

fn is_low_surrogate(unit: u16) -> bool {
    (0xDC00..=0xDFFF).contains(&unit)
}

/// Decodes UTF-16, replacing unpaired surrogates with U+FFFD.
fn decode_lossy(units: &[u16]) -> impl Iterator<Item = char> + '_ {
    char::decode_utf16(units.iter().copied()).map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
}

fn utf8_len(units: &[u16]) -> usize {
    decode_lossy(units).map(char::len_utf8).sum()
}

fn write_utf8(buffer: &mut HeapBuffer, units: &[u16]) {
    let mut encoded = [0u8; 4];
    for c in decode_lossy(units) {
        buffer.write_bytes(c.encode_utf8(&mut encoded).as_bytes());
    }
}
