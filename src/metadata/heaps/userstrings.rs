//! `#US` heap interner.
//!
//! User strings are the literals loaded by `ldstr`. Each entry is written immediately as
//! (ECMA-335 §II.24.2.4):
//!
//! - a compressed length of `2 * code_units + 1`
//! - the UTF-16LE code units
//! - one trailing byte, 1 if the string needs more than simple handling, 0 otherwise
//!
//! Offset 0 holds a single `0x00` byte and stands for the empty string.

use rustc_hash::FxHashMap;
use widestring::{U16Str, U16String};

use crate::{
    metadata::heaps::{HeapBuffer, HeapIndex, UserStringHandle},
    utils::{to_u32, MAX_COMPRESSED_UINT},
    Error, Result,
};

/// Content-addressed user string store.
#[derive(Debug)]
pub(crate) struct UserStringHeap {
    strings: FxHashMap<U16String, UserStringHandle>,
    buffer: HeapBuffer,
    start_offset: u32,
}

impl UserStringHeap {
    /// Creates a heap holding only the leading zero byte.
    pub(crate) fn new(start_offset: u32) -> Self {
        let mut buffer = HeapBuffer::with_capacity(1024);
        buffer.write_u8(0);

        UserStringHeap {
            strings: FxHashMap::default(),
            buffer,
            start_offset,
        }
    }

    /// Returns the handle of `value`, appending an entry if it was not seen before.
    pub(crate) fn get_or_add(&mut self, value: &U16Str) -> Result<UserStringHandle> {
        if value.is_empty() {
            return Ok(UserStringHandle::NIL);
        }

        if let Some(&handle) = self.strings.get(value) {
            return Ok(handle);
        }

        let length = value
            .len()
            .checked_mul(2)
            .and_then(|bytes| u32::try_from(bytes + 1).ok())
            .unwrap_or(u32::MAX);
        if length > MAX_COMPRESSED_UINT {
            return Err(Error::CompressedOverflow(length));
        }

        let position = to_u32(self.buffer.len())?;
        let offset = position
            .checked_add(self.start_offset)
            .ok_or(Error::HeapOverflow {
                heap: HeapIndex::UserString,
                size: self.buffer.len(),
            })?;

        self.buffer.write_compressed_uint(length)?;
        self.buffer.write_utf16(value.as_slice());
        self.buffer.write_u8(string_kind(value.as_slice()));

        let handle = UserStringHandle::new(offset);
        self.strings.insert(value.to_owned(), handle);
        Ok(handle)
    }

    /// Unpadded size of this generation's user string heap.
    pub(crate) fn size(&self) -> usize {
        self.buffer.len()
    }

    /// Number of distinct interned user strings.
    pub(crate) fn len(&self) -> usize {
        self.strings.len()
    }

    pub(crate) fn as_slice(&self) -> &[u8] {
        self.buffer.as_slice()
    }
}

/// Computes the trailing byte of a user string entry.
///
/// Scanning stops at the first code unit that is either at or above 0x7F, a control
/// character in 0x01-0x08 or 0x0E-0x1F, an apostrophe or a hyphen; the result is then 1.
/// Strings without such a code unit yield 0.
pub(crate) fn string_kind(units: &[u16]) -> u8 {
    let special = units
        .iter()
        .any(|&unit| matches!(unit, 0x01..=0x08 | 0x0E..=0x1F | 0x27 | 0x2D | 0x7F..=u16::MAX));

    u8::from(special)
}

#[cfg(test)]
mod tests {
    use super::*;
    use widestring::u16str;

    #[test]
    fn leading_zero_byte() {
        let heap = UserStringHeap::new(0);
        assert_eq!(heap.as_slice(), &[0]);
        assert_eq!(heap.size(), 1);
    }

    #[test]
    fn entry_layout() {
        let mut heap = UserStringHeap::new(0);
        let handle = heap.get_or_add(u16str!("Hi")).unwrap();

        assert_eq!(handle.value(), 1);
        assert_eq!(heap.as_slice(), &[0x00, 0x05, b'H', 0x00, b'i', 0x00, 0x00]);
    }

    #[test]
    fn empty_string_is_nil() {
        let mut heap = UserStringHeap::new(0);
        assert_eq!(heap.get_or_add(u16str!("")).unwrap(), UserStringHandle::NIL);
        assert_eq!(heap.size(), 1);
    }

    #[test]
    fn dedup_does_not_grow() {
        let mut heap = UserStringHeap::new(0);
        let first = heap.get_or_add(u16str!("Hello, World")).unwrap();
        let size = heap.size();
        let second = heap.get_or_add(&U16String::from_str("Hello, World")).unwrap();

        assert_eq!(first, second);
        assert_eq!(heap.size(), size);
        assert_eq!(heap.len(), 1);
    }

    #[test]
    fn start_offset_shifts_handles() {
        let mut heap = UserStringHeap::new(0x40);
        let first = heap.get_or_add(u16str!("a")).unwrap();
        let second = heap.get_or_add(u16str!("b")).unwrap();

        assert_eq!(first.value(), 0x41);
        assert_eq!(second.value(), 0x41 + 4);
    }

    #[test]
    fn long_string_uses_two_byte_length() {
        let mut heap = UserStringHeap::new(0);
        let value = U16String::from_str(&"x".repeat(64));
        heap.get_or_add(&value).unwrap();

        // 2 * 64 + 1 = 0x81
        assert_eq!(&heap.as_slice()[1..3], &[0x80, 0x81]);
        assert_eq!(heap.size(), 1 + 2 + 128 + 1);
    }

    #[test]
    fn kind_simple() {
        assert_eq!(string_kind(u16str!("Hello World").as_slice()), 0);
        assert_eq!(string_kind(u16str!("tab\tnewline\n").as_slice()), 0);
        assert_eq!(string_kind(&[]), 0);
    }

    #[test]
    fn kind_special() {
        assert_eq!(string_kind(u16str!("don't").as_slice()), 1);
        assert_eq!(string_kind(u16str!("a-b").as_slice()), 1);
        assert_eq!(string_kind(u16str!("caf\u{e9}").as_slice()), 1);
        assert_eq!(string_kind(&[0x41, 0x7F]), 1);
        assert_eq!(string_kind(&[0x01]), 1);
        assert_eq!(string_kind(&[0x0E]), 1);
        assert_eq!(string_kind(&[0x1F]), 1);
        assert_eq!(string_kind(&[0x0D]), 0);
    }

    #[test]
    fn kind_in_trailing_byte() {
        let mut heap = UserStringHeap::new(0);
        heap.get_or_add(u16str!("it's")).unwrap();
        assert_eq!(heap.as_slice().last(), Some(&1));
    }
}
