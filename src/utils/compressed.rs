//! ECMA-335 compressed unsigned integer encoding.
//!
//! Blob and user string entries are prefixed with their length in the variable-width
//! format described in ECMA-335 §II.23.2:
//!
//! - `0x00..=0x7F` use 1 byte: `0xxxxxxx`
//! - `0x80..=0x3FFF` use 2 bytes: `10xxxxxx xxxxxxxx`
//! - `0x4000..=0x1FFF_FFFF` use 4 bytes: `110xxxxx xxxxxxxx xxxxxxxx xxxxxxxx`
//!
//! All multi-byte forms are big-endian.

use crate::{Error, Result};

/// Largest value representable as a compressed unsigned integer.
pub const MAX_COMPRESSED_UINT: u32 = 0x1FFF_FFFF;

/// Returns the number of bytes (1, 2, or 4) needed to encode `value`.
///
/// Values above [`MAX_COMPRESSED_UINT`] report 4 bytes; [`write_compressed_uint`]
/// rejects them.
#[must_use]
pub fn compressed_uint_size(value: u32) -> usize {
    if value < 0x80 {
        1
    } else if value < 0x4000 {
        2
    } else {
        4
    }
}

/// Appends `value` to `buffer` in compressed form.
///
/// # Errors
///
/// Returns [`Error::CompressedOverflow`] if `value` exceeds [`MAX_COMPRESSED_UINT`].
pub fn write_compressed_uint(value: u32, buffer: &mut Vec<u8>) -> Result<()> {
    let mut encoded = [0u8; 4];
    let len = encode_compressed_uint(value, &mut encoded)?;
    buffer.extend_from_slice(&encoded[..len]);
    Ok(())
}

/// Encodes `value` into the start of `target`, returning the number of bytes used.
///
/// # Errors
///
/// Returns [`Error::CompressedOverflow`] if `value` exceeds [`MAX_COMPRESSED_UINT`].
#[allow(clippy::cast_possible_truncation)]
pub fn encode_compressed_uint(value: u32, target: &mut [u8; 4]) -> Result<usize> {
    if value > MAX_COMPRESSED_UINT {
        return Err(Error::CompressedOverflow(value));
    }

    match compressed_uint_size(value) {
        1 => {
            target[0] = value as u8;
            Ok(1)
        }
        2 => {
            target[..2].copy_from_slice(&(0x8000 | value as u16).to_be_bytes());
            Ok(2)
        }
        _ => {
            target.copy_from_slice(&(0xC000_0000 | value).to_be_bytes());
            Ok(4)
        }
    }
}
