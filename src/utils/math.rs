//! Mathematical utility functions.

use crate::Result;

/// Alignment every metadata heap stream is padded to.
pub const HEAP_ALIGNMENT: usize = 4;

/// Converts a `usize` to `u32` for heap offsets, returning an error if the value
/// exceeds `u32::MAX`.
///
/// # Errors
///
/// Returns an error if `value` exceeds `u32::MAX`.
pub fn to_u32(value: usize) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| malformed_error!("Heap offset {value} exceeds u32::MAX"))
}

/// Rounds `value` up to the next multiple of `alignment`.
///
/// `alignment` must be a power of two.
#[must_use]
pub fn align_to(value: usize, alignment: usize) -> usize {
    debug_assert!(alignment.is_power_of_two());
    (value + alignment - 1) & !(alignment - 1)
}

/// Number of zero bytes needed after `value` bytes to reach the heap alignment.
#[must_use]
pub fn heap_padding(value: usize) -> usize {
    align_to(value, HEAP_ALIGNMENT) - value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_u32_valid() {
        assert_eq!(to_u32(0).unwrap(), 0);
        assert_eq!(to_u32(1).unwrap(), 1);
        assert_eq!(to_u32(u32::MAX as usize).unwrap(), u32::MAX);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_to_u32_overflow() {
        assert!(to_u32(u32::MAX as usize + 1).is_err());
        assert!(to_u32(usize::MAX).is_err());
    }

    #[test]
    fn test_align_to() {
        assert_eq!(align_to(0, 4), 0);
        assert_eq!(align_to(1, 4), 4);
        assert_eq!(align_to(4, 4), 4);
        assert_eq!(align_to(5, 4), 8);
        assert_eq!(align_to(17, 16), 32);
    }

    #[test]
    fn test_heap_padding() {
        assert_eq!(heap_padding(0), 0);
        assert_eq!(heap_padding(1), 3);
        assert_eq!(heap_padding(2), 2);
        assert_eq!(heap_padding(3), 1);
        assert_eq!(heap_padding(8), 0);
    }
}
