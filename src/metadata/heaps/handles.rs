//! Typed handles into the four metadata heaps.
//!
//! A handle is a 32-bit token standing for the location of a value within its heap. The
//! value 0 is the nil handle for every heap kind and always denotes the empty value.
//!
//! | Handle | Raw value |
//! |---|---|
//! | [`StringHandle`] | virtual sequence number; resolved to a byte offset once the heaps are sealed |
//! | [`BlobHandle`] | byte offset within the blob heap of the current generation |
//! | [`GuidHandle`] | 1-based index of a 16-byte record |
//! | [`UserStringHandle`] | byte offset within the user string heap, including the generation start offset |

use std::fmt;

macro_rules! heap_handle {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name(u32);

        impl $name {
            /// The nil handle, referring to the empty value.
            pub const NIL: $name = $name(0);

            /// Creates a handle from its raw value.
            #[must_use]
            pub const fn new(value: u32) -> Self {
                $name(value)
            }

            /// Returns the raw handle value.
            #[must_use]
            pub const fn value(&self) -> u32 {
                self.0
            }

            /// Returns true if this is the nil handle (value 0).
            #[must_use]
            pub const fn is_nil(&self) -> bool {
                self.0 == 0
            }
        }

        impl From<u32> for $name {
            fn from(value: u32) -> Self {
                $name(value)
            }
        }

        impl From<$name> for u32 {
            fn from(handle: $name) -> Self {
                handle.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "(0x{:x})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{:08x}", self.0)
            }
        }
    };
}

heap_handle!(
    /// Handle to an entry of the `#Strings` heap.
    ///
    /// While the heaps are being built this carries a virtual sequence number; use
    /// [`crate::SealedHeaps::string_offset`] to obtain the final byte offset.
    StringHandle,
    "StringHandle"
);

heap_handle!(
    /// Handle to an entry of the `#Blob` heap.
    BlobHandle,
    "BlobHandle"
);

heap_handle!(
    /// Handle to a record of the `#GUID` heap.
    GuidHandle,
    "GuidHandle"
);

heap_handle!(
    /// Handle to an entry of the `#US` heap.
    UserStringHandle,
    "UserStringHandle"
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn nil_handles() {
        assert!(StringHandle::NIL.is_nil());
        assert!(BlobHandle::default().is_nil());
        assert!(GuidHandle::new(0).is_nil());
        assert!(!UserStringHandle::new(1).is_nil());
    }

    #[test]
    fn conversions() {
        let handle = BlobHandle::from(0x1234);
        assert_eq!(handle.value(), 0x1234);
        assert_eq!(u32::from(handle), 0x1234);
    }

    #[test]
    fn formatting() {
        assert_eq!(format!("{}", GuidHandle::new(1)), "0x00000001");
        assert_eq!(format!("{:?}", StringHandle::new(0x2a)), "StringHandle(0x2a)");
    }

    #[test]
    fn hashing() {
        let mut set = HashSet::new();
        set.insert(UserStringHandle::new(1));
        set.insert(UserStringHandle::new(1));
        set.insert(UserStringHandle::new(9));
        assert_eq!(set.len(), 2);
    }
}
