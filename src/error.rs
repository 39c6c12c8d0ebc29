use thiserror::Error;

use crate::metadata::heaps::HeapIndex;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Heap building is an in-memory transformation, so the failure modes are limited to values
/// that cannot be represented in the ECMA-335 heap encodings and to misuse of handles and
/// reservations. Interning after sealing, or asking for a final string offset before sealing,
/// cannot be expressed at all: the builder is split into a building and a sealed type.
///
/// # Error Categories
///
/// ## Encoding Errors
/// - [`Error::CompressedOverflow`] - A length does not fit the compressed integer encoding
/// - [`Error::HeapOverflow`] - A heap grew beyond the addressable range
/// - [`Error::Malformed`] - An internal value conversion failed
///
/// ## Usage Errors
/// - [`Error::InvalidHandle`] - A handle that was not issued by this builder
/// - [`Error::OutOfBounds`] - A patch outside of a reserved byte range
///
/// # Examples
///
/// ```rust
/// use cilheaps::{Error, MetadataHeapsBuilder};
///
/// let mut builder = MetadataHeapsBuilder::new();
/// match builder.get_or_add_blob(&[0x06, 0x08]) {
///     Ok(handle) => println!("Blob stored at {}", handle),
///     Err(Error::CompressedOverflow(length)) => eprintln!("Blob too large: {length}"),
///     Err(e) => eprintln!("Other error: {e}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// A value was converted or computed outside of its valid range.
    ///
    /// The error includes the source location where the problem was detected for
    /// debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound write was attempted on a reserved byte range.
    #[error("Out of Bound write would have occurred!")]
    OutOfBounds,

    /// The value can not be represented as an ECMA-335 compressed unsigned integer.
    ///
    /// Compressed integers are limited to `0x1FFF_FFFF`. Blobs and user strings carry
    /// their length in this encoding, so their content is limited accordingly.
    #[error("Value {0:#x} exceeds the compressed integer range")]
    CompressedOverflow(u32),

    /// The heap grew beyond the range addressable by a 32-bit heap offset.
    #[error("Heap {heap} exceeds the addressable range with {size} bytes")]
    HeapOverflow {
        /// The heap that overflowed
        heap: HeapIndex,
        /// The size the heap would have had
        size: usize,
    },

    /// The handle was not issued by this builder.
    #[error("Invalid {heap} handle - {value:#x}")]
    InvalidHandle {
        /// The heap the handle belongs to
        heap: HeapIndex,
        /// The raw handle value
        value: u32,
    },
}
