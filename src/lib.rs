// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # cilheaps
//!
//! A byte-exact builder for the four variable-length heaps of ECMA-335 metadata:
//! `#Strings`, `#US`, `#GUID` and `#Blob`.
//!
//! Every value requested while emitting metadata tables is interned once and receives a
//! stable handle immediately. Once all tables are written, the heaps are sealed and
//! serialized into a single, 4-byte aligned block ready to be placed behind the metadata
//! root of a PE image.
//!
//! ## Features
//!
//! - **Content deduplication** - Equal values always share one heap entry
//! - **Suffix folding** - `#Strings` entries that are suffixes of another entry share its bytes
//! - **Stable handles** - `#US`, `#GUID` and `#Blob` handles never change after interning
//! - **Delta generations** - Heaps can continue after those of previous edit-and-continue
//!   generations via [`HeapStartOffsets`]
//! - **Typestate** - Interning after sealing does not compile
//!
//! ## Quick Start
//!
//! ```rust
//! use cilheaps::prelude::*;
//!
//! let mut builder = MetadataHeapsBuilder::new();
//! let foo = builder.get_or_add_string("Foo")?;
//! let oo = builder.get_or_add_string("oo")?;
//! let hello = builder.get_or_add_user_string("Hello, World!")?;
//! let signature = builder.get_or_add_blob(&[0x00, 0x00, 0x01])?;
//!
//! let sealed = builder.finalize()?;
//! assert_eq!(sealed.string_offset(oo)?, sealed.string_offset(foo)? + 1);
//! assert_eq!(sealed.user_string_offset(hello), 1);
//! assert_eq!(sealed.blob_offset(signature), 1);
//!
//! let heaps = sealed.write_heaps()?;
//! assert_eq!(heaps.data().len() % 4, 0);
//! # Ok::<(), cilheaps::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`prelude`] - Convenient re-exports of commonly used types
//! - [`metadata::heaps`] - The individual heaps, handles and the append buffer
//! - [`metadata::builder`] - The building and sealed states and the serialized output
//! - [`utils`] - Compressed integer encoding and alignment helpers
//! - [`Error`] and [`Result`] - Error handling
//!
//! ## Standards Compliance
//!
//! The heap layouts follow **ECMA-335** (6th edition), partition II, §24.2.2 to §24.2.5.
//!
//! ### References
//!
//! - [ECMA-335 Standard](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf) - Official CLI specification
//!
//! ## Logging
//!
//! The crate reports heap statistics through the [`log`] facade: a `debug` summary when
//! sealing and writing, and a `trace` record for every folded string. No logger is installed
//! by the library itself.
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T, Error>`](Result):
//!
//! ```rust
//! use cilheaps::{Error, MetadataHeapsBuilder};
//!
//! let mut builder = MetadataHeapsBuilder::new();
//! match builder.get_or_add_user_string("literal") {
//!     Ok(handle) => println!("Stored at {}", handle),
//!     Err(Error::CompressedOverflow(length)) => println!("Too long: {}", length),
//!     Err(e) => println!("Error: {}", e),
//! }
//! ```
//!
//! ## Development and Testing
//!
//! ### Fuzzing
//!
//! ```bash
//! # Install fuzzing tools
//! cargo install cargo-fuzz
//!
//! # Run fuzzer
//! cargo +nightly fuzz run heaps
//! ```
//!
//! ### Benchmarks
//!
//! ```bash
//! cargo bench --bench heaps
//! ```

#[macro_use]
pub(crate) mod error;

/// Convenient re-exports of the most commonly used types.
///
/// ```rust
/// use cilheaps::prelude::*;
///
/// let mut builder = MetadataHeapsBuilder::with_start_offsets(HeapStartOffsets::new());
/// let handle: BlobHandle = builder.get_or_add_blob(&[0x01])?;
/// assert!(!handle.is_nil());
/// # Ok::<(), cilheaps::Error>(())
/// ```
pub mod prelude;

/// Building and serialization of the metadata heaps.
pub mod metadata;

/// Compressed integer encoding and heap alignment helpers.
pub mod utils;

/// `cilheaps` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `cilheaps` Error type
///
/// The main error type for all operations in this crate.
pub use error::Error;

/// Entry point and output types of the heap builder.
///
/// See [`metadata::builder`] for the life cycle of a builder.
pub use metadata::builder::{MetadataHeapsBuilder, SealedHeaps, SerializedHeaps, StreamLayout};

/// Heap identifiers, sizes, start offsets and handles.
pub use metadata::heaps::{
    BlobHandle, ConstantValue, GuidHandle, HeapIndex, HeapSizes, HeapStartOffsets, StringHandle,
    UserStringHandle,
};
