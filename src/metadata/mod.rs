//! Construction of the variable-length metadata streams of a .NET image.
//!
//! # Key Components
//!
//! - [`heaps`] - The `#Strings`, `#US`, `#GUID` and `#Blob` heaps, their handles and buffers
//! - [`builder`] - [`MetadataHeapsBuilder`](builder::MetadataHeapsBuilder), the entry point
//!   that interns values and assembles the heap streams
//!
//! # Examples
//!
//! ```rust
//! use cilheaps::metadata::builder::MetadataHeapsBuilder;
//! use cilheaps::metadata::heaps::HeapIndex;
//!
//! let mut builder = MetadataHeapsBuilder::new();
//! let name = builder.get_or_add_string("<Module>")?;
//!
//! let sealed = builder.finalize()?;
//! assert_eq!(sealed.string_offset(name)?, 1);
//!
//! let heaps = sealed.write_heaps()?;
//! assert_eq!(heaps.heap(HeapIndex::String), b"\0<Module>\0\0\0");
//! # Ok::<(), cilheaps::Error>(())
//! ```

/// Two-phase builder that interns values and emits the heap streams
pub mod builder;
/// The individual heaps, their handles and the append buffer
pub mod heaps;
