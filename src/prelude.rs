//! # cilheaps Prelude
//!
//! This module provides a convenient prelude for the most commonly used types from the
//! cilheaps library. Import this module to get quick access to everything needed to build
//! and serialize metadata heaps.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all cilheaps operations
pub use crate::Error;

/// The result type used throughout cilheaps
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// Heap builder in its building, sealed and serialized states
pub use crate::metadata::builder::{
    MetadataHeapsBuilder, SealedHeaps, SerializedHeaps, StreamLayout,
};

/// Start offsets of delta generations
pub use crate::metadata::heaps::HeapStartOffsets;

// ================================================================================================
// Handles
// ================================================================================================

/// Typed handles into each heap
pub use crate::metadata::heaps::{BlobHandle, GuidHandle, StringHandle, UserStringHandle};

// ================================================================================================
// Heap Layout
// ================================================================================================

/// Heap identifiers and sizes
pub use crate::metadata::heaps::{HeapIndex, HeapSizes};

/// Constant values stored in the `#Blob` heap
pub use crate::metadata::heaps::ConstantValue;

/// The append buffer and its reservations
pub use crate::metadata::heaps::{HeapBuffer, Reservation};

/// Size of a single `#GUID` record
pub use crate::metadata::heaps::GUID_SIZE;
