//! Shared encoding and arithmetic helpers.

mod compressed;
mod math;

pub use compressed::{
    compressed_uint_size, encode_compressed_uint, write_compressed_uint, MAX_COMPRESSED_UINT,
};
pub use math::{align_to, heap_padding, to_u32, HEAP_ALIGNMENT};
