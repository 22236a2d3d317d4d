//! Data-side containers consumed by the update kernels.
//!
//! The binning pipeline that assigns each sample its tensor-bin index lives
//! outside this crate; what arrives here is the already-quantized,
//! bit-packed index stream described on [`PackedIndexStream`].

mod bitpack;

pub use bitpack::{PackError, PackedIndexStream, WORD_BITS};
pub(crate) use bitpack::{first_block_len, word_count};
