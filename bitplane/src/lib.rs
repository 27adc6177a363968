//! Contiguous, word-aligned bit containers.
//!
//! `bitplane` provides the storage layer for bit-parallel simulation: a
//! 256-bit [`BitBlock`] that LLVM vectorizes, a padded [`BitVec`], borrowed
//! row views ([`BitView`], [`BitViewMut`]), and a rectangular [`BitTable`]
//! whose rows all start at block-aligned offsets.
//!
//! Two invariants hold for every public operation:
//!
//! - bits at indices at or beyond the logical length are zero, so word-level
//!   popcounts and dot products never see stale padding;
//! - element-wise operations require operands of equal padded word length
//!   and panic otherwise.

pub mod block;
pub mod table;
pub mod vec;
pub mod view;

pub use block::{BitBlock, Word, BLOCK_BITS, WORDS_PER_BLOCK};
pub use table::BitTable;
pub use vec::BitVec;
pub use view::{BitView, BitViewMut, Bits, BitsMut};

/// Alignment, in bits, of every row of a [`BitTable`] and of [`BitVec`]
/// storage.
pub const BIT_ALIGNMENT: usize = BLOCK_BITS;

/// Number of words needed to hold `bits` bits, rounded up to a whole number
/// of blocks.
#[must_use]
pub fn padded_word_count(bits: usize) -> usize {
    bits.div_ceil(BLOCK_BITS) * WORDS_PER_BLOCK
}
