use std::fmt;

use crate::block::{blocks_as_words, blocks_as_words_mut, BitBlock, Word, BLOCK_BITS};
use crate::view::{BitView, BitViewMut, Bits, BitsMut};

/// Owned bit vector, padded up to whole [`BitBlock`]s.
///
/// The logical length is fixed at construction; bits at or beyond it are
/// kept zero by every public operation so that word-level arithmetic is
/// always safe.
#[derive(Clone, Eq, Hash, PartialEq)]
#[must_use]
pub struct BitVec {
    blocks: Vec<BitBlock>,
    bit_len: usize,
}

impl BitVec {
    pub fn zeros(bit_len: usize) -> Self {
        BitVec {
            blocks: vec![BitBlock::default(); bit_len.div_ceil(BLOCK_BITS)],
            bit_len,
        }
    }

    pub fn ones(bit_len: usize) -> Self {
        let mut result = BitVec {
            blocks: vec![BitBlock::ones(); bit_len.div_ceil(BLOCK_BITS)],
            bit_len,
        };
        result.mask_padding();
        result
    }

    pub fn from_bools(bits: impl IntoIterator<Item = bool>) -> Self {
        let bits: Vec<bool> = bits.into_iter().collect();
        let mut result = BitVec::zeros(bits.len());
        for (index, bit) in bits.into_iter().enumerate() {
            result.assign_index(index, bit);
        }
        result
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bit_len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bit_len == 0
    }

    /// Padded length in words.
    #[must_use]
    pub fn word_len(&self) -> usize {
        self.words().len()
    }

    pub fn as_view(&self) -> BitView<'_> {
        BitView::new(blocks_as_words(&self.blocks), self.bit_len)
    }

    pub fn as_view_mut(&mut self) -> BitViewMut<'_> {
        BitViewMut::new(blocks_as_words_mut(&mut self.blocks), self.bit_len)
    }

    pub fn from_view(view: &BitView<'_>) -> Self {
        let mut result = BitVec::zeros(view.len());
        result.words_mut().copy_from_slice(view.words());
        result
    }

    pub fn swap_with(&mut self, other: &mut BitVec) {
        assert_eq!(
            self.blocks.len(),
            other.blocks.len(),
            "bit containers have mismatched padded lengths"
        );
        std::mem::swap(&mut self.blocks, &mut other.blocks);
        std::mem::swap(&mut self.bit_len, &mut other.bit_len);
    }

    /// Words `[start, start + count)` of the padded storage.
    ///
    /// # Panics
    ///
    /// Panics if the range exceeds the padded storage.
    #[must_use]
    pub fn word_range(&self, start: usize, count: usize) -> &[Word] {
        &self.words()[start..start + count]
    }

    pub fn word_range_mut(&mut self, start: usize, count: usize) -> &mut [Word] {
        &mut self.words_mut()[start..start + count]
    }

    fn mask_padding(&mut self) {
        let bit_len = self.bit_len;
        let used_words = bit_len.div_ceil(Word::BITS as usize);
        let tail_bits = bit_len % Word::BITS as usize;
        let words = self.words_mut();
        if tail_bits > 0 {
            words[used_words - 1] &= (1 << tail_bits) - 1;
        }
        for word in &mut words[used_words..] {
            *word = 0;
        }
    }
}

impl Bits for BitVec {
    fn words(&self) -> &[Word] {
        blocks_as_words(&self.blocks)
    }
    fn bit_len(&self) -> usize {
        self.bit_len
    }
}

impl BitsMut for BitVec {
    fn words_mut(&mut self) -> &mut [Word] {
        blocks_as_words_mut(&mut self.blocks)
    }
}

impl fmt::Debug for BitVec {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "BitVec[")?;
        for index in 0..self.bit_len {
            write!(formatter, "{}", u8::from(self.index(index)))?;
        }
        write!(formatter, "]")
    }
}

impl FromIterator<bool> for BitVec {
    fn from_iter<Iterable: IntoIterator<Item = bool>>(iterable: Iterable) -> Self {
        BitVec::from_bools(iterable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn ones_masks_padding() {
        let ones = BitVec::ones(70);
        assert_eq!(ones.count_ones(), 70);
        assert_eq!(ones.word_len(), 4);
        assert_eq!(ones.words()[2], 0);
    }

    #[test]
    fn xor_or_and_roundtrip() {
        let mut left = BitVec::from_bools([true, false, true, false]);
        let right = BitVec::from_bools([true, true, false, false]);
        left.xor_assign(&right);
        assert_eq!(left, BitVec::from_bools([false, true, true, false]));
        left.or_assign(&right);
        assert_eq!(left, BitVec::from_bools([true, true, true, false]));
        left.and_assign(&right);
        assert_eq!(left, right);
    }

    #[test]
    fn randomize_keeps_padding_zero() {
        let mut bits = BitVec::zeros(100);
        let mut rng = SmallRng::seed_from_u64(7);
        bits.randomize(&mut rng);
        for word in &bits.words()[2..] {
            assert_eq!(*word, 0);
        }
        assert_eq!(bits.words()[1] >> 36, 0);
    }

    #[test]
    fn support_is_sorted() {
        let bits = BitVec::from_bools((0..300).map(|index| index % 67 == 0));
        let support: Vec<usize> = bits.support().collect();
        assert_eq!(support, vec![0, 67, 134, 201, 268]);
    }

    #[test]
    fn swap_with_exchanges_contents() {
        let mut left = BitVec::ones(256);
        let mut right = BitVec::zeros(256);
        left.swap_with(&mut right);
        assert!(left.is_zero());
        assert_eq!(right.count_ones(), 256);
    }
}
