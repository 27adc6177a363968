use rand::Rng;
use sorted_iter::assume::AssumeSortedByItemExt;
use sorted_iter::SortedIterator;

use crate::block::Word;

/// Read access to a padded bit container.
///
/// Everything is derived from [`Bits::words`] and [`Bits::bit_len`]: the
/// word slice covers the padded storage, while `bit_len` is the logical
/// length. Implementations guarantee that bits at or beyond `bit_len` are
/// zero.
pub trait Bits {
    fn words(&self) -> &[Word];
    fn bit_len(&self) -> usize;

    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[inline]
    fn index(&self, index: usize) -> bool {
        assert!(index < self.bit_len(), "bit index {index} out of range");
        let word = self.words()[index / Word::BITS as usize];
        (word >> (index % Word::BITS as usize)) & 1 != 0
    }

    #[inline]
    fn count_ones(&self) -> usize {
        self.words().iter().map(|word| word.count_ones() as usize).sum()
    }

    #[inline]
    fn parity(&self) -> bool {
        self.words().iter().fold(0, |acc, word| acc ^ word).count_ones() & 1 != 0
    }

    #[inline]
    fn is_zero(&self) -> bool {
        self.words().iter().all(|&word| word == 0)
    }

    /// Parity of the AND with `other`, i.e. the GF(2) inner product.
    #[inline]
    fn dot<Other: Bits + ?Sized>(&self, other: &Other) -> bool {
        assert_padded_lengths_match(self, other);
        let mut acc = 0;
        for (&left, &right) in self.words().iter().zip(other.words()) {
            acc ^= left & right;
        }
        acc.count_ones() & 1 != 0
    }

    /// Indices of the set bits, in increasing order.
    fn support(&self) -> impl SortedIterator<Item = usize> + '_ {
        let words = self.words();
        words
            .iter()
            .enumerate()
            .flat_map(|(word_index, &word)| {
                SetBits {
                    word,
                    base: word_index * Word::BITS as usize,
                }
            })
            .assume_sorted_by_item()
    }
}

/// Write access to a padded bit container.
pub trait BitsMut: Bits {
    fn words_mut(&mut self) -> &mut [Word];

    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[inline]
    fn assign_index(&mut self, index: usize, to: bool) {
        assert!(index < self.bit_len(), "bit index {index} out of range");
        let word = &mut self.words_mut()[index / Word::BITS as usize];
        let mask = 1 << (index % Word::BITS as usize);
        if to {
            *word |= mask;
        } else {
            *word &= !mask;
        }
    }

    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[inline]
    fn negate_index(&mut self, index: usize) {
        assert!(index < self.bit_len(), "bit index {index} out of range");
        self.words_mut()[index / Word::BITS as usize] ^= 1 << (index % Word::BITS as usize);
    }

    #[inline]
    fn clear_bits(&mut self) {
        self.words_mut().fill(0);
    }

    #[inline]
    fn assign<Other: Bits + ?Sized>(&mut self, other: &Other) {
        assert_padded_lengths_match(self, other);
        self.words_mut().copy_from_slice(other.words());
    }

    #[inline]
    fn xor_assign<Other: Bits + ?Sized>(&mut self, other: &Other) {
        assert_padded_lengths_match(self, other);
        for (word, &rhs) in self.words_mut().iter_mut().zip(other.words()) {
            *word ^= rhs;
        }
    }

    #[inline]
    fn and_assign<Other: Bits + ?Sized>(&mut self, other: &Other) {
        assert_padded_lengths_match(self, other);
        for (word, &rhs) in self.words_mut().iter_mut().zip(other.words()) {
            *word &= rhs;
        }
    }

    #[inline]
    fn or_assign<Other: Bits + ?Sized>(&mut self, other: &Other) {
        assert_padded_lengths_match(self, other);
        for (word, &rhs) in self.words_mut().iter_mut().zip(other.words()) {
            *word |= rhs;
        }
    }

    /// Clears every bit that is set in `other`.
    #[inline]
    fn and_not_assign<Other: Bits + ?Sized>(&mut self, other: &Other) {
        assert_padded_lengths_match(self, other);
        for (word, &rhs) in self.words_mut().iter_mut().zip(other.words()) {
            *word &= !rhs;
        }
    }

    /// Flips the first `bit_len` bits; padding stays zero.
    fn invert_bits(&mut self) {
        let bit_len = self.bit_len();
        let full_words = bit_len / Word::BITS as usize;
        let tail_bits = bit_len % Word::BITS as usize;
        let words = self.words_mut();
        for word in &mut words[..full_words] {
            *word = !*word;
        }
        if tail_bits > 0 {
            words[full_words] ^= (1 << tail_bits) - 1;
        }
    }

    /// Fills the first `bit_len` bits with uniformly random values; padding
    /// stays zero.
    fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let bit_len = self.bit_len();
        let used_words = bit_len.div_ceil(Word::BITS as usize);
        let tail_bits = bit_len % Word::BITS as usize;
        let words = self.words_mut();
        rng.fill(&mut words[..used_words]);
        if tail_bits > 0 {
            words[used_words - 1] &= (1 << tail_bits) - 1;
        }
        for word in &mut words[used_words..] {
            *word = 0;
        }
    }
}

#[inline]
fn assert_padded_lengths_match<Left: Bits + ?Sized, Right: Bits + ?Sized>(left: &Left, right: &Right) {
    assert_eq!(
        left.words().len(),
        right.words().len(),
        "bit containers have mismatched padded lengths"
    );
}

/// Iterator over the set-bit positions of a single word.
struct SetBits {
    word: Word,
    base: usize,
}

impl Iterator for SetBits {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        if self.word == 0 {
            return None;
        }
        let offset = self.word.trailing_zeros() as usize;
        self.word &= self.word - 1;
        Some(self.base + offset)
    }
}

/// Borrowed, block-aligned view of a row or vector.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[must_use]
pub struct BitView<'life> {
    pub(crate) words: &'life [Word],
    pub(crate) bit_len: usize,
}

/// Mutable counterpart of [`BitView`].
#[derive(Debug, Eq, PartialEq)]
#[must_use]
pub struct BitViewMut<'life> {
    pub(crate) words: &'life mut [Word],
    pub(crate) bit_len: usize,
}

impl<'life> BitView<'life> {
    pub fn new(words: &'life [Word], bit_len: usize) -> Self {
        debug_assert!(bit_len <= words.len() * Word::BITS as usize);
        BitView { words, bit_len }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bit_len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bit_len == 0
    }
}

impl<'life> BitViewMut<'life> {
    pub fn new(words: &'life mut [Word], bit_len: usize) -> Self {
        debug_assert!(bit_len <= words.len() * Word::BITS as usize);
        BitViewMut { words, bit_len }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bit_len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bit_len == 0
    }

    /// Reborrow as a shared view.
    pub fn as_view(&self) -> BitView<'_> {
        BitView {
            words: self.words,
            bit_len: self.bit_len,
        }
    }
}

impl Bits for BitView<'_> {
    fn words(&self) -> &[Word] {
        self.words
    }
    fn bit_len(&self) -> usize {
        self.bit_len
    }
}

impl Bits for BitViewMut<'_> {
    fn words(&self) -> &[Word] {
        self.words
    }
    fn bit_len(&self) -> usize {
        self.bit_len
    }
}

impl BitsMut for BitViewMut<'_> {
    fn words_mut(&mut self) -> &mut [Word] {
        self.words
    }
}
