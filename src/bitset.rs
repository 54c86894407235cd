//! Fixed-width bit vectors over the training samples.
//!
//! Every rule, every label and every search node is described by the set of
//! samples it captures. This module provides a dense bit vector backed by
//! `u64` words, with the handful of set operations the search needs:
//! intersection, difference, union and population count, all `O(n / 64)`.
//!
//! Bits past the logical width are always kept clear, so two vectors with the
//! same width and the same set samples compare (and hash) equal. This is what
//! makes [`BitSet`] usable as a key of the captured-vector prefix cache.

use std::fmt;

/// A bit vector of fixed width backed by a vector of u64 words.
///
/// Bit `i` corresponds to sample `i`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BitSet {
    /// Storage: each u64 holds 64 bits
    words: Vec<u64>,
    /// Logical number of bits
    width: usize,
}

impl BitSet {
    /// Number of bits per word.
    const BITS_PER_WORD: usize = 64;

    fn num_words(width: usize) -> usize {
        width.div_ceil(Self::BITS_PER_WORD)
    }

    /// Creates an all-zero bit vector of the given width.
    pub fn zeros(width: usize) -> Self {
        Self {
            words: vec![0; Self::num_words(width)],
            width,
        }
    }

    /// Creates an all-one bit vector of the given width.
    pub fn ones(width: usize) -> Self {
        let mut bs = Self {
            words: vec![u64::MAX; Self::num_words(width)],
            width,
        };
        bs.clear_tail();
        bs
    }

    /// Creates a bit vector with bit `i` set iff the `i`-th item is `true`.
    pub fn from_bools(bits: impl IntoIterator<Item = bool>) -> Self {
        let mut bs = Self::zeros(0);
        let mut width = 0;
        for bit in bits {
            if width % Self::BITS_PER_WORD == 0 {
                bs.words.push(0);
            }
            if bit {
                let (word_idx, bit_idx) = Self::word_and_bit(width);
                bs.words[word_idx] |= 1u64 << bit_idx;
            }
            width += 1;
        }
        bs.width = width;
        bs
    }

    /// Creates a bit vector of the given width with the listed bits set.
    ///
    /// # Panics
    ///
    /// Panics if an index is not below `width`.
    pub fn from_indices(width: usize, indices: impl IntoIterator<Item = usize>) -> Self {
        let mut bs = Self::zeros(width);
        for index in indices {
            bs.insert(index);
        }
        bs
    }

    /// Returns the logical width in bits.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the number of set bits.
    #[inline]
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Returns true if no bits are set.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Gets the word index and bit position for a given bit index.
    #[inline]
    fn word_and_bit(index: usize) -> (usize, usize) {
        let word = index / Self::BITS_PER_WORD;
        let bit = index % Self::BITS_PER_WORD;
        (word, bit)
    }

    /// Returns true if the bit at the given index is set.
    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        if index >= self.width {
            return false;
        }
        let (word_idx, bit_idx) = Self::word_and_bit(index);
        (self.words[word_idx] >> bit_idx) & 1 != 0
    }

    /// Sets the bit at the given index. Returns true if the bit was not previously set.
    pub(crate) fn insert(&mut self, index: usize) -> bool {
        assert!(index < self.width, "Bit {} out of range 0..{}", index, self.width);
        let (word_idx, bit_idx) = Self::word_and_bit(index);
        let mask = 1u64 << bit_idx;
        let was_clear = (self.words[word_idx] & mask) == 0;
        self.words[word_idx] |= mask;
        was_clear
    }

    fn clear_tail(&mut self) {
        let rem = self.width % Self::BITS_PER_WORD;
        if rem != 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= (1u64 << rem) - 1;
            }
        }
    }

    fn check_width(&self, other: &BitSet) {
        debug_assert_eq!(self.width, other.width, "Bit vectors of different width");
    }

    /// Returns `self & other`.
    pub fn and(&self, other: &BitSet) -> BitSet {
        self.check_width(other);
        BitSet {
            words: self.words.iter().zip(&other.words).map(|(a, b)| a & b).collect(),
            width: self.width,
        }
    }

    /// Returns `self & !other`.
    pub fn and_not(&self, other: &BitSet) -> BitSet {
        self.check_width(other);
        BitSet {
            words: self.words.iter().zip(&other.words).map(|(a, b)| a & !b).collect(),
            width: self.width,
        }
    }

    /// Returns `self | other`.
    pub fn or(&self, other: &BitSet) -> BitSet {
        self.check_width(other);
        BitSet {
            words: self.words.iter().zip(&other.words).map(|(a, b)| a | b).collect(),
            width: self.width,
        }
    }

    /// Returns the complement of `self` within its width.
    pub fn not(&self) -> BitSet {
        let mut bs = BitSet {
            words: self.words.iter().map(|w| !w).collect(),
            width: self.width,
        };
        bs.clear_tail();
        bs
    }

    /// Accumulates `self &= !other` in place.
    pub fn and_not_assign(&mut self, other: &BitSet) {
        self.check_width(other);
        for (a, b) in self.words.iter_mut().zip(&other.words) {
            *a &= !b;
        }
    }

    /// Returns the popcount of `self & other` without allocating.
    #[inline]
    pub fn and_count(&self, other: &BitSet) -> usize {
        self.check_width(other);
        self.words
            .iter()
            .zip(&other.words)
            .map(|(a, b)| (a & b).count_ones() as usize)
            .sum()
    }

    /// Returns the popcount of `self & !other` without allocating.
    #[inline]
    pub fn and_not_count(&self, other: &BitSet) -> usize {
        self.check_width(other);
        self.words
            .iter()
            .zip(&other.words)
            .map(|(a, b)| (a & !b).count_ones() as usize)
            .sum()
    }

    /// Returns an iterator over all set bit indices.
    pub fn iter(&self) -> BitSetIter<'_> {
        BitSetIter {
            bitset: self,
            word_idx: 0,
            current_word: self.words.first().copied().unwrap_or(0),
        }
    }
}

impl fmt::Display for BitSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.width {
            write!(f, "{}", if self.contains(i) { '1' } else { '0' })?;
        }
        Ok(())
    }
}

/// Iterator over set bits in a BitSet.
pub struct BitSetIter<'a> {
    bitset: &'a BitSet,
    word_idx: usize,
    current_word: u64,
}

impl Iterator for BitSetIter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.current_word != 0 {
                let bit_idx = self.current_word.trailing_zeros() as usize;
                self.current_word &= self.current_word - 1; // Clear lowest set bit
                return Some(self.word_idx * BitSet::BITS_PER_WORD + bit_idx);
            }

            self.word_idx += 1;
            if self.word_idx >= self.bitset.words.len() {
                return None;
            }
            self.current_word = self.bitset.words[self.word_idx];
        }
    }
}
