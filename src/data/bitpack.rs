//! Bit-packed tensor-bin index streams.
//!
//! Each training sample carries one small unsigned integer per term: the
//! index of the update-tensor bin the sample falls into. To keep the hot
//! update loop bandwidth-bound rather than capacity-bound, several indices
//! are packed into each `u64` storage word at a fixed field width.
//!
//! # Layout
//!
//! A stream is parameterized by `items_per_word` (`k`), which determines
//! `bits_per_item = 64 / k` (integer division; any leftover high bits of a
//! word are unused). Items occupy a word low-bits-first, so consumers
//! extract with a mask of the low `bits_per_item` bits and shift right.
//!
//! When the total item count is not a multiple of `k`, the remainder is
//! stored in the **first** word, which holds `((n - 1) % k) + 1` items;
//! every following word holds exactly `k`. Putting the short block first
//! lets the update loop run all subsequent blocks with a fixed trip count,
//! which is what makes the block structure worth having (see
//! [`crate::training::apply_term_update`]).

use thiserror::Error;

/// Bit width of one storage word.
pub const WORD_BITS: usize = u64::BITS as usize;

/// Error building a [`PackedIndexStream`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PackError {
    /// `items_per_word` outside `1..=64`.
    #[error("items_per_word must be in 1..=64, got {0}")]
    InvalidItemsPerWord(usize),

    /// A stream must describe at least one sample.
    #[error("cannot pack an empty index sequence")]
    Empty,

    /// An index does not fit the per-item field width.
    #[error("index {index} at position {position} does not fit in {bits} bits")]
    IndexTooWide {
        index: usize,
        position: usize,
        bits: usize,
    },

    /// Pre-packed word count does not match the remainder-first layout.
    #[error("expected {expected} storage words for {n_indices} indices, got {actual}")]
    WordCountMismatch {
        expected: usize,
        actual: usize,
        n_indices: usize,
    },
}

/// A bit-packed sequence of tensor-bin indices, one per sample.
///
/// # Example
///
/// ```
/// use cycleboost::data::PackedIndexStream;
///
/// // 5 indices at 8 items per word: the first word holds the remainder
/// // block of 5, at 64 / 8 = 8 bits each.
/// let stream = PackedIndexStream::pack(&[3, 0, 1, 2, 1], 8).unwrap();
/// assert_eq!(stream.len(), 5);
/// assert_eq!(stream.bits_per_item(), 8);
/// assert_eq!(stream.iter().collect::<Vec<_>>(), vec![3, 0, 1, 2, 1]);
/// ```
#[derive(Debug, Clone)]
pub struct PackedIndexStream {
    words: Box<[u64]>,
    n_indices: usize,
    items_per_word: usize,
}

impl PackedIndexStream {
    /// Pack `indices` at `items_per_word` items per storage word.
    ///
    /// The remainder block is laid out in the first word as the update
    /// kernels expect. Fails if an index does not fit the field width.
    pub fn pack(indices: &[usize], items_per_word: usize) -> Result<Self, PackError> {
        if items_per_word == 0 || items_per_word > WORD_BITS {
            return Err(PackError::InvalidItemsPerWord(items_per_word));
        }
        if indices.is_empty() {
            return Err(PackError::Empty);
        }

        let bits = WORD_BITS / items_per_word;
        let max_index = (u64::MAX >> (WORD_BITS - bits)) as usize;
        let n = indices.len();

        let mut words = vec![0u64; word_count(n, items_per_word)];
        let mut word_idx = 0;
        let mut slot = 0;
        let mut block_len = first_block_len(n, items_per_word);
        for (position, &index) in indices.iter().enumerate() {
            if index > max_index {
                return Err(PackError::IndexTooWide {
                    index,
                    position,
                    bits,
                });
            }
            words[word_idx] |= (index as u64) << (slot * bits);
            slot += 1;
            if slot == block_len {
                word_idx += 1;
                slot = 0;
                block_len = items_per_word;
            }
        }

        Ok(Self {
            words: words.into_boxed_slice(),
            n_indices: n,
            items_per_word,
        })
    }

    /// Adopt words packed elsewhere (e.g. by the binning pipeline).
    ///
    /// The words must already follow the remainder-first layout; only the
    /// word count is checked, not the field contents.
    pub fn from_words(
        words: Vec<u64>,
        n_indices: usize,
        items_per_word: usize,
    ) -> Result<Self, PackError> {
        if items_per_word == 0 || items_per_word > WORD_BITS {
            return Err(PackError::InvalidItemsPerWord(items_per_word));
        }
        if n_indices == 0 {
            return Err(PackError::Empty);
        }
        let expected = word_count(n_indices, items_per_word);
        if words.len() != expected {
            return Err(PackError::WordCountMismatch {
                expected,
                actual: words.len(),
                n_indices,
            });
        }
        Ok(Self {
            words: words.into_boxed_slice(),
            n_indices,
            items_per_word,
        })
    }

    /// Number of indices (samples) in the stream.
    #[inline]
    pub fn len(&self) -> usize {
        self.n_indices
    }

    /// Whether the stream holds no indices. Construction rejects empty
    /// input, so this only returns true if that invariant ever moves.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n_indices == 0
    }

    /// Items packed per storage word.
    #[inline]
    pub fn items_per_word(&self) -> usize {
        self.items_per_word
    }

    /// Field width of one packed index.
    #[inline]
    pub fn bits_per_item(&self) -> usize {
        WORD_BITS / self.items_per_word
    }

    /// Number of items in the first (possibly short) block.
    #[inline]
    pub fn first_block_len(&self) -> usize {
        first_block_len(self.n_indices, self.items_per_word)
    }

    /// The raw storage words, remainder block first.
    #[inline]
    pub fn words(&self) -> &[u64] {
        &self.words
    }

    /// Decode one index at a time, in sample order.
    ///
    /// This is the reference decoder: the block-structured update loop must
    /// observe exactly this sequence. It is also the right access path for
    /// anything outside the hot loop.
    pub fn iter(&self) -> IndexIter<'_> {
        IndexIter {
            words: &self.words,
            bits: self.bits_per_item(),
            mask: u64::MAX >> (WORD_BITS - self.bits_per_item()),
            items_per_word: self.items_per_word,
            word_idx: 0,
            slot: 0,
            block_len: self.first_block_len(),
            remaining: self.n_indices,
        }
    }
}

/// Storage words needed for `n` indices at `items_per_word`.
#[inline]
pub(crate) fn word_count(n: usize, items_per_word: usize) -> usize {
    let first = first_block_len(n, items_per_word);
    1 + (n - first) / items_per_word
}

/// Length of the first block: `((n - 1) % k) + 1`, the only block that may
/// be shorter than `k`.
#[inline]
pub(crate) fn first_block_len(n: usize, items_per_word: usize) -> usize {
    debug_assert!(n >= 1);
    (n - 1) % items_per_word + 1
}

/// Sequential decoder over a [`PackedIndexStream`].
pub struct IndexIter<'a> {
    words: &'a [u64],
    bits: usize,
    mask: u64,
    items_per_word: usize,
    word_idx: usize,
    slot: usize,
    block_len: usize,
    remaining: usize,
}

impl Iterator for IndexIter<'_> {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        let word = self.words[self.word_idx];
        let index = ((word >> (self.slot * self.bits)) & self.mask) as usize;
        self.slot += 1;
        self.remaining -= 1;
        if self.slot == self.block_len {
            self.word_idx += 1;
            self.slot = 0;
            self.block_len = self.items_per_word;
        }
        Some(index)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for IndexIter<'_> {}
