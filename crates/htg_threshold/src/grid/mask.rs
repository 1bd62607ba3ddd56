//! BitMask - word-packed per-cell validity bits.
//!
//! A set bit marks a cell as masked (hidden/invalid). Bits past the end of
//! the mask read as unmasked, so a grid may carry a mask shorter than its
//! cell count.

use crate::error::{ThresholdError, ThresholdResult};

const WORD_BITS: usize = 64;

/// Per-cell mask bits, one bit per cell id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BitMask {
  words: Vec<u64>,
  len: usize,
}

impl BitMask {
  /// Mask of `len` cells, all unmasked.
  pub fn new(len: usize) -> Self {
    Self {
      words: vec![0; len.div_ceil(WORD_BITS)],
      len,
    }
  }

  /// Mask of `len` cells, all masked.
  pub fn all_masked(len: usize) -> Self {
    let mut mask = Self {
      words: vec![u64::MAX; len.div_ceil(WORD_BITS)],
      len,
    };
    mask.clear_tail();
    mask
  }

  /// Fallible variant of [`BitMask::new`] for run-time output buffers.
  pub fn try_new(len: usize) -> ThresholdResult<Self> {
    let mut words = Vec::new();
    words.try_reserve_exact(len.div_ceil(WORD_BITS))?;
    words.resize(len.div_ceil(WORD_BITS), 0);
    Ok(Self { words, len })
  }

  /// Fallible variant of [`BitMask::all_masked`].
  pub fn try_all_masked(len: usize) -> ThresholdResult<Self> {
    let mut words = Vec::new();
    words.try_reserve_exact(len.div_ceil(WORD_BITS))?;
    words.resize(len.div_ceil(WORD_BITS), u64::MAX);
    let mut mask = Self { words, len };
    mask.clear_tail();
    Ok(mask)
  }

  /// Build from a slice of booleans (true = masked).
  pub fn from_bools(bits: &[bool]) -> Self {
    let mut mask = Self::new(bits.len());
    for (idx, &bit) in bits.iter().enumerate() {
      if bit {
        mask.words[idx / WORD_BITS] |= 1 << (idx % WORD_BITS);
      }
    }
    mask
  }

  /// Number of cells covered.
  #[inline]
  pub fn len(&self) -> usize {
    self.len
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  /// Read a bit; out-of-range ids are unmasked.
  #[inline]
  pub fn get(&self, idx: usize) -> bool {
    if idx >= self.len {
      return false;
    }
    (self.words[idx / WORD_BITS] >> (idx % WORD_BITS)) & 1 == 1
  }

  /// Write a bit.
  #[inline]
  pub fn set(&mut self, idx: usize, masked: bool) -> ThresholdResult<()> {
    if idx >= self.len {
      return Err(ThresholdError::CellOutOfRange {
        id: idx,
        name: "mask".to_string(),
        len: self.len,
      });
    }
    let word = idx / WORD_BITS;
    let bit = idx % WORD_BITS;
    if masked {
      self.words[word] |= 1 << bit;
    } else {
      self.words[word] &= !(1 << bit);
    }
    Ok(())
  }

  /// Number of masked cells.
  pub fn masked_count(&self) -> usize {
    self.words.iter().map(|w| w.count_ones() as usize).sum()
  }

  /// Iterate masked cell ids in ascending order.
  pub fn masked_indices(&self) -> impl Iterator<Item = usize> + '_ {
    (0..self.len).filter(|&i| self.get(i))
  }

  /// Expand to one boolean per cell.
  pub fn to_bools(&self) -> Vec<bool> {
    (0..self.len).map(|i| self.get(i)).collect()
  }

  /// Raw words (bit `i` of word `w` is cell `w * 64 + i`).
  pub fn as_words(&self) -> &[u64] {
    &self.words
  }

  /// Zero the unused high bits of the last word so counts stay exact.
  fn clear_tail(&mut self) {
    let tail = self.len % WORD_BITS;
    if tail != 0 {
      if let Some(last) = self.words.last_mut() {
        *last &= (1u64 << tail) - 1;
      }
    }
  }
}

#[cfg(test)]
#[path = "mask_test.rs"]
mod mask_test;
