//! Bit-packed palette indices.
//!
//! A section's block states are 4096 fixed-width palette indices packed
//! into 64-bit words, lowest bits first. Two packing policies exist:
//! - `Padded` (20w17a+): a word holds `64 / bits` whole indices, the
//!   remaining high bits are unused.
//! - `Stretched` (17w47a..20w17a): indices are laid end to end and may
//!   straddle two words.
//!
//! Words come from NBT long arrays as `i64`; they are reinterpreted as
//! `u64` bit-for-bit before any shift.

use crate::error::{Error, Result};

/// Voxels per 16x16x16 section.
pub const SECTION_VOLUME: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Packing {
    Padded,
    Stretched,
}

impl Packing {
    pub fn from_stretches(stretches: bool) -> Self {
        if stretches { Packing::Stretched } else { Packing::Padded }
    }
}

/// Index width for a palette: `max(4, bit_length(len - 1))`.
pub fn bits_per_index(palette_len: usize) -> u32 {
    let max_index = palette_len.saturating_sub(1);
    (usize::BITS - max_index.leading_zeros()).max(4)
}

fn mask(bits: u32) -> u64 {
    u64::MAX >> (64 - bits)
}

fn word(words: &[i64], index: usize) -> Result<u64> {
    words
        .get(index)
        .map(|w| *w as u64)
        .ok_or(Error::TruncatedBlockStates {
            needed: index,
            len: words.len(),
        })
}

/// Random access to the `index`-th packed value.
pub fn extract(words: &[i64], index: usize, bits: u32, packing: Packing) -> Result<usize> {
    let width = bits as usize;
    let value = match packing {
        Packing::Padded => {
            let per_word = 64 / width;
            let offset = (index % per_word) * width;
            word(words, index / per_word)? >> offset
        }
        Packing::Stretched => {
            let start = index * width;
            let (w, offset) = (start / 64, start % 64);
            let mut value = word(words, w)? >> offset;
            // only 64 - offset bits of this index live in word w; the rest
            // are the low bits of the next word
            let low_len = 64 - offset;
            if low_len < width {
                value |= word(words, w + 1)? << low_len;
            }
            value
        }
    };
    Ok((value & mask(bits)) as usize)
}

/// Sequential decoder over packed indices.
///
/// Keeps a rolling accumulator so each word is loaded once. The
/// accumulator is wider than a word so a stretched index can carry its
/// low fragment into the next load.
#[derive(Debug, Clone)]
pub struct PackedIndices<'a> {
    words: &'a [i64],
    next_word: usize,
    acc: u128,
    avail: u32,
    bits: u32,
    packing: Packing,
    remaining: usize,
}

impl<'a> PackedIndices<'a> {
    pub fn new(words: &'a [i64], bits: u32, packing: Packing, count: usize) -> Self {
        Self {
            words,
            next_word: 0,
            acc: 0,
            avail: 0,
            bits,
            packing,
            remaining: count,
        }
    }

    fn refill(&mut self) -> Result<()> {
        let next = word(self.words, self.next_word)? as u128;
        self.next_word += 1;
        match self.packing {
            // leftover high bits are padding
            Packing::Padded => {
                self.acc = next;
                self.avail = 64;
            }
            Packing::Stretched => {
                self.acc |= next << self.avail;
                self.avail += 64;
            }
        }
        Ok(())
    }
}

impl Iterator for PackedIndices<'_> {
    type Item = Result<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        if self.avail < self.bits {
            if let Err(e) = self.refill() {
                self.remaining = 0;
                return Some(Err(e));
            }
        }
        let value = (self.acc & mask(self.bits) as u128) as usize;
        self.acc >>= self.bits;
        self.avail -= self.bits;
        self.remaining -= 1;
        Some(Ok(value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}
