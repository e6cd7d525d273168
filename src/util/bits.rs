//! Packed bit vectors with Hamming distance.

const WORD_BITS: usize = u64::BITS as usize;

/// Fixed-length bit vector packed into `u64` words.
///
/// Bits past `len` in the last word are always zero, so equality and
/// Hamming distance can operate on whole words.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct BitVec {
    words: Vec<u64>,
    len: usize,
}

impl BitVec {
    pub(crate) fn from_bools<I>(bits: I) -> Self
    where
        I: IntoIterator<Item = bool>,
    {
        let mut words = Vec::new();
        let mut len = 0usize;
        for bit in bits {
            if len % WORD_BITS == 0 {
                words.push(0);
            }
            if bit {
                if let Some(word) = words.last_mut() {
                    *word |= 1u64 << (len % WORD_BITS);
                }
            }
            len += 1;
        }
        Self { words, len }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn get(&self, idx: usize) -> Option<bool> {
        if idx >= self.len {
            return None;
        }
        let word = self.words[idx / WORD_BITS];
        Some((word >> (idx % WORD_BITS)) & 1 == 1)
    }

    pub(crate) fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Number of differing positions, or `None` when lengths differ.
    pub(crate) fn hamming(&self, other: &BitVec) -> Option<usize> {
        if self.len != other.len {
            return None;
        }
        let dist = self
            .words
            .iter()
            .zip(other.words.iter())
            .map(|(a, b)| (a ^ b).count_ones() as usize)
            .sum();
        Some(dist)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).filter_map(move |idx| self.get(idx))
    }
}
