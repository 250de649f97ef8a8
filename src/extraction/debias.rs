//! Two-source comparison extractor.
//!
//! If both sources share the same bias direction, agreement carries no
//! information, while disagreement yields one bit whose value (that of
//! the first source) is free of first-order bias.

use super::bit::{BitResult, UnbiasedBit};
use super::extractor::BitExtractor;
use crate::source::ByteSource;

/// Combines one result from each source into at most one unbiased bit.
///
/// Returns `Some(a)` only when both are real bits and they differ.
#[inline]
pub fn combine(a: BitResult, b: BitResult) -> Option<UnbiasedBit> {
    match (a.bit(), b.bit()) {
        (Some(bit_a), Some(bit_b)) if bit_a != bit_b => Some(bit_a),
        _ => None,
    }
}

/// Counters kept by a [`ComparisonDebiaser`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebiasStats {
    /// Extraction pairs examined.
    pub pairs: u64,
    /// Pairs that produced a bit.
    pub produced: u64,
    /// Pairs rejected because both sources agreed.
    pub agreements: u64,
    /// Pairs rejected because at least one side was discarded.
    pub discards: u64,
}

/// Drives two extractors and applies [`combine`] to every pair.
pub struct ComparisonDebiaser<A, B> {
    a: BitExtractor<A>,
    b: BitExtractor<B>,
    stats: DebiasStats,
}

impl<A: ByteSource, B: ByteSource> ComparisonDebiaser<A, B> {
    /// Pairs two extractors; `a` decides the emitted bit.
    pub fn new(a: BitExtractor<A>, b: BitExtractor<B>) -> Self {
        Self {
            a,
            b,
            stats: DebiasStats::default(),
        }
    }

    /// Performs one extraction on each source and combines the results.
    ///
    /// `None` means no bit was produced this round; call again.
    pub fn next_bit(&mut self) -> Option<UnbiasedBit> {
        let bit_a = self.a.extract();
        let bit_b = self.b.extract();
        self.stats.pairs += 1;

        let result = combine(bit_a, bit_b);
        match result {
            Some(_) => self.stats.produced += 1,
            None if bit_a == BitResult::Discard || bit_b == BitResult::Discard => {
                self.stats.discards += 1
            }
            None => self.stats.agreements += 1,
        }
        result
    }

    /// Pair counters so far.
    pub fn stats(&self) -> DebiasStats {
        self.stats
    }

    /// Borrows both extractors.
    pub fn extractors(&self) -> (&BitExtractor<A>, &BitExtractor<B>) {
        (&self.a, &self.b)
    }

    /// Releases both extractors.
    pub fn into_parts(self) -> (BitExtractor<A>, BitExtractor<B>) {
        (self.a, self.b)
    }
}
