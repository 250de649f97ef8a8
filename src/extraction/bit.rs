//! Bit-level value types shared by the extractor stages.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Calibrated binarization cutoff for one source.
///
/// Bytes above the threshold map to one, below to zero, and exactly
/// equal bytes are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Threshold(u8);

impl Threshold {
    /// Theoretical midpoint of an unbiased byte source.
    pub const MIDPOINT: Threshold = Threshold(128);

    /// Wraps a raw cutoff value.
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Raw cutoff value.
    #[inline]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Binarizes a raw byte against this threshold.
    #[inline]
    pub fn classify(self, byte: u8) -> BitResult {
        match byte.cmp(&self.0) {
            std::cmp::Ordering::Greater => BitResult::One,
            std::cmp::Ordering::Less => BitResult::Zero,
            std::cmp::Ordering::Equal => BitResult::Discard,
        }
    }
}

impl From<u8> for Threshold {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of binarizing a single raw byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitResult {
    /// Byte below the threshold.
    Zero,
    /// Byte above the threshold.
    One,
    /// Tie with the threshold or failed read; carries no bit.
    Discard,
}

impl BitResult {
    /// Returns the bit, or `None` for a discard.
    #[inline]
    pub fn bit(self) -> Option<UnbiasedBit> {
        match self {
            BitResult::Zero => Some(UnbiasedBit::Zero),
            BitResult::One => Some(UnbiasedBit::One),
            BitResult::Discard => None,
        }
    }
}

/// A bit that survived the comparison extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnbiasedBit {
    /// A `0` bit.
    Zero,
    /// A `1` bit.
    One,
}

impl UnbiasedBit {
    /// `0` or `1`.
    #[inline]
    pub fn as_u8(self) -> u8 {
        match self {
            UnbiasedBit::Zero => 0,
            UnbiasedBit::One => 1,
        }
    }
}

impl From<bool> for UnbiasedBit {
    fn from(value: bool) -> Self {
        if value {
            UnbiasedBit::One
        } else {
            UnbiasedBit::Zero
        }
    }
}

impl fmt::Display for UnbiasedBit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_tie_is_discarded() {
        let threshold = Threshold::new(77);
        assert_eq!(threshold.classify(77), BitResult::Discard);
        assert_eq!(threshold.classify(78), BitResult::One);
        assert_eq!(threshold.classify(76), BitResult::Zero);
    }

    #[test]
    fn test_extreme_thresholds() {
        // Threshold 0 can never produce a zero, 255 never a one.
        assert_eq!(Threshold::new(0).classify(0), BitResult::Discard);
        assert_eq!(Threshold::new(0).classify(1), BitResult::One);
        assert_eq!(Threshold::new(255).classify(255), BitResult::Discard);
        assert_eq!(Threshold::new(255).classify(254), BitResult::Zero);
    }

    #[test]
    fn test_bit_result_conversion() {
        assert_eq!(BitResult::One.bit(), Some(UnbiasedBit::One));
        assert_eq!(BitResult::Zero.bit(), Some(UnbiasedBit::Zero));
        assert_eq!(BitResult::Discard.bit(), None);
    }

    proptest! {
        #[test]
        fn classify_matches_ordering(byte: u8, threshold: u8) {
            let result = Threshold::new(threshold).classify(byte);
            prop_assert_eq!(result == BitResult::One, byte > threshold);
            prop_assert_eq!(result == BitResult::Zero, byte < threshold);
            prop_assert_eq!(result == BitResult::Discard, byte == threshold);
        }
    }
}
