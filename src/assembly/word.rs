//! Bit-to-word accumulation.

use crate::extraction::UnbiasedBit;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Output word width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum WordWidth {
    /// 8-bit bytes.
    #[default]
    Byte,
    /// 32-bit unsigned integers.
    Word32,
}

impl WordWidth {
    /// Number of bits in a word of this width.
    #[inline]
    pub const fn bits(self) -> u32 {
        match self {
            WordWidth::Byte => 8,
            WordWidth::Word32 => 32,
        }
    }
}

impl fmt::Display for WordWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-bit", self.bits())
    }
}

/// Error for a word width other than 8 or 32.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported word width {0} (must be 8 or 32)")]
pub struct UnsupportedWidth(pub u32);

impl TryFrom<u32> for WordWidth {
    type Error = UnsupportedWidth;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        match bits {
            8 => Ok(WordWidth::Byte),
            32 => Ok(WordWidth::Word32),
            other => Err(UnsupportedWidth(other)),
        }
    }
}

impl From<WordWidth> for u32 {
    fn from(width: WordWidth) -> Self {
        width.bits()
    }
}

/// A completed output word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Word {
    /// An 8-bit word.
    Byte(u8),
    /// A 32-bit word.
    Word32(u32),
}

impl Word {
    /// Returns the value widened to `u32`.
    #[inline]
    pub fn value(self) -> u32 {
        match self {
            Word::Byte(v) => v as u32,
            Word::Word32(v) => v,
        }
    }

    /// Width this word was assembled at.
    #[inline]
    pub fn width(self) -> WordWidth {
        match self {
            Word::Byte(_) => WordWidth::Byte,
            Word::Word32(_) => WordWidth::Word32,
        }
    }

    /// Little-endian bytes of the word (one byte for `Byte`).
    pub fn to_le_bytes(self) -> Vec<u8> {
        match self {
            Word::Byte(v) => vec![v],
            Word::Word32(v) => v.to_le_bytes().to_vec(),
        }
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Accumulates unbiased bits into words, least significant bit first.
///
/// Invariant: `bit_count < width` except at the instant a word is
/// returned, after which the accumulator is back to `(0, 0)`.
#[derive(Debug, Clone)]
pub struct WordAssembler {
    width: WordWidth,
    value: u32,
    bit_count: u32,
}

impl WordAssembler {
    /// Creates an empty assembler for `width`-bit words.
    pub fn new(width: WordWidth) -> Self {
        Self {
            width,
            value: 0,
            bit_count: 0,
        }
    }

    /// Sets the next bit position and returns the word once full.
    pub fn push(&mut self, bit: UnbiasedBit) -> Option<Word> {
        self.value |= (bit.as_u8() as u32) << self.bit_count;
        self.bit_count += 1;

        if self.bit_count < self.width.bits() {
            return None;
        }

        let word = match self.width {
            WordWidth::Byte => Word::Byte(self.value as u8),
            WordWidth::Word32 => Word::Word32(self.value),
        };
        self.value = 0;
        self.bit_count = 0;
        Some(word)
    }

    /// Configured word width.
    #[inline]
    pub fn width(&self) -> WordWidth {
        self.width
    }

    /// Partial value accumulated so far.
    #[inline]
    pub fn value(&self) -> u32 {
        self.value
    }

    /// Bits accumulated toward the current word.
    #[inline]
    pub fn bit_count(&self) -> u32 {
        self.bit_count
    }
}
