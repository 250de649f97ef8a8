//! Bit extraction and bias cancellation.
//!
//! This module converts raw bytes into bits using each source's
//! calibrated threshold, then cancels first-order bias by comparing
//! the two sources and keeping only disagreements.
//!
//! ```text
//! source A ─ BitExtractor ─┐
//!                          ├─ combine ─ UnbiasedBit
//! source B ─ BitExtractor ─┘
//! ```

mod bit;
mod debias;
mod extractor;

pub use bit::{BitResult, Threshold, UnbiasedBit};
pub use debias::{combine, ComparisonDebiaser, DebiasStats};
pub use extractor::{extract, BitExtractor, ExtractorStats};
