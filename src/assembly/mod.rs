//! Word assembly.
//!
//! Collects unbiased bits into fixed-width output words. The width is
//! chosen once at startup; one assembler serves one output stream.

mod word;

pub use word::{UnsupportedWidth, Word, WordAssembler, WordWidth};
