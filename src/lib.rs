//! Havoc: unbiased random words from two noisy byte sources.
//!
//! Raw noise devices are rarely balanced. Havoc calibrates a threshold
//! for each of two independent sources, binarizes their bytes against
//! it, and keeps a bit only when the two sources disagree. Surviving
//! bits are packed into bytes or 32-bit words and handed to a sink.
//!
//! # Architecture
//!
//! ```text
//! source A ─┐                                  ┌─ sink
//!           ├─ calibration ─ extraction ─ assembly
//! source B ─┘   (median)     (compare)    (LSB first)
//! ```
//!
//! # Design Principles
//!
//! - **Ties are discarded**: a byte equal to its threshold never yields a bit
//! - **Read faults are soft**: a failed read is a discard, not an error
//! - **Calibration fails loudly**: a source that never answers aborts startup
//! - **No whitening claims**: only first-order bias is removed
//!
//! # Example
//!
//! ```no_run
//! use havoc::{
//!     assembly::WordWidth,
//!     calibration::Calibrator,
//!     generator::{Generator, RunOptions},
//!     output::{OutputFormat, WriterSink},
//!     source::DeviceSource,
//! };
//! use std::sync::atomic::AtomicBool;
//!
//! let a = DeviceSource::open("/dev/random").unwrap();
//! let b = DeviceSource::open("/dev/urandom").unwrap();
//!
//! let mut running = Generator::new(a, b, WordWidth::Byte)
//!     .calibrate(&Calibrator::default())
//!     .unwrap();
//!
//! let mut sink = WriterSink::new(std::io::stdout(), OutputFormat::Hex);
//! let options = RunOptions { max_words: Some(16), ..Default::default() };
//! running.run(&mut sink, &AtomicBool::new(false), &options).unwrap();
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod assembly;
pub mod calibration;
pub mod config;
pub mod error;
pub mod extraction;
pub mod generator;
pub mod metrics;
pub mod output;
pub mod source;

// Re-export commonly used types at crate root
pub use assembly::{Word, WordAssembler, WordWidth};
pub use calibration::{Calibration, CalibrationError, CalibrationHistogram, Calibrator};
pub use config::{ConfigError, FileConfig};
pub use error::HavocError;
pub use extraction::{combine, BitExtractor, BitResult, ComparisonDebiaser, Threshold, UnbiasedBit};
pub use generator::{Generator, GeneratorState, GeneratorStats, RunOptions, Running};
pub use output::{OutputFormat, WordSink, WriterSink};
pub use source::{ByteSource, DeviceSource, MockSource, SourceError};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
