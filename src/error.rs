//! Top-level error type.
//!
//! Per-read source failures never reach this type during extraction;
//! they are absorbed as discards. What remains is fatal to a run.

use crate::calibration::CalibrationError;
use crate::config::ConfigError;
use crate::output::SinkError;
use crate::source::SourceError;
use thiserror::Error;

/// Errors that stop the generator.
#[derive(Debug, Error)]
pub enum HavocError {
    /// Rejected before any source is touched.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    /// A source produced no usable calibration samples.
    #[error(transparent)]
    CalibrationFailed(#[from] CalibrationError),
    /// A source could not be opened.
    #[error(transparent)]
    Source(#[from] SourceError),
    /// The output failed for a reason other than the consumer leaving.
    #[error(transparent)]
    Sink(#[from] SinkError),
}
