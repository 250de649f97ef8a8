//! Per-source threshold calibration.
//!
//! Raw noise devices rarely center on 128. Before extraction starts,
//! each source is sampled for a fixed window and its empirical median
//! becomes the cutoff that splits future bytes into zeros and ones.

mod calibrator;
mod histogram;

pub use calibrator::{
    Calibration, CalibrationError, Calibrator, DEFAULT_DURATION, DEFAULT_SAMPLE_INTERVAL,
    MAX_DURATION,
};
pub use histogram::CalibrationHistogram;
