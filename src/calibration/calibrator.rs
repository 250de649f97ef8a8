//! Time-bounded threshold calibration.
//!
//! Samples each source for a fixed wall-clock window and takes the
//! empirical median as that source's binarization threshold.

use super::histogram::CalibrationHistogram;
use crate::extraction::Threshold;
use crate::source::ByteSource;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::{Duration, Instant};

/// Default calibration window.
pub const DEFAULT_DURATION: Duration = Duration::from_secs(12);

/// Default pause between sampling ticks.
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(1);

/// Longest accepted calibration window.
pub const MAX_DURATION: Duration = Duration::from_secs(24 * 60 * 60);

/// Calibration errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CalibrationError {
    /// The window closed without a single successful read.
    #[error("calibration of {label} failed: no samples collected ({failures} failed reads)")]
    NoSamples {
        /// Source name.
        label: String,
        /// Failed reads during the window.
        failures: u64,
    },
    /// The window cannot be scheduled on this clock.
    #[error("calibration window of {0:?} is out of range")]
    WindowOutOfRange(Duration),
}

/// Result of calibrating one source.
#[derive(Debug, Clone, Serialize)]
pub struct Calibration {
    /// Name of the calibrated source.
    pub label: String,
    /// Derived threshold (empirical median).
    pub threshold: Threshold,
    /// Successful samples in the window.
    pub samples: u64,
    /// Failed reads in the window.
    pub failures: u64,
    /// When the window closed.
    pub completed_at: DateTime<Utc>,
}

/// Per-source accumulator for one sampling window.
#[derive(Debug, Default)]
struct Tally {
    histogram: CalibrationHistogram,
    failures: u64,
}

impl Tally {
    fn finish(self, label: &str) -> Result<Calibration, CalibrationError> {
        for (value, count) in self.histogram.populated() {
            tracing::trace!(source = label, value, count, "Histogram bin");
        }

        let threshold = self
            .histogram
            .median()
            .ok_or_else(|| CalibrationError::NoSamples {
                label: label.to_string(),
                failures: self.failures,
            })?;

        tracing::info!(
            source = label,
            samples = self.histogram.total(),
            failures = self.failures,
            threshold = threshold.value(),
            "Calibration complete"
        );

        Ok(Calibration {
            label: label.to_string(),
            threshold,
            samples: self.histogram.total(),
            failures: self.failures,
            completed_at: Utc::now(),
        })
    }
}

/// Samples byte sources for a fixed window and derives thresholds.
#[derive(Debug, Clone)]
pub struct Calibrator {
    duration: Duration,
    sample_interval: Duration,
}

impl Calibrator {
    /// Creates a calibrator with the given sampling window.
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
        }
    }

    /// Sets the pause between sampling ticks (zero disables it).
    pub fn with_sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = interval;
        self
    }

    /// Length of the sampling window.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Calibrates a single source.
    ///
    /// Read failures contribute no sample. If the whole window passes
    /// without a single successful read, returns
    /// [`CalibrationError::NoSamples`].
    pub fn calibrate<S: ByteSource>(&self, source: &mut S) -> Result<Calibration, CalibrationError> {
        let tally = {
            let mut sources: [&mut dyn ByteSource; 1] = [&mut *source];
            self.sample_window(&mut sources)?.pop().unwrap_or_default()
        };
        tally.finish(source.name())
    }

    /// Calibrates two sources within one shared window.
    ///
    /// Each tick reads one byte from each source.
    pub fn calibrate_pair<A: ByteSource, B: ByteSource>(
        &self,
        a: &mut A,
        b: &mut B,
    ) -> Result<(Calibration, Calibration), CalibrationError> {
        let (tally_a, tally_b) = {
            let mut sources: [&mut dyn ByteSource; 2] = [&mut *a, &mut *b];
            let mut tallies = self.sample_window(&mut sources)?.into_iter();
            (
                tallies.next().unwrap_or_default(),
                tallies.next().unwrap_or_default(),
            )
        };

        Ok((tally_a.finish(a.name())?, tally_b.finish(b.name())?))
    }

    fn sample_window(
        &self,
        sources: &mut [&mut dyn ByteSource],
    ) -> Result<Vec<Tally>, CalibrationError> {
        let deadline = Instant::now()
            .checked_add(self.duration)
            .ok_or(CalibrationError::WindowOutOfRange(self.duration))?;
        let mut tallies: Vec<Tally> = sources.iter().map(|_| Tally::default()).collect();
        let mut last_second = self.duration.as_secs();

        tracing::info!(
            duration_secs = self.duration.as_secs_f64(),
            sources = sources.len(),
            "Collecting reference samples"
        );

        while Instant::now() < deadline {
            for (source, tally) in sources.iter_mut().zip(tallies.iter_mut()) {
                match source.read_byte() {
                    Ok(byte) => tally.histogram.record(byte),
                    Err(e) => {
                        tally.failures += 1;
                        tracing::debug!(source = source.name(), error = %e, "Calibration read failed");
                    }
                }
            }

            let remaining = deadline.saturating_duration_since(Instant::now()).as_secs();
            if remaining != last_second {
                tracing::debug!("{} seconds left", remaining);
                last_second = remaining;
            }

            if !self.sample_interval.is_zero() {
                std::thread::sleep(self.sample_interval);
            }
        }

        Ok(tallies)
    }
}

impl Default for Calibrator {
    fn default() -> Self {
        Self::new(DEFAULT_DURATION)
    }
}
