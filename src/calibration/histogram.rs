//! Byte-value frequency histogram used during calibration.

use crate::extraction::Threshold;

/// Frequency of each byte value over a calibration window.
#[derive(Clone)]
pub struct CalibrationHistogram {
    counts: [u64; 256],
    total: u64,
}

impl CalibrationHistogram {
    /// Creates an empty histogram.
    pub fn new() -> Self {
        Self {
            counts: [0; 256],
            total: 0,
        }
    }

    /// Records one sampled byte.
    #[inline]
    pub fn record(&mut self, byte: u8) {
        self.counts[byte as usize] += 1;
        self.total += 1;
    }

    /// Number of samples recorded.
    #[inline]
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Occurrences of `byte`.
    #[inline]
    pub fn count(&self, byte: u8) -> u64 {
        self.counts[byte as usize]
    }

    /// Returns the empirical median.
    ///
    /// This is the smallest byte value whose cumulative count exceeds half
    /// of the total. Returns `None` when no samples were recorded.
    pub fn median(&self) -> Option<Threshold> {
        let half = self.total / 2;
        let mut cumulative = 0u64;

        for (value, &count) in self.counts.iter().enumerate() {
            cumulative += count;
            if cumulative > half {
                return Some(Threshold::new(value as u8));
            }
        }
        None
    }

    /// Iterates over `(value, count)` for every populated bin.
    pub fn populated(&self) -> impl Iterator<Item = (u8, u64)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .filter(|(_, &count)| count > 0)
            .map(|(value, &count)| (value as u8, count))
    }
}

impl Default for CalibrationHistogram {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CalibrationHistogram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalibrationHistogram")
            .field("total", &self.total)
            .field("populated_bins", &self.populated().count())
            .finish()
    }
}
