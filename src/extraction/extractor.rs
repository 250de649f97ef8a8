//! Per-source bit extraction.

use super::bit::{BitResult, Threshold};
use crate::source::ByteSource;

/// Reads one byte from `source` and binarizes it against `threshold`.
///
/// A failed read yields [`BitResult::Discard`]; it is never escalated.
pub fn extract<S: ByteSource + ?Sized>(source: &mut S, threshold: Threshold) -> BitResult {
    match source.read_byte() {
        Ok(byte) => threshold.classify(byte),
        Err(e) => {
            tracing::trace!(source = source.name(), error = %e, "Read failed, discarding");
            BitResult::Discard
        }
    }
}

/// Counters kept by a [`BitExtractor`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractorStats {
    /// Total extraction calls.
    pub reads: u64,
    /// Reads that failed at the source.
    pub failures: u64,
    /// Bytes equal to the threshold.
    pub ties: u64,
}

/// Owns one byte source together with its calibrated threshold.
pub struct BitExtractor<S> {
    source: S,
    threshold: Threshold,
    stats: ExtractorStats,
    /// Whether the previous read failed; used to log transitions only.
    faulted: bool,
}

impl<S: ByteSource> BitExtractor<S> {
    /// Binds `source` to `threshold`.
    pub fn new(source: S, threshold: Threshold) -> Self {
        Self {
            source,
            threshold,
            stats: ExtractorStats::default(),
            faulted: false,
        }
    }

    /// Reads one byte and classifies it.
    pub fn extract(&mut self) -> BitResult {
        self.stats.reads += 1;

        match self.source.read_byte() {
            Ok(byte) => {
                if self.faulted {
                    tracing::info!(source = self.source.name(), "Byte source recovered");
                    self.faulted = false;
                }
                let result = self.threshold.classify(byte);
                if result == BitResult::Discard {
                    self.stats.ties += 1;
                }
                result
            }
            Err(e) => {
                self.stats.failures += 1;
                if self.faulted {
                    tracing::debug!(source = self.source.name(), error = %e, "Byte source fault");
                } else {
                    tracing::warn!(source = self.source.name(), error = %e, "Byte source fault");
                    self.faulted = true;
                }
                BitResult::Discard
            }
        }
    }

    /// Threshold in use.
    #[inline]
    pub fn threshold(&self) -> Threshold {
        self.threshold
    }

    /// Read and discard counters.
    pub fn stats(&self) -> ExtractorStats {
        self.stats
    }

    /// Borrows the underlying source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Releases the underlying source.
    pub fn into_source(self) -> S {
        self.source
    }
}

impl<S: ByteSource> std::fmt::Debug for BitExtractor<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitExtractor")
            .field("source", &self.source.name())
            .field("threshold", &self.threshold)
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MockSource;

    #[test]
    fn test_free_extract() {
        let mut source = MockSource::cycle(&[200, 50, 128]);
        let threshold = Threshold::MIDPOINT;

        assert_eq!(extract(&mut source, threshold), BitResult::One);
        assert_eq!(extract(&mut source, threshold), BitResult::Zero);
        assert_eq!(extract(&mut source, threshold), BitResult::Discard);
    }

    #[test]
    fn test_read_failure_is_discard() {
        let mut extractor = BitExtractor::new(MockSource::failing(), Threshold::MIDPOINT);

        assert_eq!(extractor.extract(), BitResult::Discard);
        assert_eq!(extractor.extract(), BitResult::Discard);
        assert_eq!(extractor.stats().failures, 2);
        assert_eq!(extractor.stats().ties, 0);
    }

    #[test]
    fn test_stats_count_ties() {
        let source = MockSource::cycle(&[10, 10, 11]);
        let mut extractor = BitExtractor::new(source, Threshold::new(10));

        for _ in 0..3 {
            extractor.extract();
        }
        let stats = extractor.stats();
        assert_eq!(stats.reads, 3);
        assert_eq!(stats.ties, 2);
        assert_eq!(stats.failures, 0);
    }

    #[test]
    fn test_recovers_after_fault() {
        let source = MockSource::from_script("flaky", vec![None, None, Some(250)]);
        let mut extractor = BitExtractor::new(source, Threshold::MIDPOINT);

        assert_eq!(extractor.extract(), BitResult::Discard);
        assert_eq!(extractor.extract(), BitResult::Discard);
        assert_eq!(extractor.extract(), BitResult::One);
        assert_eq!(extractor.source().reads(), 3);
    }
}
