//! The generator driver.
//!
//! A generator starts `Uninitialized` holding two raw sources. Calibration
//! consumes it and yields a [`Running`] generator that owns both
//! extractors and the word assembler:
//!
//! ```text
//! Uninitialized ──calibrate──▶ Calibrating ──▶ Running ──(shutdown)──▶ done
//! ```
//!
//! Only a calibration failure is fatal. While running, a failed read is
//! just a discard and the loop moves on to the next pair.

use crate::assembly::{Word, WordAssembler, WordWidth};
use crate::calibration::{Calibration, Calibrator};
use crate::error::HavocError;
use crate::extraction::{BitExtractor, ComparisonDebiaser, Threshold, UnbiasedBit};
use crate::output::{SinkError, WordSink};
use crate::source::ByteSource;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Extraction rounds between progress callbacks in [`Running::run_with`].
pub const PROGRESS_INTERVAL: u64 = 1024;

/// Consecutive bitless rounds after which [`Running::next_unbiased_bit`]
/// gives up.
pub const MAX_ROUNDS_PER_BIT: u32 = 1 << 16;

/// Lifecycle phase of a generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorState {
    /// Sources held, nothing read yet.
    Uninitialized,
    /// Sampling the calibration window.
    Calibrating,
    /// Thresholds fixed, producing words.
    Running,
}

impl std::fmt::Display for GeneratorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Calibrating => write!(f, "calibrating"),
            Self::Running => write!(f, "running"),
        }
    }
}

/// Options for [`Running::run`].
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Delay after every loop iteration (zero for none).
    pub pace: Duration,
    /// Stop after this many words.
    pub max_words: Option<u64>,
}

/// Counters describing a running generator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeneratorStats {
    /// Extraction pairs examined.
    pub pairs: u64,
    /// Unbiased bits produced.
    pub bits: u64,
    /// Pairs rejected for a tie or failed read.
    pub discards: u64,
    /// Pairs rejected because both sources agreed.
    pub agreements: u64,
    /// Failed reads on source A.
    pub failures_a: u64,
    /// Failed reads on source B.
    pub failures_b: u64,
    /// Words handed to the sink.
    pub words: u64,
}

/// A generator that has not been calibrated yet.
pub struct Generator<A, B> {
    a: A,
    b: B,
    width: WordWidth,
}

impl<A: ByteSource, B: ByteSource> Generator<A, B> {
    /// Wraps two raw sources; nothing is read until calibration.
    pub fn new(a: A, b: B, width: WordWidth) -> Self {
        Self { a, b, width }
    }

    /// Always [`GeneratorState::Uninitialized`].
    pub fn state(&self) -> GeneratorState {
        GeneratorState::Uninitialized
    }

    /// Calibrates both sources and transitions to running.
    ///
    /// Fails with [`HavocError::CalibrationFailed`] if either source
    /// produced no samples during the window.
    pub fn calibrate(mut self, calibrator: &Calibrator) -> Result<Running<A, B>, HavocError> {
        tracing::info!(state = %GeneratorState::Calibrating, "Starting initialisation");

        let (cal_a, cal_b) = calibrator.calibrate_pair(&mut self.a, &mut self.b)?;
        let mut running =
            Running::with_thresholds(self.a, self.b, cal_a.threshold, cal_b.threshold, self.width);
        running.calibrations = Some((cal_a, cal_b));

        tracing::info!(state = %running.state(), "Initialisation complete");
        Ok(running)
    }
}

/// A calibrated generator producing words.
pub struct Running<A, B> {
    debiaser: ComparisonDebiaser<A, B>,
    assembler: WordAssembler,
    words: u64,
    calibrations: Option<(Calibration, Calibration)>,
}

impl<A: ByteSource, B: ByteSource> Running<A, B> {
    /// Builds a running generator from already known thresholds.
    pub fn with_thresholds(
        a: A,
        b: B,
        threshold_a: Threshold,
        threshold_b: Threshold,
        width: WordWidth,
    ) -> Self {
        tracing::info!(
            source_a = a.name(),
            threshold_a = threshold_a.value(),
            source_b = b.name(),
            threshold_b = threshold_b.value(),
            width = %width,
            "Thresholds set"
        );
        Self {
            debiaser: ComparisonDebiaser::new(
                BitExtractor::new(a, threshold_a),
                BitExtractor::new(b, threshold_b),
            ),
            assembler: WordAssembler::new(width),
            words: 0,
            calibrations: None,
        }
    }

    /// Always [`GeneratorState::Running`].
    pub fn state(&self) -> GeneratorState {
        GeneratorState::Running
    }

    /// Thresholds in use for sources A and B.
    pub fn thresholds(&self) -> (Threshold, Threshold) {
        let (a, b) = self.debiaser.extractors();
        (a.threshold(), b.threshold())
    }

    /// Calibration records, if this generator was calibrated.
    pub fn calibrations(&self) -> Option<&(Calibration, Calibration)> {
        self.calibrations.as_ref()
    }

    /// Runs one extraction round.
    ///
    /// Returns a word when this round completed one.
    pub fn step(&mut self) -> Option<Word> {
        let position = self.assembler.bit_count();

        match self.debiaser.next_bit() {
            Some(bit) => {
                tracing::trace!(position, bit = bit.as_u8(), ".");
                let word = self.assembler.push(bit)?;
                tracing::debug!(value = word.value(), width = %word.width(), "Word complete");
                Some(word)
            }
            None => {
                tracing::trace!(position, "!");
                None
            }
        }
    }

    /// Runs until `shutdown` is set, the word limit is reached, or the
    /// sink closes.
    pub fn run<S: WordSink>(
        &mut self,
        sink: &mut S,
        shutdown: &AtomicBool,
        options: &RunOptions,
    ) -> Result<GeneratorStats, HavocError> {
        self.run_with(sink, shutdown, options, |_| {})
    }

    /// Like [`run`](Self::run), calling `on_progress` after every emitted
    /// word and every [`PROGRESS_INTERVAL`] rounds, so counters keep moving
    /// even while no word completes.
    pub fn run_with<S, F>(
        &mut self,
        sink: &mut S,
        shutdown: &AtomicBool,
        options: &RunOptions,
        mut on_progress: F,
    ) -> Result<GeneratorStats, HavocError>
    where
        S: WordSink,
        F: FnMut(&GeneratorStats),
    {
        let mut emitted = 0u64;
        let mut rounds = 0u64;

        while !shutdown.load(Ordering::Relaxed) {
            if options.max_words.is_some_and(|max| emitted >= max) {
                tracing::info!(words = emitted, "Word limit reached");
                break;
            }

            rounds += 1;
            if let Some(word) = self.step() {
                match sink.emit(word) {
                    Ok(()) => {
                        emitted += 1;
                        self.words += 1;
                        on_progress(&self.stats());
                    }
                    Err(SinkError::Closed) => {
                        tracing::info!("Output closed, stopping");
                        break;
                    }
                    Err(e) => return Err(e.into()),
                }
            } else if rounds % PROGRESS_INTERVAL == 0 {
                on_progress(&self.stats());
            }

            if !options.pace.is_zero() {
                std::thread::sleep(options.pace);
            }
        }

        let stats = self.stats();
        tracing::info!(
            words = stats.words,
            bits = stats.bits,
            pairs = stats.pairs,
            "Generator stopped"
        );
        Ok(stats)
    }

    /// Current counters.
    pub fn stats(&self) -> GeneratorStats {
        let debias = self.debiaser.stats();
        let (a, b) = self.debiaser.extractors();
        GeneratorStats {
            pairs: debias.pairs,
            bits: debias.produced,
            discards: debias.discards,
            agreements: debias.agreements,
            failures_a: a.stats().failures,
            failures_b: b.stats().failures,
            words: self.words,
        }
    }

    /// Extracts the next unbiased bit, bypassing the word assembler.
    ///
    /// Returns `None` after [`MAX_ROUNDS_PER_BIT`] consecutive rounds
    /// without a bit, which is what sources that always agree or always
    /// fail look like.
    pub fn next_unbiased_bit(&mut self) -> Option<UnbiasedBit> {
        (0..MAX_ROUNDS_PER_BIT).find_map(|_| self.debiaser.next_bit())
    }

    fn next_random_byte(&mut self) -> Result<u8, rand_core::Error> {
        (0..8).try_fold(0u8, |acc, i| {
            let bit = self.next_unbiased_bit().ok_or_else(|| {
                rand_core::Error::new(format!(
                    "no unbiased bit after {MAX_ROUNDS_PER_BIT} extraction rounds"
                ))
            })?;
            Ok(acc | (bit.as_u8() << i))
        })
    }
}

/// Raw entropy access for `rand` consumers.
///
/// Draws directly from the extractor, independent of the word assembler.
/// `try_fill_bytes` fails once the sources stop yielding bits; the
/// infallible methods keep retrying, warning on every stalled attempt.
impl<A: ByteSource, B: ByteSource> rand_core::RngCore for Running<A, B> {
    fn next_u32(&mut self) -> u32 {
        rand_core::impls::next_u32_via_fill(self)
    }

    fn next_u64(&mut self) -> u64 {
        rand_core::impls::next_u64_via_fill(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for byte in dest.iter_mut() {
            *byte = loop {
                match self.next_random_byte() {
                    Ok(value) => break value,
                    Err(e) => tracing::warn!(error = %e, "Entropy stalled, retrying"),
                }
            };
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        for byte in dest.iter_mut() {
            *byte = self.next_random_byte()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MockSource;
    use rand_core::RngCore;

    fn running(a: MockSource, b: MockSource, width: WordWidth) -> Running<MockSource, MockSource> {
        Running::with_thresholds(a, b, Threshold::MIDPOINT, Threshold::MIDPOINT, width)
    }

    #[test]
    fn test_eight_steps_make_a_byte() {
        let mut generator = running(
            MockSource::constant(200),
            MockSource::constant(50),
            WordWidth::Byte,
        );

        for _ in 0..7 {
            assert_eq!(generator.step(), None);
        }
        assert_eq!(generator.step(), Some(Word::Byte(0xFF)));
    }

    #[test]
    fn test_run_respects_word_limit() {
        let mut generator = running(
            MockSource::constant(50),
            MockSource::constant(200),
            WordWidth::Word32,
        );
        let mut sink: Vec<Word> = Vec::new();
        let shutdown = AtomicBool::new(false);
        let options = RunOptions {
            max_words: Some(3),
            ..Default::default()
        };

        let stats = generator.run(&mut sink, &shutdown, &options).unwrap();

        assert_eq!(sink, vec![Word::Word32(0); 3]);
        assert_eq!(stats.words, 3);
        assert_eq!(stats.bits, 96);
        assert_eq!(stats.pairs, 96);
    }

    #[test]
    fn test_shutdown_stops_immediately() {
        let mut generator = running(
            MockSource::constant(200),
            MockSource::constant(50),
            WordWidth::Byte,
        );
        let mut sink: Vec<Word> = Vec::new();
        let shutdown = AtomicBool::new(true);

        let stats = generator
            .run(&mut sink, &shutdown, &RunOptions::default())
            .unwrap();

        assert!(sink.is_empty());
        assert_eq!(stats.pairs, 0);
    }

    #[test]
    fn test_progress_after_every_word() {
        let mut generator = running(
            MockSource::constant(200),
            MockSource::constant(50),
            WordWidth::Byte,
        );
        let mut sink: Vec<Word> = Vec::new();
        let shutdown = AtomicBool::new(false);
        let options = RunOptions {
            max_words: Some(2),
            ..Default::default()
        };
        let mut seen = Vec::new();

        generator
            .run_with(&mut sink, &shutdown, &options, |stats| seen.push(stats.words))
            .unwrap();

        assert_eq!(seen, vec![1, 2]);
    }

    #[test]
    fn test_progress_reported_without_words() {
        let mut generator = running(
            MockSource::constant(200),
            MockSource::constant(201),
            WordWidth::Byte,
        );
        let mut sink: Vec<Word> = Vec::new();
        let shutdown = AtomicBool::new(false);
        let mut seen = Vec::new();

        generator
            .run_with(&mut sink, &shutdown, &RunOptions::default(), |stats| {
                seen.push(*stats);
                if seen.len() == 2 {
                    shutdown.store(true, Ordering::Relaxed);
                }
            })
            .unwrap();

        assert!(sink.is_empty());
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].pairs, PROGRESS_INTERVAL);
        assert_eq!(seen[0].agreements, PROGRESS_INTERVAL);
        assert_eq!(seen[1].pairs, 2 * PROGRESS_INTERVAL);
        assert_eq!(seen[1].words, 0);
    }

    #[test]
    fn test_calibrate_transitions_to_running() {
        let generator = Generator::new(
            MockSource::cycle(&[90, 100, 110]),
            MockSource::cycle(&[10, 20, 30]),
            WordWidth::Byte,
        );
        assert_eq!(generator.state(), GeneratorState::Uninitialized);

        let calibrator =
            Calibrator::new(Duration::from_millis(20)).with_sample_interval(Duration::ZERO);
        let running = generator.calibrate(&calibrator).unwrap();

        assert_eq!(running.state(), GeneratorState::Running);
        assert_eq!(
            running.thresholds(),
            (Threshold::new(100), Threshold::new(20))
        );
        let (cal_a, cal_b) = running.calibrations().unwrap();
        assert_eq!(cal_a.label, "cycle");
        assert!(cal_b.samples > 0);
    }

    #[test]
    fn test_calibration_failure_is_fatal() {
        let generator = Generator::new(
            MockSource::constant(1),
            MockSource::failing(),
            WordWidth::Byte,
        );
        let calibrator =
            Calibrator::new(Duration::from_millis(10)).with_sample_interval(Duration::ZERO);

        assert!(matches!(
            generator.calibrate(&calibrator),
            Err(HavocError::CalibrationFailed(_))
        ));
    }

    #[test]
    fn test_rng_core() {
        let mut generator = running(
            MockSource::constant(200),
            MockSource::constant(50),
            WordWidth::Byte,
        );

        assert_eq!(generator.next_u32(), u32::MAX);
        assert_eq!(generator.next_u64(), u64::MAX);

        let mut buf = [0u8; 5];
        generator.fill_bytes(&mut buf);
        assert_eq!(buf, [0xFF; 5]);
        // The RNG path does not touch the word accumulator.
        assert_eq!(generator.step(), None);
    }

    #[test]
    fn test_rng_reports_stalled_sources() {
        let mut generator = running(
            MockSource::constant(90),
            MockSource::constant(90),
            WordWidth::Byte,
        );

        assert_eq!(generator.next_unbiased_bit(), None);
        assert_eq!(generator.stats().pairs, MAX_ROUNDS_PER_BIT as u64);

        let mut buf = [0u8; 2];
        assert!(generator.try_fill_bytes(&mut buf).is_err());
    }

    #[test]
    fn test_rng_try_fill_with_dead_source() {
        let mut generator = running(
            MockSource::failing(),
            MockSource::constant(50),
            WordWidth::Byte,
        );

        let mut buf = [0u8; 1];
        assert!(generator.try_fill_bytes(&mut buf).is_err());
        assert_eq!(generator.stats().discards, MAX_ROUNDS_PER_BIT as u64);
    }
}
