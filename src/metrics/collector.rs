//! Metrics collection and registry.

use crate::extraction::Threshold;
use crate::generator::{GeneratorState, GeneratorStats};
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// A snapshot of generator state for metrics update.
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    /// Threshold of source A, once calibrated.
    pub threshold_a: Option<u8>,
    /// Threshold of source B, once calibrated.
    pub threshold_b: Option<u8>,
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
    /// Words emitted.
    pub words: u64,
}

/// Prometheus metrics registry for the generator.
pub struct MetricsRegistry {
    registry: Registry,

    // Lifecycle
    state: IntGauge,

    // Calibration
    threshold_a: IntGauge,
    threshold_b: IntGauge,

    // Extraction
    pairs_total: IntCounter,
    bits_total: IntCounter,
    discards_total: IntCounter,
    agreements_total: IntCounter,
    failures_a_total: IntCounter,
    failures_b_total: IntCounter,

    // Output
    words_total: IntCounter,
}

impl MetricsRegistry {
    /// Creates a new metrics registry with all generator metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let state = IntGauge::new(
            "havoc_state",
            "Generator phase (0 uninitialized, 1 calibrating, 2 running)",
        )?;

        let threshold_a = IntGauge::new(
            "havoc_threshold_a",
            "Calibrated threshold of source A (-1 until calibrated)",
        )?;
        let threshold_b = IntGauge::new(
            "havoc_threshold_b",
            "Calibrated threshold of source B (-1 until calibrated)",
        )?;
        threshold_a.set(-1);
        threshold_b.set(-1);

        let pairs_total = IntCounter::new(
            "havoc_pairs_total",
            "Total extraction pairs examined",
        )?;
        let bits_total = IntCounter::new(
            "havoc_bits_total",
            "Total unbiased bits produced",
        )?;
        let discards_total = IntCounter::new(
            "havoc_discards_total",
            "Pairs rejected for a threshold tie or failed read",
        )?;
        let agreements_total = IntCounter::new(
            "havoc_agreements_total",
            "Pairs rejected because both sources agreed",
        )?;
        let failures_a_total = IntCounter::new(
            "havoc_source_a_failures_total",
            "Failed reads on source A",
        )?;
        let failures_b_total = IntCounter::new(
            "havoc_source_b_failures_total",
            "Failed reads on source B",
        )?;
        let words_total = IntCounter::new(
            "havoc_words_total",
            "Total words emitted to the sink",
        )?;

        registry.register(Box::new(state.clone()))?;
        registry.register(Box::new(threshold_a.clone()))?;
        registry.register(Box::new(threshold_b.clone()))?;
        registry.register(Box::new(pairs_total.clone()))?;
        registry.register(Box::new(bits_total.clone()))?;
        registry.register(Box::new(discards_total.clone()))?;
        registry.register(Box::new(agreements_total.clone()))?;
        registry.register(Box::new(failures_a_total.clone()))?;
        registry.register(Box::new(failures_b_total.clone()))?;
        registry.register(Box::new(words_total.clone()))?;

        Ok(Self {
            registry,
            state,
            threshold_a,
            threshold_b,
            pairs_total,
            bits_total,
            discards_total,
            agreements_total,
            failures_a_total,
            failures_b_total,
            words_total,
        })
    }

    /// Updates all metrics from a snapshot of generator state.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        if let Some(t) = snapshot.threshold_a {
            self.threshold_a.set(t as i64);
        }
        if let Some(t) = snapshot.threshold_b {
            self.threshold_b.set(t as i64);
        }

        // Counters only move forward; increment by the difference.
        advance(&self.pairs_total, snapshot.pairs);
        advance(&self.bits_total, snapshot.bits);
        advance(&self.discards_total, snapshot.discards);
        advance(&self.agreements_total, snapshot.agreements);
        advance(&self.failures_a_total, snapshot.failures_a);
        advance(&self.failures_b_total, snapshot.failures_b);
        advance(&self.words_total, snapshot.words);
    }

    /// Records the generator's lifecycle phase.
    pub fn set_state(&self, state: GeneratorState) {
        let code = match state {
            GeneratorState::Uninitialized => 0,
            GeneratorState::Calibrating => 1,
            GeneratorState::Running => 2,
        };
        self.state.set(code);
    }

    /// Last recorded lifecycle phase.
    pub fn state(&self) -> GeneratorState {
        match self.state.get() {
            1 => GeneratorState::Calibrating,
            2 => GeneratorState::Running,
            _ => GeneratorState::Uninitialized,
        }
    }

    /// Words emitted so far.
    pub fn words(&self) -> u64 {
        self.words_total.get()
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

fn advance(counter: &IntCounter, target: u64) {
    let current = counter.get();
    if target > current {
        counter.inc_by(target - current);
    }
}

impl MetricsSnapshot {
    /// Creates a snapshot from generator counters and thresholds.
    pub fn from_stats(stats: &GeneratorStats, thresholds: Option<(Threshold, Threshold)>) -> Self {
        let (threshold_a, threshold_b) = thresholds
            .map(|(a, b)| (Some(a.value()), Some(b.value())))
            .unwrap_or((None, None));

        Self {
            threshold_a,
            threshold_b,
            pairs: stats.pairs,
            bits: stats.bits,
            discards: stats.discards,
            agreements: stats.agreements,
            failures_a: stats.failures_a,
            failures_b: stats.failures_b,
            words: stats.words,
        }
    }
}
