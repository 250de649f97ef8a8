//! Prometheus metrics exporter for generator monitoring.
//!
//! # Metrics Exposed
//!
//! ## Lifecycle
//! - `havoc_state` - Generator phase (0 uninitialized, 1 calibrating, 2 running)
//!
//! ## Calibration
//! - `havoc_threshold_a` / `havoc_threshold_b` - Calibrated thresholds (-1 until set)
//!
//! ## Extraction
//! - `havoc_pairs_total` - Extraction pairs examined
//! - `havoc_bits_total` - Unbiased bits produced
//! - `havoc_discards_total` - Pairs lost to ties or failed reads
//! - `havoc_agreements_total` - Pairs lost because both sources agreed
//! - `havoc_source_a_failures_total` / `havoc_source_b_failures_total` - Failed reads
//!
//! ## Output
//! - `havoc_words_total` - Words emitted
//!
//! # Example
//!
//! ```no_run
//! use havoc::generator::GeneratorStats;
//! use havoc::metrics::{MetricsRegistry, MetricsSnapshot};
//!
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//! let snapshot = MetricsSnapshot::from_stats(&GeneratorStats::default(), None);
//! registry.update(&snapshot);
//! ```

mod collector;
#[cfg(feature = "metrics")]
mod server;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
#[cfg(feature = "metrics")]
pub use server::{MetricsServer, MetricsServerConfig, ServerError, DEFAULT_PORT};
