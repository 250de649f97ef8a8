//! Havoc CLI
//!
//! Calibrates two noise devices, then streams unbiased words to stdout
//! until interrupted. Diagnostics go to stderr.

use clap::Parser;
use havoc::{
    config::FileConfig,
    extraction::Threshold,
    generator::{Generator, GeneratorState, GeneratorStats},
    metrics::{MetricsRegistry, MetricsSnapshot},
    output::{OutputFormat, WriterSink},
    source::DeviceSource,
    HavocError,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Unbiased random words from two independent noise sources.
#[derive(Debug, Parser)]
#[command(name = "havoc", version, about)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose diagnostic tracing.
    #[arg(short, long)]
    debug: bool,

    /// Emit 32-bit words instead of bytes.
    #[arg(short = 'n', long)]
    wide: bool,

    /// First noise device.
    #[arg(long)]
    source_a: Option<PathBuf>,

    /// Second noise device.
    #[arg(long)]
    source_b: Option<PathBuf>,

    /// Calibration window in seconds.
    #[arg(long)]
    calibration_secs: Option<f64>,

    /// Pause between calibration samples in milliseconds.
    #[arg(long)]
    sample_interval_ms: Option<u64>,

    /// Output format: binary, text, hex or debug.
    #[arg(short, long)]
    format: Option<OutputFormat>,

    /// Stop after this many words.
    #[arg(long)]
    count: Option<u64>,

    /// Delay between extraction rounds in milliseconds.
    #[arg(long)]
    pace_ms: Option<u64>,

    /// Serve Prometheus metrics on this port (requires the `metrics` feature).
    #[arg(long)]
    metrics_port: Option<u16>,
}

impl Cli {
    /// Applies command-line overrides on top of file configuration.
    fn apply(&self, config: &mut FileConfig) {
        if self.wide {
            config.output.word_width = 32;
        }
        if let Some(path) = &self.source_a {
            config.sources.a = path.clone();
        }
        if let Some(path) = &self.source_b {
            config.sources.b = path.clone();
        }
        if let Some(secs) = self.calibration_secs {
            config.calibration.duration_secs = secs;
        }
        if let Some(ms) = self.sample_interval_ms {
            config.calibration.sample_interval_ms = ms;
        }
        if let Some(format) = self.format {
            config.output.format = format;
        }
        if self.count.is_some() {
            config.output.count = self.count;
        }
        if let Some(ms) = self.pace_ms {
            config.output.pace_ms = ms;
        }
        if let Some(port) = self.metrics_port {
            config.metrics_port = port;
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.debug {
        tracing::Level::TRACE
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Havoc v{}", havoc::VERSION);

    if let Err(e) = run(&cli) {
        error!("{}", e);
        eprintln!("havoc: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), HavocError> {
    let mut config = match &cli.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };
    cli.apply(&mut config);
    config.validate()?;
    let width = config.output.width()?;

    let registry = match MetricsRegistry::new() {
        Ok(registry) => Some(Arc::new(registry)),
        Err(e) => {
            warn!("Metrics disabled: {}", e);
            None
        }
    };
    start_metrics_server(config.metrics_port, registry.as_ref());

    let a = DeviceSource::open(&config.sources.a)?;
    let b = DeviceSource::open(&config.sources.b)?;
    let calibrator = config.calibration.calibrator()?;

    let publish = |stats: &GeneratorStats, thresholds: Option<(Threshold, Threshold)>| {
        if let Some(registry) = &registry {
            registry.update(&MetricsSnapshot::from_stats(stats, thresholds));
        }
    };
    let set_state = |state: GeneratorState| {
        if let Some(registry) = &registry {
            registry.set_state(state);
        }
    };

    set_state(GeneratorState::Calibrating);
    let mut running = Generator::new(a, b, width).calibrate(&calibrator)?;
    let thresholds = running.thresholds();
    set_state(running.state());
    publish(&running.stats(), Some(thresholds));

    // Installed after calibration so an interrupt during the window
    // still terminates immediately.
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);
    if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
        warn!("Failed to install signal handler: {}", e);
    }

    info!(
        width = %width,
        format = ?config.output.format,
        "Streaming words"
    );

    let mut sink = WriterSink::new(std::io::stdout().lock(), config.output.format);
    let stats = running.run_with(
        &mut sink,
        &shutdown,
        &config.output.run_options(),
        |stats| publish(stats, Some(thresholds)),
    )?;
    publish(&stats, Some(thresholds));

    info!(
        "Done. {} words from {} bits ({} pairs, {} agreements, {} discards)",
        stats.words, stats.bits, stats.pairs, stats.agreements, stats.discards
    );
    Ok(())
}

#[cfg(feature = "metrics")]
fn start_metrics_server(port: u16, registry: Option<&Arc<MetricsRegistry>>) {
    use havoc::metrics::{MetricsServer, MetricsServerConfig};

    let Some(registry) = registry else { return };
    if port == 0 {
        return;
    }
    let server = MetricsServer::new(MetricsServerConfig::with_port(port), Arc::clone(registry));
    // Detached; the server lives for the rest of the process.
    let _handle = server.spawn();
}

#[cfg(not(feature = "metrics"))]
fn start_metrics_server(port: u16, _registry: Option<&Arc<MetricsRegistry>>) {
    if port != 0 {
        warn!(port, "Metrics port set but built without the `metrics` feature");
    }
}
