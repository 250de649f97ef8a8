//! Generator configuration.
//!
//! Settings come from an optional TOML file and are then overridden by
//! command-line flags. Everything is validated before calibration
//! starts; an invalid configuration never reaches the sources.

use crate::assembly::{UnsupportedWidth, WordWidth};
use crate::calibration::{Calibrator, MAX_DURATION};
use crate::generator::RunOptions;
use crate::output::OutputFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Paths of the two independent byte sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// First noise device.
    pub a: PathBuf,
    /// Second noise device.
    pub b: PathBuf,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            a: PathBuf::from("/dev/random"),
            b: PathBuf::from("/dev/urandom"),
        }
    }
}

/// Calibration window settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Sampling window in seconds.
    pub duration_secs: f64,
    /// Pause between sampling ticks in milliseconds.
    pub sample_interval_ms: u64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            duration_secs: 12.0,
            sample_interval_ms: 1,
        }
    }
}

impl CalibrationConfig {
    /// Sampling window as a [`Duration`].
    ///
    /// Rejects windows that are not positive, not finite, or longer than
    /// [`MAX_DURATION`].
    pub fn duration(&self) -> Result<Duration, ConfigError> {
        let secs = self.duration_secs;
        match Duration::try_from_secs_f64(secs) {
            Ok(duration) if !duration.is_zero() && duration <= MAX_DURATION => Ok(duration),
            _ => Err(ConfigError::InvalidDuration(secs)),
        }
    }

    /// Builds a calibrator from these settings.
    pub fn calibrator(&self) -> Result<Calibrator, ConfigError> {
        Ok(Calibrator::new(self.duration()?)
            .with_sample_interval(Duration::from_millis(self.sample_interval_ms)))
    }
}

/// Output stream settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Bits per emitted word (8 or 32).
    pub word_width: u32,
    /// Rendering of emitted words.
    pub format: OutputFormat,
    /// Delay between loop iterations in milliseconds.
    pub pace_ms: u64,
    /// Stop after this many words (unlimited if absent).
    pub count: Option<u64>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            word_width: 8,
            format: OutputFormat::Text,
            pace_ms: 0,
            count: None,
        }
    }
}

impl OutputConfig {
    /// Returns the validated word width.
    pub fn width(&self) -> Result<WordWidth, ConfigError> {
        WordWidth::try_from(self.word_width).map_err(ConfigError::from)
    }

    /// Builds run options for the extraction loop.
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            pace: Duration::from_millis(self.pace_ms),
            max_words: self.count,
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// Word width other than 8 or 32.
    #[error(transparent)]
    InvalidWordWidth(#[from] UnsupportedWidth),
    /// Calibration window out of range.
    #[error("invalid calibration duration {0}s (must be positive and at most one day)")]
    InvalidDuration(f64),
    /// Both sources point at the same device.
    #[error("sources must be distinct devices, both are {0}")]
    IdenticalSources(PathBuf),
    /// The config file could not be read.
    #[error("failed to read config file: {0}")]
    FileRead(String),
    /// The config file is not valid TOML or has bad values.
    #[error("failed to parse config file: {0}")]
    Parse(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// `[sources]` section.
    #[serde(default)]
    pub sources: SourcesConfig,
    /// `[calibration]` section.
    #[serde(default)]
    pub calibration: CalibrationConfig,
    /// `[output]` section.
    #[serde(default)]
    pub output: OutputConfig,
    /// Metrics server port (0 to disable).
    #[serde(default)]
    pub metrics_port: u16,
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileRead(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.output.width()?;
        self.calibration.duration()?;

        if self.sources.a == self.sources.b {
            return Err(ConfigError::IdenticalSources(self.sources.a.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = FileConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.output.width().unwrap(), WordWidth::Byte);
    }

    #[test]
    fn test_invalid_width() {
        let mut config = FileConfig::default();
        config.output.word_width = 16;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidWordWidth(UnsupportedWidth(16)))
        ));
    }

    #[test]
    fn test_zero_duration_invalid() {
        let mut config = FileConfig::default();
        config.calibration.duration_secs = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDuration(_))
        ));
    }

    #[test]
    fn test_oversized_duration_invalid() {
        for secs in [1e20, 1e19, 86_401.0, f64::INFINITY, f64::NAN, -3.0] {
            let mut config = FileConfig::default();
            config.calibration.duration_secs = secs;
            assert!(
                matches!(config.validate(), Err(ConfigError::InvalidDuration(_))),
                "{secs} accepted"
            );
            assert!(config.calibration.calibrator().is_err());
        }
    }

    #[test]
    fn test_one_day_duration_valid() {
        let mut config = FileConfig::default();
        config.calibration.duration_secs = 86_400.0;
        assert!(config.validate().is_ok());
        assert_eq!(config.calibration.calibrator().unwrap().duration(), MAX_DURATION);
    }

    #[test]
    fn test_identical_sources_invalid() {
        let mut config = FileConfig::default();
        config.sources.b = config.sources.a.clone();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::IdenticalSources(_))
        ));
    }

    #[test]
    fn test_parse_toml() {
        let config = FileConfig::from_toml(
            r#"
            metrics_port = 9100

            [sources]
            a = "/dev/hwrng"
            b = "/dev/ttyUSB0"

            [calibration]
            duration_secs = 10.0
            sample_interval_ms = 0

            [output]
            word_width = 32
            format = "hex"
            pace_ms = 0
            count = 4
            "#,
        )
        .unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.sources.a, PathBuf::from("/dev/hwrng"));
        assert_eq!(config.output.width().unwrap(), WordWidth::Word32);
        assert_eq!(config.output.format, OutputFormat::Hex);
        assert_eq!(config.output.count, Some(4));
        assert_eq!(config.metrics_port, 9100);
        assert_eq!(
            config.calibration.calibrator().unwrap().duration(),
            Duration::from_secs(10)
        );
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = FileConfig::from_toml("[output]\nformat = \"binary\"\npace_ms = 5\n").unwrap();
        assert_eq!(config.calibration.duration_secs, 12.0);
        assert_eq!(config.output.word_width, 8);
        assert_eq!(config.output.format, OutputFormat::Binary);
        assert_eq!(config.output.run_options().pace, Duration::from_millis(5));
        assert_eq!(config.output.run_options().max_words, None);
    }

    #[test]
    fn test_format_names_match_cli() {
        let config = FileConfig::from_toml("[output]\nformat = \"RAW\"\n").unwrap();
        assert_eq!(config.output.format, OutputFormat::Binary);
        let config = FileConfig::from_toml("[output]\nformat = \"Hex\"\n").unwrap();
        assert_eq!(config.output.format, OutputFormat::Hex);
    }

    #[test]
    fn test_unknown_format_rejected() {
        let result = FileConfig::from_toml("[output]\nformat = \"morse\"\n");
        match result {
            Err(ConfigError::Parse(msg)) => assert!(msg.contains("unknown output format")),
            other => panic!("expected Parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_toml() {
        assert!(matches!(
            FileConfig::from_toml("[output]\nword_width = \"wide\""),
            Err(ConfigError::Parse(_))
        ));
    }
}
