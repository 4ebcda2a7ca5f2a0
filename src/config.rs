//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use chrono::format::{Item, StrftimeItems};
use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{FlightRecordError, Result};
use crate::record::protocol::DEFAULT_HEADER_SIZE;

/// Largest header the decoder will skip
pub const MAX_HEADER_SIZE: usize = 65_536;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub decoder: DecoderConfig,

    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Decoder configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct DecoderConfig {
    /// Opaque header bytes to skip before the first frame
    #[serde(default = "default_header_size")]
    pub header_size: usize,

    /// Fail when the scan stops before the end of the buffer
    #[serde(default)]
    pub strict: bool,
}

/// Export configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ExportConfig {
    #[serde(default = "default_export_format")]
    pub format: ExportFormat,

    /// Ground elevation at take-off, in meters
    #[serde(default)]
    pub base_altitude_m: Option<f64>,

    /// chrono format string for the CSV datetime column
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,
}

/// Output format
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Jsonl,
    Summary,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path; empty logs to stderr
    #[serde(default)]
    pub file: String,
}

// Default value functions
fn default_header_size() -> usize { DEFAULT_HEADER_SIZE }

fn default_export_format() -> ExportFormat { ExportFormat::Csv }
fn default_timestamp_format() -> String { "%d-%m-%Y %H:%M:%S".to_string() }

fn default_log_level() -> String { "info".to_string() }

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            header_size: default_header_size(),
            strict: false,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: default_export_format(),
            base_altitude_m: None,
            timestamp_format: default_timestamp_format(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: String::new(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use flight_record::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.decoder.header_size > MAX_HEADER_SIZE {
            return Err(invalid(format!(
                "header_size must be at most {}",
                MAX_HEADER_SIZE
            )));
        }

        if self.export.timestamp_format.is_empty() {
            return Err(invalid("timestamp_format cannot be empty"));
        }

        if StrftimeItems::new(&self.export.timestamp_format).any(|item| matches!(item, Item::Error)) {
            return Err(invalid(format!(
                "timestamp_format '{}' is not a valid strftime format",
                self.export.timestamp_format
            )));
        }

        if let Some(base) = self.export.base_altitude_m {
            if !base.is_finite() {
                return Err(invalid("base_altitude_m must be a finite number"));
            }
        }

        if !["trace", "debug", "info", "warn", "error"].contains(&self.logging.level.as_str()) {
            return Err(invalid(
                "logging level must be one of: trace, debug, info, warn, error",
            ));
        }

        Ok(())
    }
}

fn invalid(message: impl std::fmt::Display) -> FlightRecordError {
    FlightRecordError::Config(toml::de::Error::custom(message))
}
