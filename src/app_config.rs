use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Minimum clip duration in seconds
    #[serde(default = "default_min_duration_secs")]
    pub min_duration_secs: f64,

    /// Silence padding around clip boundaries in seconds
    #[serde(default = "default_padding_secs")]
    pub padding_secs: f64,

    /// Cutting tool settings
    #[serde(default)]
    pub cutting: CuttingConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Settings for the external cutting tool
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CuttingConfig {
    /// Explicit ffmpeg path; searched on PATH when absent
    #[serde(default)]
    pub ffmpeg_path: Option<String>,

    /// Arguments placed between the input and the output file
    #[serde(default = "default_ffmpeg_args")]
    pub ffmpeg_args: Vec<String>,

    /// Maximum cuts running at once
    #[serde(default = "default_concurrent_cuts")]
    pub concurrent_cuts: usize,

    /// Per-cut timeout in seconds
    #[serde(default = "default_cut_timeout_secs")]
    pub cut_timeout_secs: u64,
}

impl Default for CuttingConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            ffmpeg_args: default_ffmpeg_args(),
            concurrent_cuts: default_concurrent_cuts(),
            cut_timeout_secs: default_cut_timeout_secs(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

pub const DEFAULT_MIN_DURATION_SECS: f64 = 60.0;
pub const DEFAULT_PADDING_SECS: f64 = 0.5;

/// Upper bound for the minimum duration and padding (one week)
pub const MAX_DURATION_SECS: f64 = 7.0 * 24.0 * 3600.0;

fn default_min_duration_secs() -> f64 {
    DEFAULT_MIN_DURATION_SECS
}

fn default_padding_secs() -> f64 {
    DEFAULT_PADDING_SECS
}

fn default_ffmpeg_args() -> Vec<String> {
    ["-map", "0", "-c", "copy", "-y"].iter().map(|s| s.to_string()).collect()
}

fn default_concurrent_cuts() -> usize {
    1
}

fn default_cut_timeout_secs() -> u64 {
    600
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if !self.min_duration_secs.is_finite() || self.min_duration_secs < 0.0 {
            return Err(anyhow!("Minimum duration must be a non-negative number, got {}", self.min_duration_secs));
        }

        if self.min_duration_secs > MAX_DURATION_SECS {
            return Err(anyhow!("Minimum duration must not exceed {} seconds, got {}", MAX_DURATION_SECS, self.min_duration_secs));
        }

        if !self.padding_secs.is_finite() || self.padding_secs < 0.0 {
            return Err(anyhow!("Padding must be a non-negative number, got {}", self.padding_secs));
        }

        if self.padding_secs > MAX_DURATION_SECS {
            return Err(anyhow!("Padding must not exceed {} seconds, got {}", MAX_DURATION_SECS, self.padding_secs));
        }

        if self.cutting.concurrent_cuts == 0 {
            return Err(anyhow!("concurrent_cuts must be at least 1"));
        }

        if self.cutting.cut_timeout_secs == 0 {
            return Err(anyhow!("cut_timeout_secs must be at least 1"));
        }

        if let Some(path) = &self.cutting.ffmpeg_path {
            if path.trim().is_empty() {
                return Err(anyhow!("ffmpeg_path must not be empty when set"));
            }
        }

        Ok(())
    }

    /// Load a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;

        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Save as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let config_json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;

        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            min_duration_secs: default_min_duration_secs(),
            padding_secs: default_padding_secs(),
            cutting: CuttingConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
