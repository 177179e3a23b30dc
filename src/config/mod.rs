// src/config/mod.rs
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::ConfigError;

/// Largest window the controller will allocate, in samples (about 9.7 h at
/// 30 Hz). Each cycle walks the whole window.
pub const MAX_WINDOW_SAMPLES: usize = 1 << 20;

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct BpmBounds {
    pub min: f64,
    pub max: f64,
}

impl BpmBounds {
    pub fn contains(&self, bpm: f64) -> bool {
        bpm >= self.min && bpm <= self.max
    }
}

impl Default for BpmBounds {
    fn default() -> Self {
        Self {
            min: 40.0,
            max: 180.0,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub sample_rate_hz: f64,
    pub window_seconds: f64,
    pub calibration_min_estimates: usize,
    pub bpm_bounds: BpmBounds,
    pub high_cut_hz: f64,
    pub min_peak_interval_s: f64,
    pub peak_local_radius: usize,
    pub peak_threshold_ratio: f64,
    pub min_signal_seconds: f64,
    pub min_confidence: f64,
    pub average_window: usize,
    pub history_len: usize,
    pub frame_tail_len: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 30.0,
            window_seconds: 10.0,
            calibration_min_estimates: 3,
            bpm_bounds: BpmBounds::default(),
            high_cut_hz: 3.0,
            min_peak_interval_s: 0.4,
            peak_local_radius: 20,
            peak_threshold_ratio: 1.1,
            min_signal_seconds: 3.0,
            min_confidence: 0.3,
            average_window: 10,
            history_len: 100,
            frame_tail_len: 30,
        }
    }
}

impl PipelineConfig {
    /// Number of samples the signal window holds.
    pub fn window_capacity(&self) -> usize {
        (self.sample_rate_hz * self.window_seconds).floor() as usize
    }

    /// Length of the moving-average smoothing pass, never below 2.
    pub fn smoothing_window(&self) -> usize {
        ((self.sample_rate_hz / self.high_cut_hz).floor() as usize).max(2)
    }

    /// Minimum spacing between accepted peaks, in samples.
    pub fn min_peak_distance(&self) -> usize {
        ((self.sample_rate_hz * self.min_peak_interval_s).floor() as usize).max(1)
    }

    /// Samples required in the window before an estimate is attempted.
    pub fn min_signal_samples(&self) -> usize {
        (self.sample_rate_hz * self.min_signal_seconds).floor() as usize
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("sample_rate_hz", self.sample_rate_hz)?;
        positive("window_seconds", self.window_seconds)?;
        positive("high_cut_hz", self.high_cut_hz)?;
        positive("min_peak_interval_s", self.min_peak_interval_s)?;

        if !self.min_signal_seconds.is_finite() || self.min_signal_seconds < 0.0 {
            return Err(ConfigError::invalid(
                "min_signal_seconds",
                format!("must be a non-negative number, got {}", self.min_signal_seconds),
            ));
        }

        let window_samples = self.sample_rate_hz * self.window_seconds;
        if !(window_samples <= MAX_WINDOW_SAMPLES as f64) {
            return Err(ConfigError::invalid(
                "window_seconds",
                format!(
                    "{} s at {} Hz exceeds the {} sample limit",
                    self.window_seconds, self.sample_rate_hz, MAX_WINDOW_SAMPLES
                ),
            ));
        }
        if self.window_capacity() == 0 {
            return Err(ConfigError::invalid(
                "window_seconds",
                format!(
                    "gives a zero-capacity window at {} Hz",
                    self.sample_rate_hz
                ),
            ));
        }

        let bounds = self.bpm_bounds;
        if !bounds.min.is_finite() || !bounds.max.is_finite() || bounds.min <= 0.0 {
            return Err(ConfigError::invalid(
                "bpm_bounds",
                format!("must be finite and positive, got {}..{}", bounds.min, bounds.max),
            ));
        }
        if bounds.min >= bounds.max {
            return Err(ConfigError::invalid(
                "bpm_bounds",
                format!("min ({}) must be below max ({})", bounds.min, bounds.max),
            ));
        }

        if self.calibration_min_estimates == 0 {
            return Err(ConfigError::invalid(
                "calibration_min_estimates",
                "must be at least 1",
            ));
        }
        if self.average_window == 0 {
            return Err(ConfigError::invalid("average_window", "must be at least 1"));
        }
        if !self.peak_threshold_ratio.is_finite() {
            return Err(ConfigError::invalid(
                "peak_threshold_ratio",
                "must be a finite number",
            ));
        }
        if !(0.0..1.0).contains(&self.min_confidence) {
            return Err(ConfigError::invalid(
                "min_confidence",
                format!("must be in [0, 1), got {}", self.min_confidence),
            ));
        }

        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            field,
            format!("must be a positive number, got {}", value),
        ))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub log_file: Option<String>,
    /// One summary row per CLI run is appended here, under `logs/`.
    pub session_csv: Option<String>,
    pub enable_debug_logging: bool,
    pub colored: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_file: None,
            session_csv: None,
            enable_debug_logging: false,
            colored: true,
        }
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let config_str = fs::read_to_string(path).map_err(ConfigError::Read)?;

    let config: Config = serde_yaml::from_str(&config_str).map_err(ConfigError::Parse)?;
    config.pipeline.validate()?;
    Ok(config)
}

pub fn save_config<P: AsRef<Path>>(config: &Config, path: P) -> Result<(), ConfigError> {
    let yaml = serde_yaml::to_string(config).map_err(ConfigError::Serialize)?;

    fs::write(path, yaml).map_err(ConfigError::Write)
}
