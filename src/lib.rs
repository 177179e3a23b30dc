//! Camera-based photoplethysmography (PPG) pipeline.
//!
//! Feed one skin-brightness sample per captured frame into a
//! [`PipelineController`]; after each sample it reports heart rate, a
//! confidence score, HRV (RMSSD) and a coarse stress category.

pub mod bindings;
pub mod config;
pub mod error;
pub mod local;
pub mod processing;
pub mod utils;

pub use config::{load_config, save_config, BpmBounds, Config, LoggingConfig, PipelineConfig};
pub use error::{ConfigError, PipelineError, ReplayError};
pub use processing::controller::PipelineController;
pub use processing::estimators::{BpmEstimate, BpmEstimator, HrvEstimator, PulseQuality};
pub use processing::metrics::{MetricsHandle, MetricsRecord, PipelineState, PpgFrame};
pub use processing::stress::{classify, StressLevel};
pub use processing::window::{RawSample, SignalWindow};
