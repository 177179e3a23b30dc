use super::estimators::PulseQuality;
use super::stress::StressLevel;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex};

/// Lifecycle of the pipeline. Samples are accepted only while
/// `Calibrating` or `Active`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PipelineState {
    #[default]
    Idle,
    Calibrating,
    Active,
    Stopped,
    Errored(String),
}

impl PipelineState {
    pub fn accepts_samples(&self) -> bool {
        matches!(self, PipelineState::Calibrating | PipelineState::Active)
    }

    pub fn name(&self) -> &'static str {
        match self {
            PipelineState::Idle => "idle",
            PipelineState::Calibrating => "calibrating",
            PipelineState::Active => "active",
            PipelineState::Stopped => "stopped",
            PipelineState::Errored(_) => "errored",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Errored(reason) => write!(f, "errored ({})", reason),
            other => f.write_str(other.name()),
        }
    }
}

/// What the pipeline reports after every processed sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MetricsRecord {
    pub state: PipelineState,
    /// Sequence number of the last sample fed, if any.
    pub seq: Option<u64>,
    /// Last accepted estimate.
    pub bpm: f64,
    /// Mean of the most recent accepted estimates.
    pub average_bpm: f64,
    /// Confidence of this cycle's estimate, 0 when none was possible.
    pub confidence: f64,
    pub hrv_ms: f64,
    pub stress_level: StressLevel,
    pub quality: PulseQuality,
    pub accepted_estimates: usize,
}

impl MetricsRecord {
    /// Collaborators should not present numbers until this is true.
    pub fn is_trustworthy(&self) -> bool {
        self.state == PipelineState::Active
    }
}

/// Snapshot of one accepted estimate with the tail of the signal behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PpgFrame {
    pub seq: u64,
    pub bpm: f64,
    pub confidence: f64,
    pub hrv_ms: f64,
    pub raw_tail: Vec<f64>,
    pub filtered_tail: Vec<f64>,
}

/// Latest metrics record, readable from any thread.
///
/// The controller is the only writer; readers take an owned copy.
#[derive(Debug, Clone, Default)]
pub struct MetricsHandle {
    inner: Arc<Mutex<MetricsRecord>>,
}

impl MetricsHandle {
    pub fn latest(&self) -> MetricsRecord {
        match self.inner.lock() {
            Ok(record) => record.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub(crate) fn publish(&self, record: MetricsRecord) {
        match self.inner.lock() {
            Ok(mut slot) => *slot = record,
            Err(poisoned) => *poisoned.into_inner() = record,
        }
    }
}
