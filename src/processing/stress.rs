use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse stress category derived from averaged heart rate and HRV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StressLevel {
    Calm,
    #[default]
    Normal,
    Elevated,
    High,
}

const CALM_MAX_BPM: f64 = 65.0;
const CALM_MIN_HRV_MS: f64 = 50.0;
const NORMAL_MAX_BPM: f64 = 85.0;
const ELEVATED_MAX_BPM: f64 = 100.0;

/// First matching row wins: low rate with high variability is calm,
/// otherwise the rate alone decides.
pub fn classify(avg_bpm: f64, hrv_ms: f64) -> StressLevel {
    if avg_bpm < CALM_MAX_BPM && hrv_ms > CALM_MIN_HRV_MS {
        StressLevel::Calm
    } else if avg_bpm < NORMAL_MAX_BPM {
        StressLevel::Normal
    } else if avg_bpm < ELEVATED_MAX_BPM {
        StressLevel::Elevated
    } else {
        StressLevel::High
    }
}

impl StressLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            StressLevel::Calm => "calm",
            StressLevel::Normal => "normal",
            StressLevel::Elevated => "elevated",
            StressLevel::High => "high",
        }
    }
}

impl fmt::Display for StressLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
