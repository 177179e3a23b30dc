use super::{peak_intervals, variance};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse grade of the pulse signal, from the spread of beat intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PulseQuality {
    #[default]
    None,
    Poor,
    Fair,
    Good,
    Excellent,
}

impl PulseQuality {
    /// Grades by the variance of inter-peak intervals in ms^2.
    pub fn assess(peaks: &[usize], sample_rate: f64) -> Self {
        if peaks.len() < 2 || !(sample_rate > 0.0) {
            return PulseQuality::None;
        }

        let intervals_ms: Vec<f64> = peak_intervals(peaks)
            .into_iter()
            .map(|samples| samples / sample_rate * 1000.0)
            .collect();

        match variance(&intervals_ms) {
            v if v < 5_000.0 => PulseQuality::Excellent,
            v if v < 15_000.0 => PulseQuality::Good,
            v if v < 30_000.0 => PulseQuality::Fair,
            _ => PulseQuality::Poor,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PulseQuality::None => "none",
            PulseQuality::Poor => "poor",
            PulseQuality::Fair => "fair",
            PulseQuality::Good => "good",
            PulseQuality::Excellent => "excellent",
        }
    }
}

impl fmt::Display for PulseQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
