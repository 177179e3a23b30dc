use super::{mean, peak_intervals, variance};
use crate::config::BpmBounds;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BpmEstimate {
    pub bpm: f64,
    pub confidence: f64, // 0 - 1
}

impl BpmEstimate {
    /// "No estimate this cycle."
    pub const NONE: BpmEstimate = BpmEstimate {
        bpm: 0.0,
        confidence: 0.0,
    };

    pub fn is_none(&self) -> bool {
        self.bpm == 0.0
    }
}

/// Converts inter-peak spacing into a rate with a consistency score.
///
/// A raw rate outside `bounds` is discarded and reported as
/// [`BpmEstimate::NONE`], so a returned `bpm` is either 0 or within bounds.
#[derive(Debug, Clone)]
pub struct BpmEstimator {
    bounds: BpmBounds,
}

impl Default for BpmEstimator {
    fn default() -> Self {
        Self::new(BpmBounds::default())
    }
}

impl BpmEstimator {
    pub fn new(bounds: BpmBounds) -> Self {
        Self { bounds }
    }

    pub fn bounds(&self) -> BpmBounds {
        self.bounds
    }

    pub fn estimate(&self, peaks: &[usize], sample_rate: f64) -> BpmEstimate {
        if peaks.len() < 2 || !(sample_rate > 0.0) {
            return BpmEstimate::NONE;
        }

        let intervals = peak_intervals(peaks);
        let mean_interval = mean(&intervals);
        if !(mean_interval > 0.0) {
            return BpmEstimate::NONE;
        }

        let bpm = 60.0 * sample_rate / mean_interval;
        if !bpm.is_finite() || !self.bounds.contains(bpm) {
            return BpmEstimate::NONE;
        }

        let cv = variance(&intervals).sqrt() / mean_interval;
        let confidence = (1.0 - 2.0 * cv).clamp(0.0, 1.0);

        BpmEstimate { bpm, confidence }
    }
}
