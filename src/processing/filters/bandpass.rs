use super::FilterInstance;
use crate::config::PipelineConfig;

/// Coarse pulse-band filter: mean removal followed by a trailing moving
/// average of `floor(fs / f_high)` samples (at least 2).
///
/// There is no low cut beyond the DC subtraction. Peak spacing matters more
/// for the rate estimate than filter sharpness, so this stays cheap.
#[derive(Debug, Clone)]
pub struct BandPassFilter {
    id: String,
    smoothing_window: usize,
}

impl BandPassFilter {
    /// `smoothing_window` is raised to 2 if smaller.
    pub fn new(id: impl Into<String>, smoothing_window: usize) -> Self {
        Self {
            id: id.into(),
            smoothing_window: smoothing_window.max(2),
        }
    }

    pub fn from_config(id: impl Into<String>, config: &PipelineConfig) -> Self {
        Self::new(id, config.smoothing_window())
    }

    pub fn smoothing_window(&self) -> usize {
        self.smoothing_window
    }
}

impl FilterInstance for BandPassFilter {
    fn id(&self) -> &str {
        &self.id
    }

    fn apply(&self, signal: &[f64]) -> Vec<f64> {
        if signal.is_empty() {
            return Vec::new();
        }

        let centered = remove_dc(signal);
        moving_average(&centered, self.smoothing_window)
    }
}

/// Subtracts the arithmetic mean from every sample.
pub fn remove_dc(signal: &[f64]) -> Vec<f64> {
    if signal.is_empty() {
        return Vec::new();
    }
    let mean = signal.iter().sum::<f64>() / signal.len() as f64;
    signal.iter().map(|&x| x - mean).collect()
}

/// Trailing moving average; the first `window - 1` outputs average over the
/// samples seen so far.
pub fn moving_average(signal: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    let mut output = Vec::with_capacity(signal.len());
    let mut running_sum = 0.0;

    for (i, &x) in signal.iter().enumerate() {
        running_sum += x;
        if i >= window {
            running_sum -= signal[i - window];
        }
        let count = (i + 1).min(window);
        output.push(running_sum / count as f64);
    }

    output
}
