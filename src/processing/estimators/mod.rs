pub mod bpm;
pub mod hrv;
pub mod quality;

pub use bpm::{BpmEstimate, BpmEstimator};
pub use hrv::HrvEstimator;
pub use quality::PulseQuality;

/// Gaps between consecutive peaks, in samples.
pub fn peak_intervals(peaks: &[usize]) -> Vec<f64> {
    peaks
        .windows(2)
        .map(|pair| pair[1].saturating_sub(pair[0]) as f64)
        .collect()
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance.
pub(crate) fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = mean(values);
    values.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / values.len() as f64
}
