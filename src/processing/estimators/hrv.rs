use super::peak_intervals;

/// RMSSD-style variability of the beat sequence, in milliseconds.
pub struct HrvEstimator;

impl HrvEstimator {
    /// Root-mean-square of successive interval differences. Fewer than three
    /// peaks (or a bad sample rate) gives 0.
    pub fn estimate(peaks: &[usize], sample_rate: f64) -> f64 {
        if peaks.len() < 3 || !(sample_rate > 0.0) {
            return 0.0;
        }

        let intervals_ms: Vec<f64> = peak_intervals(peaks)
            .into_iter()
            .map(|samples| samples / sample_rate * 1000.0)
            .collect();

        let sum_of_squares: f64 = intervals_ms
            .windows(2)
            .map(|pair| (pair[1] - pair[0]).powi(2))
            .sum();

        (sum_of_squares / (intervals_ms.len() - 1) as f64).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn periodic_peaks_have_no_variability() {
        let peaks: Vec<usize> = (0..10).map(|k| 5 + k * 25).collect();
        assert!(HrvEstimator::estimate(&peaks, 30.0).abs() < 1e-9);
    }

    #[test]
    fn fewer_than_three_peaks_is_zero() {
        assert_eq!(HrvEstimator::estimate(&[], 30.0), 0.0);
        assert_eq!(HrvEstimator::estimate(&[4, 30], 30.0), 0.0);
    }

    #[test]
    fn alternating_intervals() {
        // Intervals 20, 30, 20, 30 samples at 10 Hz = 2000, 3000, 2000, 3000 ms.
        // Every successive difference is 1000 ms.
        let peaks = [0, 20, 50, 70, 100];
        assert!((HrvEstimator::estimate(&peaks, 10.0) - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn three_peaks_single_difference() {
        // Intervals 24 and 27 samples at 30 Hz: 800 ms and 900 ms.
        let peaks = [0, 24, 51];
        assert!((HrvEstimator::estimate(&peaks, 30.0) - 100.0).abs() < 1e-9);
    }
}
