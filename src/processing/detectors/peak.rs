/// Local-maximum beat detector with an adaptive threshold.
///
/// A crest is a rise into a sample, or into a run of level samples, that is
/// followed by a fall. A single strictly-higher sample is the common case;
/// a level run is reported once, at its middle index. Samples count as level
/// when they differ by no more than [`LEVEL_TOLERANCE`] of the signal range,
/// so ties broken only by rounding do not split or drop a crest.
///
/// A crest is accepted when it lies at least `min_distance` samples after
/// the last accepted peak and exceeds `threshold_ratio` times the mean of
/// the surrounding `±local_radius` samples (clamped to the signal).
#[derive(Debug, Clone)]
pub struct PeakDetector {
    local_radius: usize,
    threshold_ratio: f64,
}

/// Relative to `max - min` of the signal being scanned.
pub const LEVEL_TOLERANCE: f64 = 1e-9;

impl Default for PeakDetector {
    fn default() -> Self {
        Self {
            local_radius: 20,
            threshold_ratio: 1.1,
        }
    }
}

impl PeakDetector {
    pub fn new(local_radius: usize, threshold_ratio: f64) -> Self {
        Self {
            local_radius,
            threshold_ratio,
        }
    }

    /// Returns accepted peak indices in increasing order. Consecutive
    /// entries are never closer than `min_distance` (treated as at least 1).
    pub fn detect(&self, filtered: &[f64], min_distance: usize) -> Vec<usize> {
        let mut peaks: Vec<usize> = Vec::new();
        let len = filtered.len();
        if len < 3 {
            return peaks;
        }

        let min_distance = min_distance.max(1);
        let prefix = prefix_sums(filtered);
        let tolerance = level_tolerance(filtered);
        let level = |a: f64, b: f64| (a - b).abs() <= tolerance;

        let mut i = 1;
        while i < len - 1 {
            let current = filtered[i];
            if !(current > filtered[i - 1]) || level(current, filtered[i - 1]) {
                i += 1;
                continue;
            }

            // Extend over the level run starting at i.
            let mut run_end = i;
            while run_end + 1 < len && level(filtered[run_end + 1], current) {
                run_end += 1;
            }
            if run_end + 1 >= len || !(filtered[run_end + 1] < current) {
                i = run_end + 1;
                continue;
            }

            let crest = i + (run_end - i) / 2;
            let spaced = peaks.last().map_or(true, |&last| crest - last >= min_distance);
            if spaced {
                let local_mean = self.local_mean(&prefix, crest, len);
                if filtered[crest] > local_mean * self.threshold_ratio {
                    peaks.push(crest);
                }
            }
            i = run_end + 1;
        }

        peaks
    }

    fn local_mean(&self, prefix: &[f64], center: usize, len: usize) -> f64 {
        let start = center.saturating_sub(self.local_radius);
        let end = (center + self.local_radius + 1).min(len);
        (prefix[end] - prefix[start]) / (end - start) as f64
    }
}

fn level_tolerance(signal: &[f64]) -> f64 {
    let (min, max) = signal
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| (lo.min(x), hi.max(x)));
    let range = max - min;
    if range.is_finite() {
        range * LEVEL_TOLERANCE
    } else {
        0.0
    }
}

fn prefix_sums(signal: &[f64]) -> Vec<f64> {
    let mut prefix = Vec::with_capacity(signal.len() + 1);
    prefix.push(0.0);
    let mut total = 0.0;
    for &x in signal {
        total += x;
        prefix.push(total);
    }
    prefix
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn assert_spacing(peaks: &[usize], min_distance: usize) {
        for pair in peaks.windows(2) {
            assert!(pair[1] > pair[0], "peaks not increasing: {:?}", peaks);
            assert!(
                pair[1] - pair[0] >= min_distance,
                "peaks {} and {} closer than {}",
                pair[0],
                pair[1],
                min_distance
            );
        }
    }

    #[test]
    fn finds_sinusoid_crests() {
        // 1.2 Hz at 30 Hz: one crest every 25 samples.
        let signal: Vec<f64> = (0..200)
            .map(|i| (2.0 * std::f64::consts::PI * i as f64 / 25.0).cos())
            .collect();
        let peaks = PeakDetector::default().detect(&signal, 12);
        assert_eq!(peaks, vec![25, 50, 75, 100, 125, 150, 175]);
    }

    #[test]
    fn level_crest_is_reported_once_at_its_middle() {
        let detector = PeakDetector::default();
        assert_eq!(detector.detect(&[0.0, 1.0, 2.0, 2.0, 1.0, 0.0], 1), vec![2]);
        assert_eq!(
            detector.detect(&[0.0, 1.0, 3.0, 3.0, 3.0, 1.0, 0.0], 1),
            vec![3]
        );
    }

    #[test]
    fn shoulder_is_not_a_crest() {
        // Level run followed by a further rise.
        let peaks = PeakDetector::default().detect(&[0.0, 1.0, 1.0, 2.0, 0.0], 1);
        assert_eq!(peaks, vec![3]);
    }

    #[test]
    fn rounding_ties_count_as_level() {
        let signal = [0.0, 0.5, 1.0, 1.0 + 1e-15, 0.5, 0.0];
        assert_eq!(PeakDetector::default().detect(&signal, 1), vec![2]);
    }

    #[test]
    fn smoothed_crests_keep_a_regular_spacing() {
        // 90 BPM at 30 Hz through a 10-sample moving average leaves two-sample
        // crests; every beat must still be found, 20 samples apart.
        let raw: Vec<f64> = (0..300)
            .map(|i| (2.0 * std::f64::consts::PI * 1.5 * i as f64 / 30.0).sin())
            .collect();
        let filtered = crate::processing::filters::bandpass::moving_average(
            &crate::processing::filters::bandpass::remove_dc(&raw),
            10,
        );
        let peaks = PeakDetector::default().detect(&filtered, 12);
        assert!(peaks.len() >= 13, "only {} crests: {:?}", peaks.len(), peaks);
        // The first crest sits in the averaging warm-up.
        for pair in peaks[1..].windows(2) {
            assert!((19..=21).contains(&(pair[1] - pair[0])), "{:?}", peaks);
        }
    }

    #[test]
    fn degenerate_inputs_give_no_peaks() {
        let detector = PeakDetector::default();
        assert!(detector.detect(&[], 12).is_empty());
        assert!(detector.detect(&[1.0], 12).is_empty());
        assert!(detector.detect(&[1.0, 2.0], 12).is_empty());
        assert!(detector.detect(&[0.5; 100], 12).is_empty());

        let ramp: Vec<f64> = (0..100).map(|i| i as f64).collect();
        assert!(detector.detect(&ramp, 12).is_empty());
        let falling: Vec<f64> = ramp.iter().rev().cloned().collect();
        assert!(detector.detect(&falling, 12).is_empty());
    }

    #[test]
    fn small_ripples_are_rejected() {
        // Large positive baseline with tiny wiggles: every crest sits below
        // 1.1x the local mean.
        let signal: Vec<f64> = (0..120)
            .map(|i| 10.0 + 0.01 * (i as f64 * 1.3).sin())
            .collect();
        assert!(PeakDetector::default().detect(&signal, 5).is_empty());
    }

    #[test]
    fn close_crests_are_suppressed() {
        // Crests every 6 samples, minimum distance 12: every other one.
        let signal: Vec<f64> = (0..120)
            .map(|i| (2.0 * std::f64::consts::PI * i as f64 / 6.0).cos())
            .collect();
        let peaks = PeakDetector::default().detect(&signal, 12);
        assert!(!peaks.is_empty());
        assert_spacing(&peaks, 12);
    }

    #[test]
    fn spacing_holds_for_random_inputs() {
        let mut rng = StdRng::seed_from_u64(7);
        let detector = PeakDetector::default();
        for round in 0..200 {
            let len = rng.gen_range(0..400);
            let min_distance = rng.gen_range(0..30);
            let signal: Vec<f64> = (0..len).map(|_| rng.gen_range(-5.0..5.0)).collect();
            let peaks = detector.detect(&signal, min_distance);
            assert_spacing(&peaks, min_distance.max(1));
            assert!(
                peaks.iter().all(|&p| p > 0 && p + 1 < len),
                "round {}: edge index reported",
                round
            );
        }
    }

    #[test]
    fn zero_min_distance_still_strictly_increasing() {
        let signal = [0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0];
        let peaks = PeakDetector::new(2, 1.1).detect(&signal, 0);
        assert_eq!(peaks, vec![1, 3, 5]);
    }
}
