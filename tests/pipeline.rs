use std::thread;

use ppg_pulse::local::synthetic::{white_noise, PulseParams, SyntheticPpg};
use ppg_pulse::processing::detectors::PeakDetector;
use ppg_pulse::{
    classify, HrvEstimator, MetricsRecord, PipelineConfig, PipelineController, PipelineError,
    PipelineState, StressLevel,
};

fn started() -> PipelineController {
    let mut controller = PipelineController::new(PipelineConfig::default()).unwrap();
    controller.start();
    controller
}

fn run_pulse(controller: &mut PipelineController, bpm: f64, samples: usize) -> Vec<MetricsRecord> {
    let params = PulseParams {
        bpm,
        ..PulseParams::default()
    };
    SyntheticPpg::new(params)
        .take(samples)
        .map(|x| controller.feed_sample(x).unwrap())
        .collect()
}

#[test]
fn sinusoid_converges_after_window_fills() {
    for target in [60.0, 72.0, 100.0] {
        let mut controller = started();
        let records = run_pulse(&mut controller, target, 450);

        for record in &records[300..] {
            assert_eq!(record.state, PipelineState::Active);
            assert!(
                (record.bpm - target).abs() <= 3.0,
                "{} bpm pulse read as {}",
                target,
                record.bpm
            );
            assert!(record.confidence > 0.8, "confidence {}", record.confidence);
        }
        assert!((controller.latest().average_bpm - target).abs() <= 3.0);
    }
}

#[test]
fn every_rate_in_band_converges() {
    let mut failures = Vec::new();
    for bpm in 45..=150 {
        let target = bpm as f64;
        let mut controller = started();
        let records = run_pulse(&mut controller, target, 600);

        for record in &records[300..] {
            let converged = record.state == PipelineState::Active
                && (record.bpm - target).abs() <= 3.0
                && (record.average_bpm - target).abs() <= 3.0
                && record.confidence > 0.8;
            if !converged {
                failures.push((bpm, record.state.clone(), record.bpm, record.confidence));
                break;
            }
        }
    }
    assert!(failures.is_empty(), "rates not converging: {:?}", failures);
}

const NOISE_SEEDS: [u64; 5] = [3, 7, 11, 19, 42];

#[test]
fn white_noise_never_reads_confident() {
    for seed in NOISE_SEEDS {
        let mut controller = started();
        let noise = white_noise(600, 1.0, seed);

        let mut confidences = Vec::new();
        for (i, &x) in noise.iter().enumerate() {
            let record = controller.feed_sample(x).unwrap();
            if i + 1 >= 300 && (i + 1) % 30 == 0 {
                confidences.push(record.confidence);
            }
        }

        for c in &confidences {
            assert!(*c <= 0.8, "seed {}: noise produced confidence {}", seed, c);
        }
    }
}

fn block_mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

#[test]
fn confidence_falls_when_pulse_gives_way_to_noise() {
    let block = 150;
    let mut first_blocks = Vec::new();
    let mut last_blocks = Vec::new();

    for seed in NOISE_SEEDS {
        let mut controller = started();
        let pulse = run_pulse(&mut controller, 72.0, 300);
        assert!(pulse[299].confidence > 0.8);

        let after: Vec<f64> = white_noise(600, 1.0, seed)
            .into_iter()
            .map(|x| controller.feed_sample(x).unwrap().confidence)
            .collect();

        // From sample 300 on the window holds nothing but noise.
        for (i, c) in after.iter().enumerate().skip(300) {
            if (i + 1) % 30 == 0 {
                assert!(*c <= 0.8, "seed {}: confidence {} on pure noise", seed, c);
            }
        }

        first_blocks.push(block_mean(&after[..block]));
        last_blocks.push(block_mean(&after[after.len() - block..]));
    }

    let first = block_mean(&first_blocks);
    let last = block_mean(&last_blocks);
    assert!(last < first, "confidence rose from {} to {}", first, last);
    assert!(last < 0.6, "settled noise confidence {}", last);
}

#[test]
fn periodic_peaks_have_no_variability() {
    let peaks: Vec<usize> = (0..12).map(|k| 10 + k * 25).collect();
    assert!(HrvEstimator::estimate(&peaks, 30.0).abs() < 1e-9);
}

#[test]
fn peak_spacing_holds_on_adversarial_inputs() {
    let detector = PeakDetector::default();
    let inputs: Vec<Vec<f64>> = vec![
        Vec::new(),
        vec![1.0],
        vec![5.0; 300],
        (0..300).map(|i| i as f64).collect(),
        (0..300).map(|i| -(i as f64)).collect(),
        (0..300).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect(),
        (0..300).map(|i| ((i % 7) as f64).powi(2)).collect(),
        white_noise(300, 3.0, 99),
    ];

    for signal in &inputs {
        for min_distance in [0, 1, 5, 12, 40] {
            let peaks = detector.detect(signal, min_distance);
            for pair in peaks.windows(2) {
                assert!(pair[1] > pair[0]);
                assert!(pair[1] - pair[0] >= min_distance.max(1));
            }
        }
    }
}

#[test]
fn becomes_active_on_third_accepted_estimate() {
    let mut controller = started();
    let mut previous: Option<MetricsRecord> = None;

    for x in SyntheticPpg::new(PulseParams::default()).take(300) {
        let record = controller.feed_sample(x).unwrap();
        if record.state == PipelineState::Active {
            assert_eq!(record.accepted_estimates, 3);
            let previous = previous.expect("active on the first sample");
            assert_eq!(previous.state, PipelineState::Calibrating);
            assert_eq!(previous.accepted_estimates, 2);
            return;
        }
        assert!(record.accepted_estimates < 3);
        previous = Some(record);
    }
    panic!("pipeline never became active");
}

#[test]
fn calibrating_records_carry_real_numbers() {
    let mut controller = started();
    let records = run_pulse(&mut controller, 72.0, 120);
    let calibrating: Vec<&MetricsRecord> = records
        .iter()
        .filter(|r| r.state == PipelineState::Calibrating && r.accepted_estimates > 0)
        .collect();

    assert!(!calibrating.is_empty());
    for record in calibrating {
        assert!(!record.is_trustworthy());
        assert!(record.bpm > 0.0);
    }
}

#[test]
fn stopped_pipeline_rejects_until_restarted() {
    let mut controller = started();
    run_pulse(&mut controller, 72.0, 200);
    controller.stop();

    match controller.feed_sample(140.0) {
        Err(PipelineError::Rejected { state }) => assert_eq!(state, PipelineState::Stopped),
        other => panic!("expected rejection, got {:?}", other),
    }

    controller.start();
    assert_eq!(*controller.state(), PipelineState::Calibrating);
    assert!(controller.window().is_empty());
    assert_eq!(controller.accepted_estimates(), 0);
    assert!(controller.feed_sample(140.0).is_ok());
}

#[test]
fn acquisition_failure_requires_fresh_start() {
    let mut controller = started();
    controller.report_acquisition_failure("camera unplugged").unwrap();
    assert!(matches!(controller.state(), PipelineState::Errored(_)));
    assert!(controller.feed_sample(140.0).is_err());

    controller.start();
    assert!(controller.feed_sample(140.0).is_ok());
}

#[test]
fn window_keeps_only_the_latest_samples() {
    let mut controller = started();
    run_pulse(&mut controller, 72.0, 1000);
    let window = controller.window();
    assert_eq!(window.len(), 300);
    assert!(window.is_full());
    assert_eq!(window.latest().map(|s| s.seq), Some(999));
}

#[test]
fn metrics_are_readable_from_another_thread() {
    let mut controller = started();
    let handle = controller.metrics_handle();
    let last = run_pulse(&mut controller, 72.0, 400).pop().unwrap();

    let seen = thread::spawn(move || handle.latest()).join().unwrap();
    assert_eq!(seen, last);
}

#[test]
fn stress_table_first_match_wins() {
    assert_eq!(classify(60.0, 60.0), StressLevel::Calm);
    assert_eq!(classify(60.0, 50.0), StressLevel::Normal);
    assert_eq!(classify(70.0, 80.0), StressLevel::Normal);
    assert_eq!(classify(90.0, 10.0), StressLevel::Elevated);
    assert_eq!(classify(100.0, 90.0), StressLevel::High);
    assert_eq!(classify(110.0, 5.0), StressLevel::High);
}
