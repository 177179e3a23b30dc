use std::fs::File;
use std::path::Path;
use std::time::{Duration, Instant};

use log::{info, warn};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, ReplayError};
use crate::processing::controller::PipelineController;
use crate::processing::metrics::MetricsRecord;

const OUTPUT_HEADERS: [&str; 10] = [
    "seq",
    "intensity",
    "state",
    "bpm",
    "average_bpm",
    "confidence",
    "hrv_ms",
    "stress_level",
    "quality",
    "accepted_estimates",
];

#[derive(Debug, Clone)]
pub struct ReplaySummary {
    pub samples: usize,
    pub skipped: usize,
    pub final_record: MetricsRecord,
    pub duration: Duration,
}

/// Streams a one-column CSV of intensities through a fresh pipeline.
///
/// A non-numeric first row is treated as a header. Non-finite values are
/// counted as skipped. When `output` is given, one metrics row is written
/// per processed sample.
pub fn replay<P: AsRef<Path>>(
    input: P,
    output: Option<&Path>,
    config: PipelineConfig,
) -> Result<ReplaySummary, ReplayError> {
    let start_time = Instant::now();

    let mut controller = PipelineController::new(config)?;
    controller.start();

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_path(input.as_ref())?;

    let mut writer = match output {
        Some(path) => {
            let mut writer = csv::Writer::from_writer(File::create(path)?);
            writer.write_record(OUTPUT_HEADERS)?;
            Some(writer)
        }
        None => None,
    };

    let mut samples = 0;
    let mut skipped = 0;

    for (row, result) in reader.records().enumerate() {
        let record = result?;
        let field = record.get(0).unwrap_or("");
        if field.is_empty() {
            continue;
        }

        let intensity: f64 = match field.parse() {
            Ok(value) => value,
            Err(_) if row == 0 => continue,
            Err(_) => {
                let line = record.position().map_or(row as u64 + 1, |p| p.line());
                return Err(ReplayError::Parse {
                    line,
                    value: field.to_string(),
                });
            }
        };

        let metrics = match controller.feed_sample(intensity) {
            Ok(metrics) => metrics,
            Err(PipelineError::NonFiniteSample { value }) => {
                warn!("row {}: skipping non-finite intensity {}", row + 1, value);
                skipped += 1;
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        samples += 1;

        if let Some(writer) = writer.as_mut() {
            writer.write_record(&metrics_row(intensity, &metrics))?;
        }
    }

    if let Some(mut writer) = writer {
        writer.flush()?;
    }

    let duration = start_time.elapsed();
    info!(
        "replayed {} samples ({} skipped) in {:?}",
        samples, skipped, duration
    );

    Ok(ReplaySummary {
        samples,
        skipped,
        final_record: controller.latest(),
        duration,
    })
}

fn metrics_row(intensity: f64, metrics: &MetricsRecord) -> Vec<String> {
    vec![
        metrics.seq.map_or(String::new(), |s| s.to_string()),
        intensity.to_string(),
        metrics.state.name().to_string(),
        format!("{:.3}", metrics.bpm),
        format!("{:.3}", metrics.average_bpm),
        format!("{:.4}", metrics.confidence),
        format!("{:.3}", metrics.hrv_ms),
        metrics.stress_level.to_string(),
        metrics.quality.to_string(),
        metrics.accepted_estimates.to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local::synthetic::{PulseParams, SyntheticPpg};
    use crate::processing::metrics::PipelineState;
    use std::io::Write;

    fn write_trace(path: &Path, header: bool, values: &[f64]) {
        let mut file = File::create(path).unwrap();
        if header {
            writeln!(file, "intensity").unwrap();
        }
        for v in values {
            writeln!(file, "{}", v).unwrap();
        }
    }

    #[test]
    fn replays_a_synthetic_trace() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("trace.csv");
        let output = dir.path().join("metrics.csv");

        let trace: Vec<f64> = SyntheticPpg::new(PulseParams::default()).take(450).collect();
        write_trace(&input, true, &trace);

        let summary = replay(&input, Some(&output), PipelineConfig::default()).unwrap();
        assert_eq!(summary.samples, 450);
        assert_eq!(summary.skipped, 0);
        assert_eq!(summary.final_record.state, PipelineState::Active);
        assert!((summary.final_record.average_bpm - 72.0).abs() < 3.0);

        let mut rows = csv::Reader::from_path(&output).unwrap();
        assert_eq!(rows.headers().unwrap().len(), OUTPUT_HEADERS.len());
        assert_eq!(rows.records().count(), 450);
    }

    #[test]
    fn non_finite_rows_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("trace.csv");
        std::fs::write(&input, "120.0\nNaN\n121.5\ninf\n119.0\n").unwrap();

        let summary = replay(&input, None, PipelineConfig::default()).unwrap();
        assert_eq!(summary.samples, 3);
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.final_record.seq, Some(2));
    }

    #[test]
    fn garbage_after_first_row_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("trace.csv");
        std::fs::write(&input, "120.0\n121.0\nbright\n").unwrap();

        match replay(&input, None, PipelineConfig::default()) {
            Err(ReplayError::Parse { line, value }) => {
                assert_eq!(line, 3);
                assert_eq!(value, "bright");
            }
            other => panic!("expected parse error, got {:?}", other.map(|s| s.samples)),
        }
    }

    #[test]
    fn missing_input_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let result = replay(dir.path().join("absent.csv"), None, PipelineConfig::default());
        assert!(matches!(result, Err(ReplayError::Csv(_))));
    }
}
