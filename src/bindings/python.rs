use crate::config::{BpmBounds, PipelineConfig};
use crate::processing::controller::PipelineController;
use crate::processing::metrics::MetricsRecord;

use std::collections::HashMap;

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

#[pyclass(name = "PipelineController")]
pub struct PyPipelineController {
    controller: PipelineController,
}

#[pymethods]
impl PyPipelineController {
    #[new]
    #[pyo3(signature = (
        sample_rate_hz = 30.0,
        window_seconds = 10.0,
        calibration_min_estimates = 3,
        min_bpm = 40.0,
        max_bpm = 180.0,
        high_cut_hz = 3.0
    ))]
    pub fn new(
        sample_rate_hz: f64,
        window_seconds: f64,
        calibration_min_estimates: usize,
        min_bpm: f64,
        max_bpm: f64,
        high_cut_hz: f64,
    ) -> PyResult<Self> {
        let config = PipelineConfig {
            sample_rate_hz,
            window_seconds,
            calibration_min_estimates,
            bpm_bounds: BpmBounds {
                min: min_bpm,
                max: max_bpm,
            },
            high_cut_hz,
            ..PipelineConfig::default()
        };
        let controller =
            PipelineController::new(config).map_err(|e| PyValueError::new_err(e.to_string()))?;
        Ok(PyPipelineController { controller })
    }

    pub fn start(&mut self) {
        self.controller.start();
    }

    pub fn stop(&mut self) {
        self.controller.stop();
    }

    pub fn reset(&mut self) {
        self.controller.reset();
    }

    pub fn report_acquisition_failure(&mut self, reason: &str) -> PyResult<()> {
        self.controller
            .report_acquisition_failure(reason)
            .map_err(|e| PyValueError::new_err(e.to_string()))
    }

    pub fn state(&self) -> String {
        self.controller.state().to_string()
    }

    pub fn feed_sample(&mut self, intensity: f64) -> PyResult<HashMap<String, f64>> {
        let record = self
            .controller
            .feed_sample(intensity)
            .map_err(|e| PyValueError::new_err(e.to_string()))?;
        Ok(numeric_fields(&record))
    }

    /// Feeds a batch, returning one dict per sample. Stops at the first error.
    pub fn run_chunk(&mut self, data: Vec<f64>) -> PyResult<Vec<HashMap<String, f64>>> {
        data.into_iter()
            .map(|sample| self.feed_sample(sample))
            .collect()
    }

    pub fn stress_level(&self) -> String {
        self.controller.latest().stress_level.to_string()
    }

    pub fn latest(&self) -> HashMap<String, f64> {
        numeric_fields(&self.controller.latest())
    }
}

fn numeric_fields(record: &MetricsRecord) -> HashMap<String, f64> {
    let mut fields = HashMap::new();
    fields.insert("bpm".to_string(), record.bpm);
    fields.insert("average_bpm".to_string(), record.average_bpm);
    fields.insert("confidence".to_string(), record.confidence);
    fields.insert("hrv_ms".to_string(), record.hrv_ms);
    fields.insert(
        "accepted_estimates".to_string(),
        record.accepted_estimates as f64,
    );
    fields
}

/// A Python module implemented in Rust.
#[pymodule]
pub fn ppg_pulse(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyPipelineController>()?;
    Ok(())
}
