use super::detectors::PeakDetector;
use super::estimators::{BpmEstimate, BpmEstimator, HrvEstimator, PulseQuality};
use super::filters::bandpass::BandPassFilter;
use super::filters::FilterInstance;
use super::metrics::{MetricsHandle, MetricsRecord, PipelineState, PpgFrame};
use super::stress::{classify, StressLevel};
use super::window::SignalWindow;
use crate::config::PipelineConfig;
use crate::error::{ConfigError, PipelineError};

use log::{debug, info, trace, warn};
use std::collections::VecDeque;

// -----------------------------------------------------------------------------
// PIPELINE CONTROLLER
// -----------------------------------------------------------------------------

/// Owns the signal window and drives one full cycle per fed sample:
/// raw window -> filter -> peaks -> BPM/HRV -> stress.
///
/// Every derived value is recomputed from the window on each call, so there
/// is no cached state to go stale. `feed_sample` must only ever be called
/// from one thread at a time; the published record can be read from any
/// thread through [`MetricsHandle`].
pub struct PipelineController {
    config: PipelineConfig,
    state: PipelineState,
    window: SignalWindow,
    filter: BandPassFilter,
    detector: PeakDetector,
    bpm_estimator: BpmEstimator,
    min_peak_distance: usize,
    min_signal_samples: usize,
    history: History,
    cycle: CycleOutput,
    metrics: MetricsHandle,
}

impl PipelineController {
    pub fn new(config: PipelineConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let controller = PipelineController {
            state: PipelineState::Idle,
            window: SignalWindow::new(config.window_capacity()),
            filter: BandPassFilter::from_config("pulse_band", &config),
            detector: PeakDetector::new(config.peak_local_radius, config.peak_threshold_ratio),
            bpm_estimator: BpmEstimator::new(config.bpm_bounds),
            min_peak_distance: config.min_peak_distance(),
            min_signal_samples: config.min_signal_samples(),
            history: History::new(config.average_window, config.history_len),
            cycle: CycleOutput::insufficient(),
            metrics: MetricsHandle::default(),
            config,
        };
        controller.publish();
        Ok(controller)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn window(&self) -> &SignalWindow {
        &self.window
    }

    /// Accepted estimates since the last `start` or `reset`.
    pub fn accepted_estimates(&self) -> usize {
        self.history.accepted
    }

    pub fn ppg_history(&self) -> impl Iterator<Item = &PpgFrame> + '_ {
        self.history.frames.iter()
    }

    pub fn metrics_handle(&self) -> MetricsHandle {
        self.metrics.clone()
    }

    pub fn latest(&self) -> MetricsRecord {
        self.metrics.latest()
    }

    // LIFECYCLE -------------------------------------------------------------------

    /// Clears all buffers and history and begins calibrating. Valid from any
    /// state; this is the only way out of `Stopped` or `Errored`.
    pub fn start(&mut self) {
        self.clear();
        self.transition(PipelineState::Calibrating);
        self.publish();
    }

    /// Stops accepting samples. The pipeline holds no device handles; the
    /// state change is the collaborator's cue to release the camera.
    pub fn stop(&mut self) {
        self.transition(PipelineState::Stopped);
        self.publish();
    }

    /// Clears buffers and history, keeping the configuration. A running
    /// pipeline goes back to calibrating.
    pub fn reset(&mut self) {
        self.clear();
        if self.state == PipelineState::Active {
            self.transition(PipelineState::Calibrating);
        }
        info!("pipeline buffers reset");
        self.publish();
    }

    /// Records a fatal failure from the capture side (camera unavailable,
    /// permission denied). Requires a fresh `start` to recover.
    pub fn report_acquisition_failure(&mut self, reason: &str) -> Result<(), PipelineError> {
        match self.state {
            PipelineState::Stopped | PipelineState::Errored(_) => {
                warn!(
                    "acquisition failure ignored while {}: {}",
                    self.state, reason
                );
                Err(PipelineError::Rejected {
                    state: self.state.clone(),
                })
            }
            _ => {
                warn!("acquisition failure: {}", reason);
                self.transition(PipelineState::Errored(format!("acquisition: {}", reason)));
                self.publish();
                Ok(())
            }
        }
    }

    // SAMPLE CYCLE ----------------------------------------------------------------

    pub fn feed_sample(&mut self, intensity: f64) -> Result<MetricsRecord, PipelineError> {
        if !self.state.accepts_samples() {
            debug!("sample rejected while {}", self.state);
            return Err(PipelineError::Rejected {
                state: self.state.clone(),
            });
        }
        if !intensity.is_finite() {
            warn!("non-finite intensity sample dropped: {}", intensity);
            return Err(PipelineError::NonFiniteSample { value: intensity });
        }

        self.window.push(intensity);

        match self.run_cycle() {
            Ok(cycle) => self.absorb(cycle),
            Err(reason) => {
                self.transition(PipelineState::Errored(reason.clone()));
                self.publish();
                return Err(PipelineError::StageFailure { reason });
            }
        }

        let record = self.build_record();
        trace!(
            "seq: {:?}, bpm: {:.1}, confidence: {:.2}, hrv_ms: {:.1}, state: {}",
            record.seq,
            record.bpm,
            record.confidence,
            record.hrv_ms,
            record.state
        );
        self.metrics.publish(record.clone());
        Ok(record)
    }

    /// Pure function of the current window.
    fn run_cycle(&self) -> Result<CycleOutput, String> {
        let raw = self.window.snapshot();
        if raw.len() < self.min_signal_samples.max(1) {
            return Ok(CycleOutput::insufficient());
        }

        let filtered = self.filter.apply(raw);
        if filtered.iter().any(|v| !v.is_finite()) {
            return Err(format!(
                "filter `{}` produced a non-finite sample",
                self.filter.id()
            ));
        }

        let fs = self.config.sample_rate_hz;
        let peaks = self.detector.detect(&filtered, self.min_peak_distance);
        let estimate = self.bpm_estimator.estimate(&peaks, fs);
        let hrv_ms = HrvEstimator::estimate(&peaks, fs);
        let quality = PulseQuality::assess(&peaks, fs);

        if !estimate.bpm.is_finite() || !estimate.confidence.is_finite() {
            return Err("bpm estimator produced a non-finite value".to_string());
        }
        if !hrv_ms.is_finite() {
            return Err("hrv estimator produced a non-finite value".to_string());
        }

        Ok(CycleOutput {
            estimate: sanitize(estimate),
            hrv_ms: hrv_ms.max(0.0),
            quality,
            filtered,
        })
    }

    fn absorb(&mut self, cycle: CycleOutput) {
        let estimate = cycle.estimate;
        let accepted = self.bpm_estimator.bounds().contains(estimate.bpm)
            && estimate.confidence > self.config.min_confidence;

        if accepted {
            let seq = self.window.latest().map_or(0, |s| s.seq);
            let frame = PpgFrame {
                seq,
                bpm: estimate.bpm,
                confidence: estimate.confidence,
                hrv_ms: cycle.hrv_ms,
                raw_tail: tail(self.window.snapshot(), self.config.frame_tail_len),
                filtered_tail: tail(&cycle.filtered, self.config.frame_tail_len),
            };
            self.history.accept(frame);

            debug!(
                "estimate accepted: {:.1} bpm (confidence {:.2}), {} so far",
                estimate.bpm, estimate.confidence, self.history.accepted
            );

            if self.state == PipelineState::Calibrating
                && self.history.accepted >= self.config.calibration_min_estimates
            {
                self.transition(PipelineState::Active);
            }
        }

        self.cycle = cycle;
    }

    fn build_record(&self) -> MetricsRecord {
        let average_bpm = self.history.average_bpm();
        let stress_level = if self.history.accepted == 0 {
            StressLevel::default()
        } else {
            classify(average_bpm, self.history.held_hrv_ms)
        };

        MetricsRecord {
            state: self.state.clone(),
            seq: self.window.latest().map(|s| s.seq),
            bpm: self.history.held_bpm,
            average_bpm,
            confidence: self.cycle.estimate.confidence,
            hrv_ms: self.history.held_hrv_ms,
            stress_level,
            quality: self.cycle.quality,
            accepted_estimates: self.history.accepted,
        }
    }

    fn publish(&self) {
        self.metrics.publish(self.build_record());
    }

    fn clear(&mut self) {
        self.window.clear();
        self.history.clear();
        self.cycle = CycleOutput::insufficient();
    }

    fn transition(&mut self, next: PipelineState) {
        if self.state != next {
            info!("pipeline {} -> {}", self.state, next);
            self.state = next;
        }
    }
}

// -----------------------------------------------------------------------------
// CONTROLLER SUBCOMPONENTS
// -----------------------------------------------------------------------------

// CYCLE OUTPUT ----------------------------------------------------------------

struct CycleOutput {
    estimate: BpmEstimate,
    hrv_ms: f64,
    quality: PulseQuality,
    filtered: Vec<f64>,
}

impl CycleOutput {
    fn insufficient() -> Self {
        Self {
            estimate: BpmEstimate::NONE,
            hrv_ms: 0.0,
            quality: PulseQuality::None,
            filtered: Vec::new(),
        }
    }
}

// HISTORY COMPONENT -----------------------------------------------------------

/// Accepted estimates. `held_*` keep the last accepted values indefinitely
/// while later cycles produce nothing usable.
struct History {
    average_window: usize,
    frame_capacity: usize,
    recent_bpm: VecDeque<f64>,
    frames: VecDeque<PpgFrame>,
    accepted: usize,
    held_bpm: f64,
    held_hrv_ms: f64,
}

impl History {
    fn new(average_window: usize, frame_capacity: usize) -> Self {
        Self {
            average_window,
            frame_capacity,
            recent_bpm: VecDeque::with_capacity(average_window),
            frames: VecDeque::with_capacity(frame_capacity),
            accepted: 0,
            held_bpm: 0.0,
            held_hrv_ms: 0.0,
        }
    }

    fn accept(&mut self, frame: PpgFrame) {
        self.held_bpm = frame.bpm;
        self.held_hrv_ms = frame.hrv_ms;
        self.accepted += 1;

        self.recent_bpm.push_back(frame.bpm);
        while self.recent_bpm.len() > self.average_window {
            self.recent_bpm.pop_front();
        }

        if self.frame_capacity > 0 {
            self.frames.push_back(frame);
            while self.frames.len() > self.frame_capacity {
                self.frames.pop_front();
            }
        }
    }

    fn average_bpm(&self) -> f64 {
        if self.recent_bpm.is_empty() {
            return 0.0;
        }
        self.recent_bpm.iter().sum::<f64>() / self.recent_bpm.len() as f64
    }

    fn clear(&mut self) {
        self.recent_bpm.clear();
        self.frames.clear();
        self.accepted = 0;
        self.held_bpm = 0.0;
        self.held_hrv_ms = 0.0;
    }
}

/// Out-of-range values here are defects upstream: loud in debug builds,
/// clamped in release.
fn sanitize(estimate: BpmEstimate) -> BpmEstimate {
    debug_assert!(estimate.bpm >= 0.0, "negative bpm: {}", estimate.bpm);
    debug_assert!(
        (0.0..=1.0).contains(&estimate.confidence),
        "confidence out of range: {}",
        estimate.confidence
    );
    BpmEstimate {
        bpm: estimate.bpm.max(0.0),
        confidence: estimate.confidence.clamp(0.0, 1.0),
    }
}

fn tail(signal: &[f64], len: usize) -> Vec<f64> {
    signal[signal.len().saturating_sub(len)..].to_vec()
}
