use crate::config::PipelineConfig;
use crate::processing::controller::PipelineController;
use crate::processing::estimators::PulseQuality;
use crate::processing::metrics::{MetricsRecord, PipelineState};
use crate::processing::stress::StressLevel;

use std::ffi::CStr;
use std::os::raw::{c_char, c_void};

pub const PPG_STATE_IDLE: u8 = 0;
pub const PPG_STATE_CALIBRATING: u8 = 1;
pub const PPG_STATE_ACTIVE: u8 = 2;
pub const PPG_STATE_STOPPED: u8 = 3;
pub const PPG_STATE_ERRORED: u8 = 4;

/// Flat copy of `MetricsRecord` for C callers. `stress_level` is 0..=3
/// (calm, normal, elevated, high); `quality` is 0..=4 (none..excellent).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct PpgMetricsFFI {
    pub state: u8,
    pub bpm: f64,
    pub average_bpm: f64,
    pub confidence: f64,
    pub hrv_ms: f64,
    pub stress_level: u8,
    pub quality: u8,
    pub accepted_estimates: u64,
}

impl From<&MetricsRecord> for PpgMetricsFFI {
    fn from(record: &MetricsRecord) -> Self {
        let state = match record.state {
            PipelineState::Idle => PPG_STATE_IDLE,
            PipelineState::Calibrating => PPG_STATE_CALIBRATING,
            PipelineState::Active => PPG_STATE_ACTIVE,
            PipelineState::Stopped => PPG_STATE_STOPPED,
            PipelineState::Errored(_) => PPG_STATE_ERRORED,
        };
        let stress_level = match record.stress_level {
            StressLevel::Calm => 0,
            StressLevel::Normal => 1,
            StressLevel::Elevated => 2,
            StressLevel::High => 3,
        };
        let quality = match record.quality {
            PulseQuality::None => 0,
            PulseQuality::Poor => 1,
            PulseQuality::Fair => 2,
            PulseQuality::Good => 3,
            PulseQuality::Excellent => 4,
        };
        Self {
            state,
            bpm: record.bpm,
            average_bpm: record.average_bpm,
            confidence: record.confidence,
            hrv_ms: record.hrv_ms,
            stress_level,
            quality,
            accepted_estimates: record.accepted_estimates as u64,
        }
    }
}

/// Returns null when the configuration is rejected.
#[no_mangle]
pub extern "C" fn ppg_create(sample_rate_hz: f64, window_seconds: f64) -> *mut c_void {
    let config = PipelineConfig {
        sample_rate_hz,
        window_seconds,
        ..PipelineConfig::default()
    };
    match PipelineController::new(config) {
        Ok(controller) => Box::into_raw(Box::new(controller)) as *mut c_void,
        Err(e) => {
            log::error!("ppg_create: {}", e);
            std::ptr::null_mut()
        }
    }
}

#[no_mangle]
pub extern "C" fn ppg_delete(controller_ptr: *mut c_void) {
    if !controller_ptr.is_null() {
        unsafe {
            drop(Box::from_raw(controller_ptr as *mut PipelineController));
        }
    }
}

fn controller_mut<'a>(controller_ptr: *mut c_void) -> Option<&'a mut PipelineController> {
    if controller_ptr.is_null() {
        None
    } else {
        Some(unsafe { &mut *(controller_ptr as *mut PipelineController) })
    }
}

#[no_mangle]
pub extern "C" fn ppg_start(controller_ptr: *mut c_void) {
    if let Some(controller) = controller_mut(controller_ptr) {
        controller.start();
    }
}

#[no_mangle]
pub extern "C" fn ppg_stop(controller_ptr: *mut c_void) {
    if let Some(controller) = controller_mut(controller_ptr) {
        controller.stop();
    }
}

#[no_mangle]
pub extern "C" fn ppg_reset(controller_ptr: *mut c_void) {
    if let Some(controller) = controller_mut(controller_ptr) {
        controller.reset();
    }
}

/// `reason` may be null.
#[no_mangle]
pub extern "C" fn ppg_report_acquisition_failure(
    controller_ptr: *mut c_void,
    reason: *const c_char,
) -> bool {
    let Some(controller) = controller_mut(controller_ptr) else {
        return false;
    };
    let reason = if reason.is_null() {
        "unknown".to_string()
    } else {
        unsafe { CStr::from_ptr(reason) }
            .to_string_lossy()
            .into_owned()
    };
    controller.report_acquisition_failure(&reason).is_ok()
}

/// Feeds one sample. Returns false if the sample was rejected; `out` (may
/// be null) always receives the latest record.
#[no_mangle]
pub extern "C" fn ppg_feed_sample(
    controller_ptr: *mut c_void,
    intensity: f64,
    out: *mut PpgMetricsFFI,
) -> bool {
    let Some(controller) = controller_mut(controller_ptr) else {
        return false;
    };
    let accepted = controller.feed_sample(intensity).is_ok();
    if !out.is_null() {
        unsafe {
            *out = PpgMetricsFFI::from(&controller.latest());
        }
    }
    accepted
}
