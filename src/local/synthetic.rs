use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// -----------------------------------------------------------------------------
// SETUP FOR THE SIMULATED SIGNALS
// -----------------------------------------------------------------------------

const BASELINE_INTENSITY: f64 = 140.0;
const RESPIRATION_FREQ: f64 = 0.25;

/// Parameters of a simulated skin-brightness trace.
#[derive(Debug, Clone)]
pub struct PulseParams {
    pub sample_rate_hz: f64,
    pub bpm: f64,
    pub pulse_amplitude: f64,
    /// Slow breathing-like baseline wander.
    pub drift_amplitude: f64,
    /// Half-width of uniform per-sample noise.
    pub noise_amplitude: f64,
    pub seed: u64,
}

impl Default for PulseParams {
    fn default() -> Self {
        Self {
            sample_rate_hz: 30.0,
            bpm: 72.0,
            pulse_amplitude: 2.0,
            drift_amplitude: 0.0,
            noise_amplitude: 0.0,
            seed: 0,
        }
    }
}

// -----------------------------------------------------------------------------
// SIMULATING DATA
// -----------------------------------------------------------------------------

/// Endless stream of mean-channel intensities with a pulse at `bpm`.
pub struct SyntheticPpg {
    params: PulseParams,
    rng: StdRng,
    index: u64,
}

impl SyntheticPpg {
    pub fn new(params: PulseParams) -> Self {
        let rng = StdRng::seed_from_u64(params.seed);
        Self {
            params,
            rng,
            index: 0,
        }
    }

    pub fn params(&self) -> &PulseParams {
        &self.params
    }
}

impl Iterator for SyntheticPpg {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        let p = &self.params;
        let t = self.index as f64 / p.sample_rate_hz;
        let pulse_freq = p.bpm / 60.0;

        let pulse = p.pulse_amplitude * (2.0 * std::f64::consts::PI * pulse_freq * t).sin();
        let drift = p.drift_amplitude * (2.0 * std::f64::consts::PI * RESPIRATION_FREQ * t).sin();
        let noise = if p.noise_amplitude > 0.0 {
            self.rng.gen_range(-p.noise_amplitude..p.noise_amplitude)
        } else {
            0.0
        };

        self.index += 1;
        Some(BASELINE_INTENSITY + pulse + drift + noise)
    }
}

/// Uniform noise around the baseline with no periodic structure.
pub fn white_noise(len: usize, amplitude: f64, seed: u64) -> Vec<f64> {
    if amplitude <= 0.0 {
        return vec![BASELINE_INTENSITY; len];
    }
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len)
        .map(|_| BASELINE_INTENSITY + rng.gen_range(-amplitude..amplitude))
        .collect()
}
