//! Input diffusion chain.
//!
//! A fixed series of Schroeder all-passes whose lengths are distinct small
//! primes, so their phase smearing never lines up into flutter. Gains
//! descend stage by stage (compounding stages need headroom), and the
//! density control lifts all gains together.

use resona_core::AllPassFilter;

/// Prime delay lengths for the diffusion stages, in samples.
pub const DIFFUSION_PRIMES: [usize; 8] = [89, 109, 127, 149, 167, 191, 211, 233];

/// Baseline gain of the first stage; each later stage steps down by 0.03.
const BASE_GAIN: f32 = 0.70;

/// No stage gain may reach this bound.
const GAIN_LIMIT: f32 = 0.95;

/// Serial all-pass diffusion chain.
#[derive(Debug, Clone)]
pub struct DiffusionChain {
    stages: Vec<AllPassFilter>,
    active_stages: usize,
    density: f32,
}

impl DiffusionChain {
    /// Create the full 8-stage chain at zero density.
    pub fn new() -> Self {
        let stages = DIFFUSION_PRIMES
            .iter()
            .enumerate()
            .map(|(i, &len)| AllPassFilter::new(len, BASE_GAIN - i as f32 * 0.03))
            .collect();

        Self {
            stages,
            active_stages: DIFFUSION_PRIMES.len(),
            density: 0.0,
        }
    }

    /// Set density in [0, 1]: a uniform gain offset of up to +0.3 on top of
    /// the per-stage baselines, clamped below 0.95.
    pub fn set_density(&mut self, density: f32) {
        self.density = density.clamp(0.0, 1.0);
        let offset = 0.3 * self.density;
        for (i, stage) in self.stages.iter_mut().enumerate() {
            let gain = (BASE_GAIN - i as f32 * 0.03 + offset).min(GAIN_LIMIT - 0.001);
            stage.set_gain(gain);
        }
    }

    /// Current density.
    pub fn density(&self) -> f32 {
        self.density
    }

    /// Limit how many stages process (1 to 8). Fewer stages trade density
    /// for CPU.
    pub fn set_stages(&mut self, stages: usize) {
        self.active_stages = stages.clamp(1, self.stages.len());
    }

    /// Number of active stages.
    pub fn stages(&self) -> usize {
        self.active_stages
    }

    /// Run one sample through the active stages in series.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let mut signal = input;
        for stage in self.stages.iter_mut().take(self.active_stages) {
            signal = stage.process(signal);
        }
        signal
    }

    /// Clear all stage state.
    pub fn clear(&mut self) {
        for stage in &mut self.stages {
            stage.clear();
        }
    }
}

impl Default for DiffusionChain {
    fn default() -> Self {
        Self::new()
    }
}
