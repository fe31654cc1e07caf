//! LFO-modulated delay line.
//!
//! Held per FDN line for chorus-style tail animation. Not part of the hot
//! path today; the engine configures depth and rate with per-line variation
//! so the extension stays exercised and ready.

use core::f32::consts::TAU;
use libm::sinf;
use resona_core::DelayLine;

/// A delay line whose tap is swept by a sine LFO.
#[derive(Debug, Clone)]
pub struct ModulatedDelay {
    delay: DelayLine,
    base_delay: f32,
    mod_depth: f32,
    mod_rate: f32,
    mod_phase: f32,
    sample_rate: f32,
}

impl ModulatedDelay {
    /// Create with a maximum delay capacity in samples.
    pub fn new(max_delay_samples: usize, sample_rate: f32) -> Self {
        Self {
            delay: DelayLine::new(max_delay_samples.max(2)),
            base_delay: 1.0,
            mod_depth: 0.0,
            mod_rate: 0.0,
            mod_phase: 0.0,
            sample_rate,
        }
    }

    /// Set the centre tap in samples.
    pub fn set_base_delay(&mut self, delay_samples: f32) {
        self.base_delay = delay_samples.max(1.0);
    }

    /// Set modulation depth (samples of sweep) and rate (Hz).
    pub fn set_modulation(&mut self, depth: f32, rate: f32) {
        self.mod_depth = depth.max(0.0);
        self.mod_rate = rate.max(0.0);
    }

    /// Current modulation depth in samples.
    pub fn depth(&self) -> f32 {
        self.mod_depth
    }

    /// Current modulation rate in Hz.
    pub fn rate(&self) -> f32 {
        self.mod_rate
    }

    /// Update the sample rate (the LFO increment depends on it).
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    /// Process one sample through the swept tap.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let modulation = self.mod_depth * sinf(self.mod_phase);
        self.delay.set_delay(self.base_delay + modulation);

        self.mod_phase += TAU * self.mod_rate / self.sample_rate;
        if self.mod_phase > TAU {
            self.mod_phase -= TAU;
        }

        self.delay.read_write(input)
    }

    /// Clear the delay buffer and LFO phase.
    pub fn clear(&mut self) {
        self.delay.clear();
        self.mod_phase = 0.0;
    }
}
