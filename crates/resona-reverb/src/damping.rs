//! Per-line damping filter for the feedback loop.
//!
//! Two Butterworth biquads in series: an HF lowpass whose cutoff drops from
//! 12 kHz towards 1 kHz with the damping amount, and an LF highpass whose
//! cutoff rises from 50 Hz to 500 Hz. Sitting inside the feedback loop, they
//! make high frequencies decay faster than lows — the frequency-dependent
//! tail of a real room.
//!
//! The damping amount additionally scales the feed-forward coefficients,
//! giving a depth control independent of cutoff. At 0% the biquad is forced
//! to an exact identity so the loop picks up no numerical colouring.

use core::f32::consts::FRAC_1_SQRT_2;
use resona_core::{Biquad, highpass_coefficients, lowpass_coefficients};

/// Two-band damping filter, one per FDN return path.
#[derive(Debug, Clone)]
pub struct DampingFilter {
    hf: Biquad,
    lf: Biquad,
    sample_rate: f32,
    /// HF damping amount in [0, 1]
    hf_damping: f32,
    /// LF damping amount in [0, 1]
    lf_damping: f32,
    hf_cutoff: f32,
    lf_cutoff: f32,
}

impl DampingFilter {
    /// Create a bypass-configured damping filter.
    pub fn new(sample_rate: f32) -> Self {
        let mut filter = Self {
            hf: Biquad::new(),
            lf: Biquad::new(),
            sample_rate,
            hf_damping: 0.0,
            lf_damping: 0.0,
            hf_cutoff: 12_000.0,
            lf_cutoff: 50.0,
        };
        filter.update_coefficients();
        filter
    }

    /// Set both damping amounts (each clamped to [0, 1]) and recompute
    /// coefficients.
    pub fn set_damping(&mut self, hf_damping: f32, lf_damping: f32) {
        self.hf_damping = hf_damping.clamp(0.0, 1.0);
        self.lf_damping = lf_damping.clamp(0.0, 1.0);
        self.update_coefficients();
    }

    /// Update the sample rate and recompute coefficients.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.update_coefficients();
    }

    /// Current HF cutoff in Hz.
    pub fn hf_cutoff(&self) -> f32 {
        self.hf_cutoff
    }

    /// Current LF cutoff in Hz.
    pub fn lf_cutoff(&self) -> f32 {
        self.lf_cutoff
    }

    /// Current HF damping amount.
    pub fn hf_damping(&self) -> f32 {
        self.hf_damping
    }

    /// Current LF damping amount.
    pub fn lf_damping(&self) -> f32 {
        self.lf_damping
    }

    /// Process one sample through lowpass then highpass.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        self.lf.process(self.hf.process(input))
    }

    /// Clear the biquad states.
    pub fn clear(&mut self) {
        self.hf.clear();
        self.lf.clear();
    }

    fn update_coefficients(&mut self) {
        // HF lowpass: 12 kHz at 0% down to 1 kHz at 100%.
        self.hf_cutoff = 12_000.0 - 11_000.0 * self.hf_damping;
        if self.hf_damping <= 0.0 {
            self.hf.set_identity();
        } else {
            let (b0, b1, b2, a0, a1, a2) =
                lowpass_coefficients(self.hf_cutoff, FRAC_1_SQRT_2, self.sample_rate);
            let depth = 1.0 - 0.8 * self.hf_damping;
            self.hf
                .set_coefficients(b0 * depth, b1 * depth, b2 * depth, a0, a1, a2);
        }

        // LF highpass: 50 Hz at 0% up to 500 Hz at 100%.
        self.lf_cutoff = 50.0 + 450.0 * self.lf_damping;
        if self.lf_damping <= 0.0 {
            self.lf.set_identity();
        } else {
            let (b0, b1, b2, a0, a1, a2) =
                highpass_coefficients(self.lf_cutoff, FRAC_1_SQRT_2, self.sample_rate);
            let depth = 1.0 - 0.6 * self.lf_damping;
            self.lf
                .set_coefficients(b0 * depth, b1 * depth, b2 * depth, a0, a1, a2);
        }
    }
}
