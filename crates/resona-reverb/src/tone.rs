//! Global tone shaping for the wet bus.
//!
//! A stereo high-cut (lowpass) and low-cut (highpass) pair applied last,
//! after the spread stage. Each filter has an enable flag; disabled means
//! bypassed entirely, not merely opened wide, so a disabled filter adds no
//! phase shift or rounding at all.

use core::f32::consts::FRAC_1_SQRT_2;
use resona_core::{Biquad, Effect, highpass_coefficients, lowpass_coefficients};

/// High-cut frequency range in Hz.
const HIGH_CUT_RANGE: (f32, f32) = (1_000.0, 20_000.0);

/// Low-cut frequency range in Hz.
const LOW_CUT_RANGE: (f32, f32) = (20.0, 1_000.0);

/// Out-of-loop stereo tone filter.
#[derive(Debug, Clone)]
pub struct ToneFilter {
    high_cut_l: Biquad,
    high_cut_r: Biquad,
    low_cut_l: Biquad,
    low_cut_r: Biquad,

    sample_rate: f32,
    high_cut_freq: f32,
    low_cut_freq: f32,
    high_cut_enabled: bool,
    low_cut_enabled: bool,
}

impl ToneFilter {
    /// Create with both filters wide open and disabled.
    pub fn new(sample_rate: f32) -> Self {
        let mut tone = Self {
            high_cut_l: Biquad::new(),
            high_cut_r: Biquad::new(),
            low_cut_l: Biquad::new(),
            low_cut_r: Biquad::new(),
            sample_rate,
            high_cut_freq: HIGH_CUT_RANGE.1,
            low_cut_freq: LOW_CUT_RANGE.0,
            high_cut_enabled: false,
            low_cut_enabled: false,
        };
        tone.update_coefficients();
        tone
    }

    /// Set the high-cut frequency in [1 kHz, 20 kHz].
    pub fn set_high_cut_freq(&mut self, freq_hz: f32) {
        self.high_cut_freq = freq_hz.clamp(HIGH_CUT_RANGE.0, HIGH_CUT_RANGE.1);
        self.update_coefficients();
    }

    /// Current high-cut frequency in Hz.
    pub fn high_cut_freq(&self) -> f32 {
        self.high_cut_freq
    }

    /// Set the low-cut frequency in [20 Hz, 1 kHz].
    pub fn set_low_cut_freq(&mut self, freq_hz: f32) {
        self.low_cut_freq = freq_hz.clamp(LOW_CUT_RANGE.0, LOW_CUT_RANGE.1);
        self.update_coefficients();
    }

    /// Current low-cut frequency in Hz.
    pub fn low_cut_freq(&self) -> f32 {
        self.low_cut_freq
    }

    /// Enable or disable the high-cut filter.
    pub fn set_high_cut_enabled(&mut self, enabled: bool) {
        self.high_cut_enabled = enabled;
    }

    /// Whether the high-cut filter is enabled.
    pub fn is_high_cut_enabled(&self) -> bool {
        self.high_cut_enabled
    }

    /// Enable or disable the low-cut filter.
    pub fn set_low_cut_enabled(&mut self, enabled: bool) {
        self.low_cut_enabled = enabled;
    }

    /// Whether the low-cut filter is enabled.
    pub fn is_low_cut_enabled(&self) -> bool {
        self.low_cut_enabled
    }

    /// Clear all filter state.
    pub fn clear(&mut self) {
        self.high_cut_l.clear();
        self.high_cut_r.clear();
        self.low_cut_l.clear();
        self.low_cut_r.clear();
    }

    fn update_coefficients(&mut self) {
        let (b0, b1, b2, a0, a1, a2) =
            lowpass_coefficients(self.high_cut_freq, FRAC_1_SQRT_2, self.sample_rate);
        self.high_cut_l.set_coefficients(b0, b1, b2, a0, a1, a2);
        self.high_cut_r.set_coefficients(b0, b1, b2, a0, a1, a2);

        let (b0, b1, b2, a0, a1, a2) =
            highpass_coefficients(self.low_cut_freq, FRAC_1_SQRT_2, self.sample_rate);
        self.low_cut_l.set_coefficients(b0, b1, b2, a0, a1, a2);
        self.low_cut_r.set_coefficients(b0, b1, b2, a0, a1, a2);
    }
}

impl Effect for ToneFilter {
    /// Mono path runs the left-channel pair.
    fn process(&mut self, input: f32) -> f32 {
        let mut signal = input;
        if self.high_cut_enabled {
            signal = self.high_cut_l.process(signal);
        }
        if self.low_cut_enabled {
            signal = self.low_cut_l.process(signal);
        }
        signal
    }

    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        let (mut l, mut r) = (left, right);
        if self.high_cut_enabled {
            l = self.high_cut_l.process(l);
            r = self.high_cut_r.process(r);
        }
        if self.low_cut_enabled {
            l = self.low_cut_l.process(l);
            r = self.low_cut_r.process(r);
        }
        (l, r)
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.update_coefficients();
    }

    fn reset(&mut self) {
        self.clear();
    }
}
