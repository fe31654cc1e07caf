//! DC blocking filter for the wet bus.
//!
//! First-order highpass (Julius O. Smith's DC blocker):
//!
//! ```text
//! H(z) = (1 - z^-1) / (1 - R * z^-1)
//! ```
//!
//! Besides removing DC offset, keeping the blocker on the reverb's wet
//! output prevents the recirculating tail from settling into the subnormal
//! float range as it decays.

use core::f32::consts::PI;

/// DC blocking filter using a first-order highpass.
///
/// The cutoff sits around 7 Hz, well below the audible range.
/// The -3 dB cutoff relates to the pole by `f_c = (1 - R) / (2*pi) * f_s`.
#[derive(Debug, Clone)]
pub struct DcBlocker {
    /// R coefficient (pole position, controls cutoff frequency)
    coeff: f32,
    /// Previous input sample x[n-1]
    x_prev: f32,
    /// Previous output sample y[n-1]
    y_prev: f32,
}

impl DcBlocker {
    /// Cutoff frequency target in Hz.
    const CUTOFF_HZ: f32 = 7.0;

    /// Create a new DC blocker for the given sample rate.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            coeff: Self::calculate_coeff(Self::CUTOFF_HZ, sample_rate),
            x_prev: 0.0,
            y_prev: 0.0,
        }
    }

    /// Process a single sample: `y[n] = x[n] - x[n-1] + R * y[n-1]`.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = input - self.x_prev + self.coeff * self.y_prev;
        self.x_prev = input;
        self.y_prev = output;
        output
    }

    /// Reset the filter state to zero.
    pub fn reset(&mut self) {
        self.x_prev = 0.0;
        self.y_prev = 0.0;
    }

    /// Update the sample rate, keeping the same cutoff frequency.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.coeff = Self::calculate_coeff(Self::CUTOFF_HZ, sample_rate);
    }

    /// Current R coefficient.
    pub fn coeff(&self) -> f32 {
        self.coeff
    }

    /// `R = 1 - 2*pi*fc/fs`, clamped into a safe pole range.
    fn calculate_coeff(cutoff_hz: f32, sample_rate: f32) -> f32 {
        let r = 1.0 - (2.0 * PI * cutoff_hz / sample_rate);
        r.clamp(0.9, 0.9999)
    }
}
