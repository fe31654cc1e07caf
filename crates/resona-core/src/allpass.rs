//! Allpass filter for reverb diffusion.
//!
//! A Schroeder allpass filter that adds diffusion without coloring the
//! frequency response. Essential for creating dense, smooth reverb tails.

use crate::DelayLine;
use crate::flush_denormal;

/// Schroeder allpass filter for diffusion.
///
/// Implements
///
/// ```text
/// y[n] = -g * x[n] + v[n - L]
/// v[n] =  x[n] + g * v[n - L]
/// ```
///
/// where `v` is the internal delay-line state. The magnitude response is
/// flat; only phase is shaped, which "smears" transients into a denser
/// cloud. The last output sample is kept so callers can inspect the filter
/// state between single-sample calls.
///
/// Stable for `|g| < 1`; typical reverb gains sit in 0.5 - 0.75.
#[derive(Debug, Clone)]
pub struct AllPassFilter {
    delay: DelayLine,
    gain: f32,
    last_output: f32,
}

impl AllPassFilter {
    /// Create an allpass with a fixed delay length in samples.
    pub fn new(delay_samples: usize, gain: f32) -> Self {
        Self::with_max_delay(delay_samples, delay_samples, gain)
    }

    /// Create an allpass whose delay can later be retuned up to
    /// `max_delay_samples` without reallocating.
    ///
    /// Used by the early-reflection chain, whose tap lengths track the
    /// room-size control at runtime.
    pub fn with_max_delay(max_delay_samples: usize, delay_samples: usize, gain: f32) -> Self {
        let mut delay = DelayLine::new(max_delay_samples.max(1) + 1);
        delay.set_delay(delay_samples as f32);
        Self {
            delay,
            gain: gain.clamp(-0.99, 0.99),
            last_output: 0.0,
        }
    }

    /// Set the gain coefficient, clamped to (-1, 1) for stability.
    #[inline]
    pub fn set_gain(&mut self, gain: f32) {
        self.gain = gain.clamp(-0.99, 0.99);
    }

    /// Get the current gain.
    #[inline]
    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Retune the delay length in samples (clamped to the allocated capacity).
    #[inline]
    pub fn set_delay(&mut self, delay_samples: f32) {
        self.delay.set_delay(delay_samples);
    }

    /// Current delay length in samples.
    #[inline]
    pub fn delay(&self) -> f32 {
        self.delay.delay()
    }

    /// Process a single sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let delayed = self.delay.read();
        self.delay
            .read_write(flush_denormal(input + self.gain * delayed));

        let output = -self.gain * input + delayed;
        self.last_output = output;
        output
    }

    /// The most recent output sample.
    #[inline]
    pub fn last_output(&self) -> f32 {
        self.last_output
    }

    /// Clear the filter state.
    pub fn clear(&mut self) {
        self.delay.clear();
        self.last_output = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allpass_impulse_response() {
        let mut allpass = AllPassFilter::new(10, 0.5);

        // First output is the direct -g term.
        let first = allpass.process(1.0);
        assert!((first - (-0.5)).abs() < 1e-6, "got {first}");

        for _ in 0..9 {
            allpass.process(0.0);
        }

        // The stored v[0] = 1.0 emerges after L samples.
        let delayed = allpass.process(0.0);
        assert!((delayed - 1.0).abs() < 1e-6, "got {delayed}");
    }

    #[test]
    fn test_allpass_unit_magnitude() {
        // Energy of the impulse response sums to ~1 for an allpass.
        let mut allpass = AllPassFilter::new(13, 0.7);
        let mut energy = 0.0f32;
        let mut out = allpass.process(1.0);
        energy += out * out;
        for _ in 0..4000 {
            out = allpass.process(0.0);
            energy += out * out;
        }
        assert!(
            (energy - 1.0).abs() < 0.01,
            "Allpass should preserve energy, got {energy}"
        );
    }

    #[test]
    fn test_allpass_stable_tail() {
        let mut allpass = AllPassFilter::new(89, 0.95);
        for _ in 0..100 {
            allpass.process(1.0);
        }
        let mut peak = 0.0f32;
        for _ in 0..50_000 {
            peak = peak.max(allpass.process(0.0).abs());
        }
        assert!(peak.is_finite());
        assert!(peak < 4.0, "Tail should not grow, peak {peak}");
    }

    #[test]
    fn test_allpass_clear() {
        let mut allpass = AllPassFilter::new(10, 0.5);
        for _ in 0..20 {
            allpass.process(1.0);
        }
        allpass.clear();
        assert_eq!(allpass.last_output(), 0.0);
        let out = allpass.process(0.0);
        assert!(out.abs() < 1e-10, "Should be silent after clear");
    }

    #[test]
    fn test_gain_clamped() {
        let mut allpass = AllPassFilter::new(10, 2.0);
        assert!(allpass.gain() < 1.0);
        allpass.set_gain(-3.0);
        assert!(allpass.gain() > -1.0);
    }

    #[test]
    fn test_retune_within_capacity() {
        let mut allpass = AllPassFilter::with_max_delay(100, 50, 0.5);
        allpass.set_delay(75.0);
        assert_eq!(allpass.delay(), 75.0);
        allpass.set_delay(500.0);
        assert!(allpass.delay() <= 100.0);
    }

    #[test]
    fn test_no_denormals_after_silence() {
        let mut allpass = AllPassFilter::new(100, 0.7);
        for _ in 0..1000 {
            allpass.process(0.5);
        }
        for i in 0..100_000 {
            let out = allpass.process(0.0);
            assert!(
                out == 0.0 || out.abs() > f32::MIN_POSITIVE,
                "Denormal detected at sample {i}: {out:.2e}"
            );
        }
    }
}
