//! Stereo cross-feed, applied to the input pair before the FDN.
//!
//! Each channel receives a delayed, attenuated copy of the other, which
//! narrows the image the way two speakers in a room bleed into both ears.
//! An optional phase inversion on the R-to-L path loosens the centre. A
//! trailing Mid/Side width stage remains active even when the cross-feed
//! itself is bypassed.

use resona_core::{DelayLine, Effect, ms_to_samples};

/// Maximum cross-feed delay: 50 ms at the highest supported rate.
const MAX_CROSS_DELAY: usize = 4800;

/// Default inter-channel delay in milliseconds.
const DEFAULT_CROSS_DELAY_MS: f32 = 10.0;

/// Pre-FDN stereo cross-feed processor.
#[derive(Debug, Clone)]
pub struct CrossFeedProcessor {
    delay_l: DelayLine,
    delay_r: DelayLine,
    /// Cross-feed amount in [0, 1]
    amount: f32,
    /// Mid/Side width in [0, 2]
    width: f32,
    /// Invert the R->L cross-feed path
    phase_invert: bool,
    /// Short-circuit the cross-feed (the width stage stays active)
    bypass: bool,
    cross_delay_ms: f32,
    sample_rate: f32,
}

impl CrossFeedProcessor {
    /// Create a cross-feed processor for the given sample rate.
    pub fn new(sample_rate: f32) -> Self {
        let mut processor = Self {
            delay_l: DelayLine::new(MAX_CROSS_DELAY + 1),
            delay_r: DelayLine::new(MAX_CROSS_DELAY + 1),
            amount: 0.5,
            width: 1.0,
            phase_invert: false,
            bypass: false,
            cross_delay_ms: DEFAULT_CROSS_DELAY_MS,
            sample_rate,
        };
        processor.update_delay();
        processor
    }

    /// Set cross-feed amount in [0, 1]. 0 leaves channels untouched.
    pub fn set_amount(&mut self, amount: f32) {
        self.amount = amount.clamp(0.0, 1.0);
    }

    /// Current cross-feed amount.
    pub fn amount(&self) -> f32 {
        self.amount
    }

    /// Set the inter-channel delay in milliseconds (0 to 50 ms).
    pub fn set_cross_delay_ms(&mut self, delay_ms: f32) {
        self.cross_delay_ms = delay_ms.clamp(0.0, 50.0);
        self.update_delay();
    }

    /// Current inter-channel delay in milliseconds.
    pub fn cross_delay_ms(&self) -> f32 {
        self.cross_delay_ms
    }

    /// Set the Mid/Side width factor in [0, 2].
    pub fn set_width(&mut self, width: f32) {
        self.width = width.clamp(0.0, 2.0);
    }

    /// Current width factor.
    pub fn width(&self) -> f32 {
        self.width
    }

    /// Enable phase inversion on the R->L cross-feed path.
    pub fn set_phase_invert(&mut self, invert: bool) {
        self.phase_invert = invert;
    }

    /// Whether the R->L path is inverted.
    pub fn phase_invert(&self) -> bool {
        self.phase_invert
    }

    /// Hard-bypass the cross-feed. The width stage stays active.
    pub fn set_bypass(&mut self, bypass: bool) {
        self.bypass = bypass;
    }

    /// Whether the cross-feed is bypassed.
    pub fn is_bypassed(&self) -> bool {
        self.bypass
    }

    /// Clear the delay-line state.
    pub fn clear(&mut self) {
        self.delay_l.clear();
        self.delay_r.clear();
    }

    fn update_delay(&mut self) {
        let samples = ms_to_samples(self.cross_delay_ms, self.sample_rate);
        self.delay_l.set_delay(samples);
        self.delay_r.set_delay(samples);
    }
}

impl Effect for CrossFeedProcessor {
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        let (mut l, mut r) = (left, right);

        if !self.bypass {
            let l_delayed = self.delay_l.read();
            let r_delayed = self.delay_r.read();

            let cross_l = if self.phase_invert { -r_delayed } else { r_delayed };
            l = left + self.amount * cross_l;
            r = right + self.amount * l_delayed;

            self.delay_l.read_write(left);
            self.delay_r.read_write(right);
        }

        // Width stage is applied regardless of the bypass flag.
        let mid = (l + r) * 0.5;
        let side = (l - r) * 0.5 * self.width;
        (mid + side, mid - side)
    }

    fn is_true_stereo(&self) -> bool {
        true
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.update_delay();
    }

    fn reset(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_amount_unit_width_is_identity() {
        let mut cf = CrossFeedProcessor::new(48000.0);
        cf.set_amount(0.0);
        cf.set_width(1.0);

        for i in 0..100 {
            let l = (i as f32 * 0.11).sin();
            let r = (i as f32 * 0.07).cos();
            let (ol, or) = cf.process_stereo(l, r);
            assert!((ol - l).abs() < 1e-6);
            assert!((or - r).abs() < 1e-6);
        }
    }

    #[test]
    fn test_cross_feed_arrives_after_delay() {
        let mut cf = CrossFeedProcessor::new(48000.0);
        cf.set_amount(1.0);
        cf.set_width(1.0);
        cf.set_cross_delay_ms(1.0); // 48 samples

        // Impulse on the left only.
        let (l0, r0) = cf.process_stereo(1.0, 0.0);
        assert_eq!((l0, r0), (1.0, 0.0));

        for i in 1..48 {
            let (_, r) = cf.process_stereo(0.0, 0.0);
            assert_eq!(r, 0.0, "nothing should bleed before the delay (i={i})");
        }
        let (_, r48) = cf.process_stereo(0.0, 0.0);
        assert!((r48 - 1.0).abs() < 1e-6, "L should arrive in R after 48 samples");
    }

    #[test]
    fn test_phase_inversion_flips_r_to_l_path() {
        let mut cf = CrossFeedProcessor::new(48000.0);
        cf.set_amount(1.0);
        cf.set_width(1.0);
        cf.set_cross_delay_ms(1.0);
        cf.set_phase_invert(true);

        // Impulse on the right only.
        cf.process_stereo(0.0, 1.0);
        for _ in 1..48 {
            cf.process_stereo(0.0, 0.0);
        }
        let (l48, _) = cf.process_stereo(0.0, 0.0);
        assert!((l48 + 1.0).abs() < 1e-6, "inverted path should carry -1, got {l48}");
    }

    #[test]
    fn test_width_zero_collapses_to_mono() {
        let mut cf = CrossFeedProcessor::new(48000.0);
        cf.set_amount(0.0);
        cf.set_width(0.0);

        let (l, r) = cf.process_stereo(1.0, -0.5);
        assert!((l - r).abs() < 1e-7);
        assert!((l - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_bypass_leaves_width_active() {
        let mut cf = CrossFeedProcessor::new(48000.0);
        cf.set_amount(1.0);
        cf.set_width(0.0);
        cf.set_bypass(true);

        // No cross-feed bleeds, but the width stage still runs.
        let (l, r) = cf.process_stereo(1.0, -1.0);
        assert!((l - 0.0).abs() < 1e-7);
        assert!((r - 0.0).abs() < 1e-7);

        for _ in 0..1000 {
            let (l, r) = cf.process_stereo(0.0, 0.0);
            assert_eq!((l, r), (0.0, 0.0), "bypassed cross-feed must not leak");
        }
    }

    #[test]
    fn test_parameter_clamping() {
        let mut cf = CrossFeedProcessor::new(48000.0);
        cf.set_amount(5.0);
        assert_eq!(cf.amount(), 1.0);
        cf.set_width(-1.0);
        assert_eq!(cf.width(), 0.0);
        cf.set_cross_delay_ms(500.0);
        assert_eq!(cf.cross_delay_ms(), 50.0);
    }

    #[test]
    fn test_mono_collapse_scenario() {
        // Hard L/R opposites with full cross-feed and inversion meet as
        // equals after the cross-feed delay.
        let mut cf = CrossFeedProcessor::new(48000.0);
        cf.set_amount(1.0);
        cf.set_width(1.0);
        cf.set_phase_invert(true);
        let delay_samples = (10.0 * 48.0) as usize; // default 10 ms

        cf.process_stereo(1.0, -1.0);
        let mut outputs = Vec::new();
        for _ in 0..delay_samples + 4 {
            outputs.push(cf.process_stereo(0.0, 0.0));
        }
        for (i, (l, r)) in outputs.iter().enumerate().skip(delay_samples - 1) {
            assert!(
                (l - r).abs() < 1e-6,
                "L and R should match after the delay (i={i}): {l} vs {r}"
            );
        }
    }
}
