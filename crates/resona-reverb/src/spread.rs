//! Stereo spread for the wet bus.
//!
//! Mid/Side width control applied to the reverb output after the FDN taps:
//! width 0 collapses the wet image to mono, 1 leaves it untouched, 2
//! exaggerates it. Widths above 1 raise perceived loudness, so an optional
//! mid-gain compensation keeps the level constant.

use resona_core::Effect;

/// Post-FDN Mid/Side width processor.
#[derive(Debug, Clone)]
pub struct StereoSpreadProcessor {
    /// Width factor in [0, 2]
    width: f32,
    /// Compensate mid gain above unity width
    compensate_gain: bool,
}

impl StereoSpreadProcessor {
    /// Create at natural width with compensation enabled.
    pub fn new() -> Self {
        Self {
            width: 1.0,
            compensate_gain: true,
        }
    }

    /// Set the width factor in [0, 2].
    pub fn set_width(&mut self, width: f32) {
        self.width = width.clamp(0.0, 2.0);
    }

    /// Current width factor.
    pub fn width(&self) -> f32 {
        self.width
    }

    /// Enable or disable mid-gain compensation for widths above 1.
    pub fn set_compensate_gain(&mut self, compensate: bool) {
        self.compensate_gain = compensate;
    }

    /// Whether mid-gain compensation is enabled.
    pub fn is_gain_compensated(&self) -> bool {
        self.compensate_gain
    }

    /// Mid gain for the current width: `1 - 0.15 * (w - 1)` above unity
    /// width, floored at 0.7; unity otherwise.
    fn mid_gain(&self) -> f32 {
        if self.compensate_gain && self.width > 1.0 {
            (1.0 - 0.15 * (self.width - 1.0)).max(0.7)
        } else {
            1.0
        }
    }
}

impl Default for StereoSpreadProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for StereoSpreadProcessor {
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        let mid = (left + right) * 0.5 * self.mid_gain();
        let side = (left - right) * 0.5 * self.width;
        (mid + side, mid - side)
    }

    fn is_true_stereo(&self) -> bool {
        true
    }

    fn set_sample_rate(&mut self, _sample_rate: f32) {}

    fn reset(&mut self) {}
}
