//! Mathematical utility functions for DSP.
//!
//! Allocation-free helpers shared by the reverb components: level
//! conversions, wet/dry crossfades, denormal control, and planar-buffer
//! utilities.

use libm::{expf, logf};

/// Convert decibels to linear gain.
///
/// # Example
/// ```rust
/// use resona_core::db_to_linear;
///
/// assert!((db_to_linear(0.0) - 1.0).abs() < 0.001);
/// assert!((db_to_linear(-6.02) - 0.5).abs() < 0.01);
/// ```
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    // 10^(dB/20) = e^(dB * ln(10)/20)
    const FACTOR: f32 = core::f32::consts::LN_10 / 20.0;
    expf(db * FACTOR)
}

/// Convert linear gain to decibels. Input is floored at 1e-10 to keep the
/// logarithm finite.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    const FACTOR: f32 = 20.0 / core::f32::consts::LN_10;
    logf(linear.max(1e-10)) * FACTOR
}

/// Flush subnormal (denormalized) floats to zero.
///
/// Subnormal floats (~1e-38 to 1e-45) cause severe CPU performance
/// degradation on most architectures. This function replaces values below
/// 1e-20 with zero, providing margin before the IEEE 754 subnormal range
/// begins.
///
/// Use this in feedback loops (delay lines, allpass chains) where signal can
/// decay indefinitely toward zero.
#[allow(clippy::inline_always)]
#[inline(always)]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < 1e-20 { 0.0 } else { x }
}

/// Crossfade between dry and wet signals.
///
/// Equivalent to `dry * (1 - mix) + wet * mix` but uses one fewer multiply:
/// `dry + (wet - dry) * mix`.
#[inline]
pub fn wet_dry_mix(dry: f32, wet: f32, mix: f32) -> f32 {
    dry + (wet - dry) * mix
}

/// Stereo crossfade between dry and wet signals.
///
/// Applies [`wet_dry_mix`] independently to left and right channels.
#[inline]
pub fn wet_dry_mix_stereo(dry_l: f32, dry_r: f32, wet_l: f32, wet_r: f32, mix: f32) -> (f32, f32) {
    (
        wet_dry_mix(dry_l, wet_l, mix),
        wet_dry_mix(dry_r, wet_r, mix),
    )
}

/// Sum stereo to mono (equal-power average).
#[inline]
pub fn mono_sum(left: f32, right: f32) -> f32 {
    (left + right) * 0.5
}

/// Convert a time in milliseconds to samples.
#[inline]
pub fn ms_to_samples(ms: f32, sample_rate: f32) -> f32 {
    ms * sample_rate / 1000.0
}

/// Convert a sample count to milliseconds.
#[inline]
pub fn samples_to_ms(samples: f32, sample_rate: f32) -> f32 {
    samples * 1000.0 / sample_rate
}

/// Interleave two planar channels into an `[L, R, L, R, ...]` buffer.
///
/// Writes `2 * min(left.len(), right.len())` samples; `out` must be at
/// least that long.
pub fn interleave_stereo(left: &[f32], right: &[f32], out: &mut [f32]) {
    let frames = left.len().min(right.len());
    for i in 0..frames {
        out[i * 2] = left[i];
        out[i * 2 + 1] = right[i];
    }
}

/// Split an `[L, R, L, R, ...]` buffer into planar channels.
pub fn deinterleave_stereo(input: &[f32], left: &mut [f32], right: &mut [f32]) {
    let frames = (input.len() / 2).min(left.len()).min(right.len());
    for i in 0..frames {
        left[i] = input[i * 2];
        right[i] = input[i * 2 + 1];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_linear_roundtrip() {
        let original = 0.5;
        let db = linear_to_db(original);
        let back = db_to_linear(db);
        assert!(
            (original - back).abs() < 1e-5,
            "Roundtrip failed: {} -> {} -> {}",
            original,
            db,
            back
        );
    }

    #[test]
    fn test_db_known_values() {
        assert!((db_to_linear(0.0) - 1.0).abs() < 1e-6);
        assert!((db_to_linear(-6.0206) - 0.5).abs() < 0.001);
        assert!((db_to_linear(6.0206) - 2.0).abs() < 0.001);
    }

    #[test]
    fn test_flush_denormal() {
        assert_eq!(flush_denormal(1e-25), 0.0);
        assert_eq!(flush_denormal(-1e-30), 0.0);
        assert_eq!(flush_denormal(1e-10), 1e-10);
        assert_eq!(flush_denormal(0.5), 0.5);
    }

    #[test]
    fn test_wet_dry_mix_endpoints() {
        assert_eq!(wet_dry_mix(0.3, 0.9, 0.0), 0.3);
        assert_eq!(wet_dry_mix(0.3, 0.9, 1.0), 0.9);
        let mid = wet_dry_mix(0.0, 1.0, 0.5);
        assert!((mid - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_ms_samples_roundtrip() {
        let samples = ms_to_samples(10.0, 48000.0);
        assert!((samples - 480.0).abs() < 1e-3);
        assert!((samples_to_ms(samples, 48000.0) - 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_interleave_roundtrip() {
        let left = [1.0, 2.0, 3.0];
        let right = [-1.0, -2.0, -3.0];
        let mut inter = [0.0; 6];
        interleave_stereo(&left, &right, &mut inter);
        assert_eq!(inter, [1.0, -1.0, 2.0, -2.0, 3.0, -3.0]);

        let mut l2 = [0.0; 3];
        let mut r2 = [0.0; 3];
        deinterleave_stereo(&inter, &mut l2, &mut r2);
        assert_eq!(l2, left);
        assert_eq!(r2, right);
    }
}
