//! Early reflection chain.
//!
//! Four serial all-pass stages with room-scaled prime delays. They emit the
//! initial dense cloud a listener hears before the statistical tail of the
//! FDN takes over. Delay taps track the room-size control; the underlying
//! buffers are allocated once at the maximum length, so retuning never
//! allocates.

use resona_core::AllPassFilter;

/// Base prime delays in samples at 48 kHz.
pub const EARLY_REFLECTION_DELAYS: [usize; 8] = [241, 317, 431, 563, 701, 857, 997, 1151];

/// Stage gains, decreasing for stability as stages compound.
const EARLY_GAINS: [f32; 4] = [0.75, 0.70, 0.65, 0.60];

/// Number of serial stages.
const EARLY_STAGES: usize = 4;

/// Bounds on a scaled tap length in samples.
const MIN_EARLY_DELAY: f32 = 10.0;
const MAX_EARLY_DELAY: f32 = 2400.0;

/// Reference rate the base delays are expressed at.
const REFERENCE_RATE: f32 = 48_000.0;

/// Serial early-reflection all-pass chain.
#[derive(Debug, Clone)]
pub struct EarlyReflections {
    stages: Vec<AllPassFilter>,
    sample_rate: f32,
    room_size: f32,
}

impl EarlyReflections {
    /// Create the chain for a sample rate, tuned for a mid-sized room.
    pub fn new(sample_rate: f32) -> Self {
        let stages = (0..EARLY_STAGES)
            .map(|i| {
                AllPassFilter::with_max_delay(
                    MAX_EARLY_DELAY as usize,
                    EARLY_REFLECTION_DELAYS[i],
                    EARLY_GAINS[i],
                )
            })
            .collect();

        let mut early = Self {
            stages,
            sample_rate,
            room_size: 0.5,
        };
        early.retune();
        early
    }

    /// Set the room size in [0, 1] and retune all taps.
    pub fn set_room_size(&mut self, room_size: f32) {
        self.room_size = room_size.clamp(0.0, 1.0);
        self.retune();
    }

    /// Update the sample rate and retune all taps.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.retune();
    }

    /// Current tap lengths in samples, for diagnostics.
    pub fn delays(&self) -> Vec<f32> {
        self.stages.iter().map(|s| s.delay()).collect()
    }

    /// Run one sample through the stages in series.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let mut signal = input;
        for stage in &mut self.stages {
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

    /// Tap length law: base prime scaled by sample rate and by
    /// `0.3 + 0.7 * room_size`, clamped to [10, 2400] samples.
    fn retune(&mut self) {
        let rate_scale = self.sample_rate / REFERENCE_RATE;
        let room_scale = 0.3 + 0.7 * self.room_size;
        for (i, stage) in self.stages.iter_mut().enumerate() {
            let scaled = EARLY_REFLECTION_DELAYS[i] as f32 * rate_scale * room_scale;
            stage.set_delay(scaled.clamp(MIN_EARLY_DELAY, MAX_EARLY_DELAY));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tap_scaling_law() {
        let mut early = EarlyReflections::new(48000.0);
        early.set_room_size(1.0);
        let delays = early.delays();
        for (i, &d) in delays.iter().enumerate() {
            assert!((d - EARLY_REFLECTION_DELAYS[i] as f32).abs() < 1.0);
        }

        early.set_room_size(0.0);
        let small = early.delays();
        for (i, &d) in small.iter().enumerate() {
            let expected = EARLY_REFLECTION_DELAYS[i] as f32 * 0.3;
            assert!((d - expected).abs() < 1.0, "tap {i}: {d} vs {expected}");
        }
    }

    #[test]
    fn test_sample_rate_scaling() {
        let mut early = EarlyReflections::new(96000.0);
        early.set_room_size(1.0);
        let delays = early.delays();
        // 96 kHz doubles the base taps; later ones clamp at the maximum.
        assert!((delays[0] - 482.0).abs() < 1.0);
        assert!(delays.iter().all(|&d| d <= MAX_EARLY_DELAY));
    }

    #[test]
    fn test_taps_within_bounds_for_any_size() {
        for rate in [44100.0, 48000.0, 96000.0] {
            let mut early = EarlyReflections::new(rate);
            for size in [0.0, 0.25, 0.5, 0.75, 1.0] {
                early.set_room_size(size);
                for d in early.delays() {
                    assert!((MIN_EARLY_DELAY..=MAX_EARLY_DELAY).contains(&d));
                }
            }
        }
    }

    #[test]
    fn test_retune_is_allocation_free_in_effect() {
        // Retuning reuses the same buffers: state survives a small retune
        // only in the sense that nothing panics and output stays finite.
        let mut early = EarlyReflections::new(48000.0);
        early.process(1.0);
        for size in [0.2, 0.8, 0.4, 1.0] {
            early.set_room_size(size);
            for _ in 0..100 {
                assert!(early.process(0.0).is_finite());
            }
        }
    }

    #[test]
    fn test_impulse_produces_dense_cloud() {
        let mut early = EarlyReflections::new(48000.0);
        early.set_room_size(0.8);

        let mut nonzero = 0;
        let mut out = early.process(1.0);
        for _ in 0..4800 {
            if out.abs() > 1e-3 {
                nonzero += 1;
            }
            out = early.process(0.0);
        }
        assert!(nonzero > 10, "expected a reflection cloud, got {nonzero} taps");
    }

    #[test]
    fn test_clear() {
        let mut early = EarlyReflections::new(48000.0);
        for _ in 0..1000 {
            early.process(0.5);
        }
        early.clear();
        assert_eq!(early.process(0.0), 0.0);
    }
}
