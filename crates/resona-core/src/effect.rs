//! Core Effect trait.
//!
//! All stages of the reverb's fixed graph (cross-feed, spread, tone) expose
//! the same stereo-first processing surface so the engine can drive them
//! uniformly per sample or per block.
//!
//! ## Design Decisions
//!
//! - **Stereo-first**: the primary method is `process_stereo()`; mono
//!   effects implement `process()` and get stereo for free, true stereo
//!   effects implement `process_stereo()` and get mono for free.
//! - **No allocations**: every method is safe to call from a real-time
//!   audio context.
//!
//! # Safety Contract
//!
//! Implementors **must** override at least one of `process()` or
//! `process_stereo()`; overriding neither recurses infinitely. This cannot
//! be enforced at compile time in stable Rust.

/// Core trait for audio processing stages.
pub trait Effect {
    /// Process a single mono sample.
    ///
    /// Mono effects implement this; the default derives mono from stereo by
    /// taking the left channel.
    fn process(&mut self, input: f32) -> f32 {
        self.process_stereo(input, input).0
    }

    /// Process a stereo sample pair. The primary processing method.
    ///
    /// The default processes channels independently through `process()`,
    /// which is correct for mono effects and breaks the mutual recursion.
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        (self.process(left), self.process(right))
    }

    /// Process a mono block in place.
    fn process_block_inplace(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    /// Process a stereo block in place.
    ///
    /// # Panics
    ///
    /// Debug-asserts that both channels have the same length.
    fn process_block_stereo_inplace(&mut self, left: &mut [f32], right: &mut [f32]) {
        debug_assert_eq!(
            left.len(),
            right.len(),
            "Left and right buffers must have same length"
        );
        for i in 0..left.len() {
            let (l, r) = self.process_stereo(left[i], right[i]);
            left[i] = l;
            right[i] = r;
        }
    }

    /// Returns whether this effect has cross-channel interaction.
    ///
    /// Default returns `false` (channels processed independently).
    fn is_true_stereo(&self) -> bool {
        false
    }

    /// Update the sample rate; recalculate any dependent coefficients.
    fn set_sample_rate(&mut self, sample_rate: f32);

    /// Clear all internal state (delay lines, filter history) without
    /// changing parameters.
    fn reset(&mut self);
}
