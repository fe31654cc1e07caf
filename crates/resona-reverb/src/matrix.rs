//! Orthogonal feedback matrix for the FDN.
//!
//! A Householder reflection `H = I - 2*v*v^T` built from a normalised
//! pseudo-random vector. Orthogonality means `||H*x|| = ||x||`, so scaling
//! the whole matrix by a gain `g < 1` gives the feedback loop a predictable,
//! frequency-flat energy decay. The gain is derived from the target RT60 and
//! the mean delay length, then capped for guaranteed stability.

use libm::{powf, sqrtf};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Seed for the Householder reflection vector.
///
/// Fixed so the matrix is identical across runs and platforms; changing it
/// changes the engine's output and is a breaking change.
pub const HOUSEHOLDER_SEED: u64 = 42;

/// Hard ceiling on the feedback gain regardless of room size.
pub const GAIN_CEILING: f32 = 0.97;

/// Scaled orthogonal feedback matrix.
///
/// Holds both the unscaled reflection `H` (used for the orthogonality and
/// energy diagnostics) and the gain-scaled matrix `g*H` applied in the
/// feedback loop.
#[derive(Debug, Clone)]
pub struct FeedbackMatrix {
    size: usize,
    /// Unscaled Householder matrix, row-major.
    h: Vec<f32>,
    /// `gain * h`, the matrix actually applied per sample.
    scaled: Vec<f32>,
    gain: f32,
    /// Whether the stability cap bound the gain at the last calibration.
    capped: bool,
}

impl FeedbackMatrix {
    /// Build an `size x size` Householder matrix with unit gain.
    pub fn new(size: usize) -> Self {
        let h = householder(size);
        let scaled = h.clone();
        Self {
            size,
            h,
            scaled,
            gain: 1.0,
            capped: false,
        }
    }

    /// Matrix dimension.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Gain applied at the last calibration.
    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Whether the stability cap bound the gain at the last calibration.
    pub fn is_capped(&self) -> bool {
        self.capped
    }

    /// Derive and apply the feedback gain for a decay target.
    ///
    /// The per-iteration gain for an RT60 of `decay_time` seconds over a
    /// mean loop length of `mean_delay` samples is
    ///
    /// ```text
    /// g* = 10^(-3 * mean_delay / (T60 * fs))
    /// ```
    ///
    /// `decay_time` is first clamped by a size-dependent maximum (large
    /// rooms are not allowed to hang perceptually). The theoretical gain is
    /// modulated by the damping filters' own contribution to decay and
    /// finally limited by a stability cap of `min(0.97, 0.98 - 0.03*size)`.
    ///
    /// Returns the gain actually applied.
    pub fn calibrate(
        &mut self,
        decay_time: f32,
        mean_delay: f32,
        sample_rate: f32,
        room_size: f32,
        hf_damping: f32,
        lf_damping: f32,
    ) -> f32 {
        let t60 = decay_time.min(max_decay_for_size(room_size)).max(0.01);
        let g_star = powf(10.0, -3.0 * mean_delay / (t60 * sample_rate));

        let hf_factor = 1.0 - 0.25 * hf_damping;
        let lf_factor = 1.0 - 0.15 * lf_damping;
        let cap = GAIN_CEILING.min(0.98 - 0.03 * room_size);

        let wanted = g_star * hf_factor * lf_factor;
        let gain = wanted.min(cap);
        self.capped = wanted > cap;
        if self.capped {
            log::debug!(
                "feedback gain capped: wanted {wanted:.4}, cap {cap:.4} (size {room_size:.2})"
            );
        }

        self.gain = gain;
        for (dst, &src) in self.scaled.iter_mut().zip(self.h.iter()) {
            *dst = src * gain;
        }
        gain
    }

    /// Multiply the scaled matrix by `input`, writing into `output`.
    ///
    /// Both slices must have length `size`.
    #[inline]
    pub fn multiply(&self, input: &[f32], output: &mut [f32]) {
        debug_assert_eq!(input.len(), self.size);
        debug_assert_eq!(output.len(), self.size);

        for (i, out) in output.iter_mut().enumerate() {
            let row = &self.scaled[i * self.size..(i + 1) * self.size];
            let mut acc = 0.0f32;
            for (h, &x) in row.iter().zip(input.iter()) {
                acc += h * x;
            }
            *out = acc;
        }
    }

    /// Largest deviation of `H*H^T` from the identity.
    pub fn orthogonality_error(&self) -> f32 {
        let n = self.size;
        let mut max_error = 0.0f32;
        for i in 0..n {
            for j in 0..n {
                let mut dot = 0.0f32;
                for k in 0..n {
                    dot += self.h[i * n + k] * self.h[j * n + k];
                }
                let expected = if i == j { 1.0 } else { 0.0 };
                max_error = max_error.max((dot - expected).abs());
            }
        }
        max_error
    }

    /// Whether the unscaled matrix passes the orthogonality tolerance.
    pub fn is_orthogonal(&self) -> bool {
        self.orthogonality_error() < 1e-4
    }

    /// Sum of squared elements of the unscaled matrix; equals the dimension
    /// for an orthogonal matrix.
    pub fn energy(&self) -> f32 {
        self.h.iter().map(|x| x * x).sum()
    }
}

/// Generate the Householder reflection `I - 2*v*v^T` from the seeded PRNG.
///
/// `v` is drawn from a standard normal distribution (Box-Muller over ChaCha8
/// uniforms) and normalised, so the construction is reproducible bit-for-bit
/// across runs.
fn householder(n: usize) -> Vec<f32> {
    let mut rng = ChaCha8Rng::seed_from_u64(HOUSEHOLDER_SEED);

    let mut v = vec![0.0f32; n];
    for slot in v.iter_mut() {
        let u1: f64 = loop {
            let x: f64 = rng.random();
            if x > 0.0 {
                break x;
            }
        };
        let u2: f64 = rng.random();
        *slot = ((-2.0 * u1.ln()).sqrt() * (core::f64::consts::TAU * u2).cos()) as f32;
    }

    let norm = sqrtf(v.iter().map(|x| x * x).sum());
    for val in v.iter_mut() {
        *val /= norm;
    }

    let mut m = vec![0.0f32; n * n];
    for i in 0..n {
        for j in 0..n {
            let identity = if i == j { 1.0 } else { 0.0 };
            m[i * n + j] = identity - 2.0 * v[i] * v[j];
        }
    }
    m
}

/// Size-dependent maximum decay time in seconds.
///
/// 8 s up to size 0.3, ramping to 6 s by 0.7 and 3 s by 1.0.
pub fn max_decay_for_size(room_size: f32) -> f32 {
    let s = room_size.clamp(0.0, 1.0);
    if s <= 0.3 {
        8.0
    } else if s <= 0.7 {
        8.0 - 2.0 * (s - 0.3) / 0.4
    } else {
        6.0 - 3.0 * (s - 0.7) / 0.3
    }
}
