//! Feedback Delay Network core.
//!
//! Coordinates the pre-delay, early-reflection and diffusion chains, the
//! bank of fractional delay lines, the orthogonal feedback matrix, and the
//! per-line damping filters. Each line is an owned value inside a
//! contiguous vector; the per-sample loop reads every line into a snapshot
//! vector before any line is written, so the feedback topology is explicit
//! and free of back-references.

use resona_core::{DelayLine, flush_denormal, mono_sum};

use crate::damping::DampingFilter;
use crate::diffusion::DiffusionChain;
use crate::early::EarlyReflections;
use crate::matrix::FeedbackMatrix;
use crate::mod_delay::ModulatedDelay;

/// Per-line buffer capacity: one second at 96 kHz, allocated once.
pub const MAX_DELAY_LENGTH: usize = 96_000;

/// Default number of delay lines.
pub const DEFAULT_DELAY_LINES: usize = 8;

/// Allowed range of delay-line counts.
const MIN_DELAY_LINES: usize = 4;
const MAX_DELAY_LINES: usize = 12;

/// Prime delay lengths in samples at 48 kHz, roughly 30 ms to 100 ms.
/// Mutually prime so the line periods never align into flutter echoes.
pub const PRIME_DELAYS: [usize; 20] = [
    1447, 1549, 1693, 1789, 1907, 2063, 2179, 2311, 2467, 2633, 2801, 2969, 3137, 3307, 3491,
    3677, 3863, 4051, 4241, 4801,
];

/// Shortest allowed line delay in samples.
const MIN_LINE_DELAY: f32 = 200.0;

/// Room-size step beyond which the buffers are flushed at the next block.
pub const ROOM_SIZE_FLUSH_THRESHOLD: f32 = 0.05;

/// Reference rate the prime table is expressed at.
const REFERENCE_RATE: f32 = 48_000.0;

/// Input injection coefficients (how much diffused input feeds each line).
const INPUT_INJECTION_MONO: f32 = 0.3;
const INPUT_INJECTION_STEREO: f32 = 0.2;

/// Output normalisation of the line sum.
const OUTPUT_NORM_MONO: f32 = 0.3;
const OUTPUT_NORM_STEREO: f32 = 0.25;

/// Per-line stereo tap weights: even lines lean left, odd lines mirror.
const STEREO_WEIGHT_MAJOR: f32 = 0.7;
const STEREO_WEIGHT_MINOR: f32 = 0.3;

/// Maximum pre-delay capacity: 200 ms at the highest supported rate.
const MAX_PRE_DELAY: usize = 19_200;

/// The feedback delay network.
#[derive(Debug, Clone)]
pub struct FdnReverb {
    sample_rate: f32,
    num_lines: usize,

    lines: Vec<DelayLine>,
    line_delays: Vec<f32>,
    damping: Vec<DampingFilter>,
    mod_delays: Vec<ModulatedDelay>,
    matrix: FeedbackMatrix,

    pre_delay: DelayLine,
    early: EarlyReflections,
    diffusion: DiffusionChain,

    decay_time: f32,
    room_size: f32,
    density: f32,
    hf_damping: f32,
    lf_damping: f32,

    needs_flush: bool,

    /// Snapshot of all line outputs, read before any line is written.
    delay_outputs: Vec<f32>,
    /// Matrix products, then the damped per-line returns.
    matrix_outputs: Vec<f32>,
}

impl FdnReverb {
    /// Create an FDN with `num_lines` delay lines (clamped to 4..=12).
    ///
    /// All buffers are allocated here at their maximum sizes; no later call
    /// allocates.
    pub fn new(sample_rate: f32, num_lines: usize) -> Self {
        let num_lines = num_lines.clamp(MIN_DELAY_LINES, MAX_DELAY_LINES);

        let lines = (0..num_lines)
            .map(|_| DelayLine::new(MAX_DELAY_LENGTH))
            .collect();
        let damping = (0..num_lines)
            .map(|_| DampingFilter::new(sample_rate))
            .collect();
        let mod_delays = (0..num_lines)
            .map(|_| ModulatedDelay::new(MAX_DELAY_LENGTH / 4, sample_rate))
            .collect();

        let mut fdn = Self {
            sample_rate,
            num_lines,
            lines,
            line_delays: vec![0.0; num_lines],
            damping,
            mod_delays,
            matrix: FeedbackMatrix::new(num_lines),
            pre_delay: DelayLine::new(MAX_PRE_DELAY + 1),
            early: EarlyReflections::new(sample_rate),
            diffusion: DiffusionChain::new(),
            decay_time: 2.0,
            room_size: 0.5,
            density: 0.7,
            hf_damping: 0.3,
            lf_damping: 0.2,
            needs_flush: false,
            delay_outputs: vec![0.0; num_lines],
            matrix_outputs: vec![0.0; num_lines],
        };

        fdn.early.set_room_size(fdn.room_size);
        fdn.diffusion.set_density(fdn.density);
        for filter in &mut fdn.damping {
            filter.set_damping(fdn.hf_damping, fdn.lf_damping);
        }
        fdn.setup_delay_lengths();
        fdn.calibrate_matrix();
        fdn
    }

    /// Number of delay lines.
    pub fn num_lines(&self) -> usize {
        self.num_lines
    }

    /// Current line delays in samples.
    pub fn current_delay_lengths(&self) -> &[f32] {
        &self.line_delays
    }

    /// The feedback matrix, for diagnostics.
    pub fn matrix(&self) -> &FeedbackMatrix {
        &self.matrix
    }

    /// The per-line modulated delays, for diagnostics.
    pub fn modulated_delays(&self) -> &[ModulatedDelay] {
        &self.mod_delays
    }

    /// Mean line delay in samples, the loop length the RT60 calibration
    /// works from.
    pub fn mean_delay(&self) -> f32 {
        self.line_delays.iter().sum::<f32>() / self.num_lines as f32
    }

    /// Set the decay target in seconds (clamped to 0.1..=8.0) and
    /// recalibrate the feedback gain.
    pub fn set_decay_time(&mut self, decay_seconds: f32) {
        let decay = decay_seconds.clamp(0.1, 8.0);
        if (decay - self.decay_time).abs() < 1e-6 {
            return;
        }
        self.decay_time = decay;
        self.calibrate_matrix();
    }

    /// Set the pre-delay in samples (clamped to the allocated capacity).
    pub fn set_pre_delay(&mut self, delay_samples: f32) {
        self.pre_delay.set_delay(delay_samples);
    }

    /// Set the room size in [0, 1].
    ///
    /// Retunes the line and early-reflection taps and recalibrates the
    /// feedback gain. A step larger than [`ROOM_SIZE_FLUSH_THRESHOLD`]
    /// schedules a buffer flush for the next block boundary, so the
    /// now-mismatched taps do not replay pitched garbage.
    pub fn set_room_size(&mut self, size: f32) {
        let size = size.clamp(0.0, 1.0);
        if (size - self.room_size).abs() < 1e-6 {
            return;
        }
        if (size - self.room_size).abs() > ROOM_SIZE_FLUSH_THRESHOLD {
            self.needs_flush = true;
        }
        self.room_size = size;

        self.setup_delay_lengths();
        self.early.set_room_size(size);
        self.calibrate_matrix();
    }

    /// Set the diffusion density in [0, 1].
    pub fn set_density(&mut self, density: f32) {
        self.density = density.clamp(0.0, 1.0);
        self.diffusion.set_density(self.density);
    }

    /// Set high-frequency damping in [0, 1] and recalibrate.
    pub fn set_hf_damping(&mut self, damping: f32) {
        let damping = damping.clamp(0.0, 1.0);
        if (damping - self.hf_damping).abs() < 1e-6 {
            return;
        }
        self.hf_damping = damping;
        for filter in &mut self.damping {
            filter.set_damping(self.hf_damping, self.lf_damping);
        }
        self.calibrate_matrix();
    }

    /// Set low-frequency damping in [0, 1] and recalibrate.
    pub fn set_lf_damping(&mut self, damping: f32) {
        let damping = damping.clamp(0.0, 1.0);
        if (damping - self.lf_damping).abs() < 1e-6 {
            return;
        }
        self.lf_damping = damping;
        for filter in &mut self.damping {
            filter.set_damping(self.hf_damping, self.lf_damping);
        }
        self.calibrate_matrix();
    }

    /// Limit the number of active diffusion stages (1..=8).
    pub fn set_diffusion_stages(&mut self, stages: usize) {
        self.diffusion.set_stages(stages);
    }

    /// Configure tail modulation, varying depth and rate slightly per line
    /// so the lines never sweep in unison.
    pub fn set_modulation(&mut self, depth: f32, rate: f32) {
        let n = self.num_lines as f32;
        for (i, delay) in self.mod_delays.iter_mut().enumerate() {
            let depth_variation = depth * (0.8 + 0.4 * i as f32 / n);
            let rate_variation = rate * (0.9 + 0.2 * i as f32 / n);
            delay.set_modulation(depth_variation, rate_variation);
        }
    }

    /// Request a buffer flush at the next block boundary.
    pub fn schedule_flush(&mut self) {
        self.needs_flush = true;
    }

    /// Whether a flush is pending.
    pub fn flush_pending(&self) -> bool {
        self.needs_flush
    }

    /// Process a mono block.
    pub fn process_mono(&mut self, input: &[f32], output: &mut [f32]) {
        debug_assert_eq!(input.len(), output.len());
        self.apply_pending_flush();

        for (out, &x) in output.iter_mut().zip(input.iter()) {
            self.feed(x, INPUT_INJECTION_MONO);
            let sum: f32 = self.matrix_outputs.iter().sum();
            *out = sum * OUTPUT_NORM_MONO;
        }
    }

    /// Process a stereo block: the cross-fed input pair is collapsed to
    /// mono for the network, and per-line channel weights tap a
    /// decorrelated stereo image back out of the single FDN.
    pub fn process_stereo(
        &mut self,
        input_l: &[f32],
        input_r: &[f32],
        output_l: &mut [f32],
        output_r: &mut [f32],
    ) {
        debug_assert_eq!(input_l.len(), input_r.len());
        debug_assert_eq!(input_l.len(), output_l.len());
        debug_assert_eq!(output_l.len(), output_r.len());
        self.apply_pending_flush();

        for i in 0..input_l.len() {
            self.feed(mono_sum(input_l[i], input_r[i]), INPUT_INJECTION_STEREO);

            let mut left = 0.0f32;
            let mut right = 0.0f32;
            for (j, &damped) in self.matrix_outputs.iter().enumerate() {
                if j % 2 == 0 {
                    left += damped * STEREO_WEIGHT_MAJOR;
                    right += damped * STEREO_WEIGHT_MINOR;
                } else {
                    left += damped * STEREO_WEIGHT_MINOR;
                    right += damped * STEREO_WEIGHT_MAJOR;
                }
            }
            output_l[i] = left * OUTPUT_NORM_STEREO;
            output_r[i] = right * OUTPUT_NORM_STEREO;
        }
    }

    /// One network step: pre-delay, early reflections, diffusion, snapshot
    /// read of every line, matrix mix, damping, injection. Leaves the
    /// damped per-line returns in `matrix_outputs` for the caller's taps.
    #[inline]
    fn feed(&mut self, x: f32, injection: f32) {
        let pre = self.pre_delay.read_write(x);
        let er = self.early.process(pre);
        let diffused = self.diffusion.process(er);

        // Read every line before writing any.
        for (slot, line) in self.delay_outputs.iter_mut().zip(self.lines.iter()) {
            *slot = line.read();
        }
        self.matrix.multiply(&self.delay_outputs, &mut self.matrix_outputs);

        for j in 0..self.num_lines {
            let damped = self.damping[j].process(self.matrix_outputs[j]);
            self.lines[j]
                .read_write(flush_denormal(diffused * injection + damped));
            self.matrix_outputs[j] = damped;
        }
    }

    /// Zero all recirculating state without touching parameters.
    pub fn clear(&mut self) {
        for line in &mut self.lines {
            line.clear();
        }
        for filter in &mut self.damping {
            filter.clear();
        }
        for delay in &mut self.mod_delays {
            delay.clear();
        }
        self.pre_delay.clear();
        self.early.clear();
        self.diffusion.clear();
        self.delay_outputs.fill(0.0);
        self.matrix_outputs.fill(0.0);
    }

    /// Clear state, retune all taps, and recalibrate.
    pub fn reset(&mut self) {
        self.clear();
        self.needs_flush = false;
        self.setup_delay_lengths();
        self.calibrate_matrix();
    }

    /// Update the sample rate. All taps are retuned and the mismatched
    /// buffer contents flushed at the next block.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.early.set_sample_rate(sample_rate);
        for filter in &mut self.damping {
            filter.set_sample_rate(sample_rate);
        }
        for delay in &mut self.mod_delays {
            delay.set_sample_rate(sample_rate);
        }
        self.setup_delay_lengths();
        self.calibrate_matrix();
        self.needs_flush = true;
    }

    fn apply_pending_flush(&mut self) {
        if self.needs_flush {
            self.clear();
            self.needs_flush = false;
        }
    }

    /// Line length law: prime table scaled by sample rate and by
    /// `0.5 + 1.5 * room_size`, clamped to [200, MAX-1], with a +/-1 sample
    /// jitter on later lines so no two lengths align perfectly.
    fn setup_delay_lengths(&mut self) {
        let rate_scale = self.sample_rate / REFERENCE_RATE;
        let room_scale = 0.5 + 1.5 * self.room_size;

        for i in 0..self.num_lines {
            let prime = PRIME_DELAYS[i.min(PRIME_DELAYS.len() - 1)];
            let mut length = (prime as f32 * rate_scale * room_scale)
                .clamp(MIN_LINE_DELAY, (MAX_DELAY_LENGTH - 1) as f32);
            if i > 0 {
                length += (i % 3) as f32 - 1.0;
            }
            self.lines[i].set_delay(length);
            self.line_delays[i] = length;
        }
    }

    fn calibrate_matrix(&mut self) {
        let mean = self.mean_delay();
        self.matrix.calibrate(
            self.decay_time,
            mean,
            self.sample_rate,
            self.room_size,
            self.hf_damping,
            self.lf_damping,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window_rms_db(signal: &[f32], window: usize) -> Vec<f32> {
        signal
            .chunks(window)
            .map(|chunk| {
                let mean_sq = chunk.iter().map(|x| x * x).sum::<f32>() / chunk.len() as f32;
                10.0 * libm::log10f(mean_sq.max(1e-24))
            })
            .collect()
    }

    #[test]
    fn test_silence_in_silence_out() {
        let mut fdn = FdnReverb::new(48000.0, 8);
        let input = vec![0.0f32; 2048];
        let mut output = vec![1.0f32; 2048];
        fdn.process_mono(&input, &mut output);
        assert!(output.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_impulse_has_tail() {
        let mut fdn = FdnReverb::new(48000.0, 8);
        let mut input = vec![0.0f32; 48000];
        input[0] = 1.0;
        let mut output = vec![0.0f32; 48000];
        fdn.process_mono(&input, &mut output);

        let energy: f32 = output.iter().map(|x| x * x).sum();
        assert!(energy > 1e-4, "tail should carry energy, got {energy}");
        assert!(output.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn test_tail_decays_monotonically_in_coarse_windows() {
        let mut fdn = FdnReverb::new(48000.0, 8);
        fdn.set_decay_time(1.0);

        let mut input = vec![0.0f32; 4 * 48000];
        input[0] = 1.0;
        let mut output = vec![0.0f32; 4 * 48000];
        fdn.process_mono(&input, &mut output);

        let windows = window_rms_db(&output, 4096);
        let peak = windows
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();

        for w in windows.windows(2).skip(peak) {
            if w[0] < -180.0 {
                break; // tail has reached silence
            }
            assert!(
                w[1] <= w[0] + 0.5,
                "window rose {} -> {} dB after the peak",
                w[0],
                w[1]
            );
        }
    }

    #[test]
    fn test_decay_time_orders_tail_length() {
        let tail_energy = |decay: f32| {
            let mut fdn = FdnReverb::new(48000.0, 8);
            fdn.set_hf_damping(0.0);
            fdn.set_lf_damping(0.0);
            fdn.set_decay_time(decay);
            let mut input = vec![0.0f32; 96000];
            input[0] = 1.0;
            let mut output = vec![0.0f32; 96000];
            fdn.process_mono(&input, &mut output);
            // Energy in the second half only: the late tail.
            output[48000..].iter().map(|x| x * x).sum::<f32>()
        };

        let short = tail_energy(0.3);
        let long = tail_energy(4.0);
        assert!(
            long > short * 10.0,
            "longer decay should hold far more late energy: {long} vs {short}"
        );
    }

    #[test]
    fn test_room_size_step_schedules_flush() {
        let mut fdn = FdnReverb::new(44100.0, 8);
        fdn.set_room_size(0.2);
        // Warm the network so a flush is observable.
        let mut input = vec![0.0f32; 1024];
        input[0] = 1.0;
        let mut output = vec![0.0f32; 1024];
        fdn.process_mono(&input, &mut output);

        fdn.set_room_size(0.8);
        assert!(fdn.flush_pending());

        // The flush executes at the next block boundary: with zero input
        // the pre-flushed tail is gone immediately.
        let silence = vec![0.0f32; 1024];
        let mut after = vec![0.0f32; 1024];
        fdn.process_mono(&silence, &mut after);
        assert!(!fdn.flush_pending());
        assert!(after.iter().all(|&x| x == 0.0), "flush should zero the tail");
    }

    #[test]
    fn test_small_size_change_does_not_flush() {
        let mut fdn = FdnReverb::new(48000.0, 8);
        fdn.set_room_size(0.5);
        fdn.schedule_flush();
        let silence = vec![0.0f32; 64];
        let mut out = vec![0.0f32; 64];
        fdn.process_mono(&silence, &mut out);

        fdn.set_room_size(0.52);
        assert!(!fdn.flush_pending(), "0.02 step is below the flush threshold");
    }

    #[test]
    fn test_stereo_tail_is_decorrelated() {
        let mut fdn = FdnReverb::new(48000.0, 8);
        let mut in_l = vec![0.0f32; 24000];
        let mut in_r = vec![0.0f32; 24000];
        in_l[0] = 1.0;
        in_r[0] = 1.0;
        let mut out_l = vec![0.0f32; 24000];
        let mut out_r = vec![0.0f32; 24000];
        fdn.process_stereo(&in_l, &in_r, &mut out_l, &mut out_r);

        let differing = out_l
            .iter()
            .zip(out_r.iter())
            .filter(|(l, r)| (**l - **r).abs() > 1e-6)
            .count();
        assert!(
            differing > 1000,
            "stereo taps should decorrelate channels, {differing} samples differ"
        );
    }

    #[test]
    fn test_line_length_law() {
        let fdn = FdnReverb::new(48000.0, 8);
        // room 0.5 -> scale 1.25 at the reference rate.
        let lengths = fdn.current_delay_lengths();
        assert!((lengths[0] - 1447.0 * 1.25).abs() < 0.5);
        // Jitter: line 2 gets +1, line 3 gets -1.
        assert!((lengths[2] - (1693.0 * 1.25 + 1.0)).abs() < 0.5);
        assert!((lengths[3] - (1789.0 * 1.25 - 1.0)).abs() < 0.5);

        let mean = fdn.mean_delay();
        assert!(mean > 1447.0 && mean < 4801.0 * 2.0);
    }

    #[test]
    fn test_line_count_clamped() {
        assert_eq!(FdnReverb::new(48000.0, 1).num_lines(), 4);
        assert_eq!(FdnReverb::new(48000.0, 100).num_lines(), 12);
        assert_eq!(FdnReverb::new(48000.0, 8).num_lines(), 8);
    }

    #[test]
    fn test_modulation_varies_per_line() {
        let mut fdn = FdnReverb::new(48000.0, 8);
        fdn.set_modulation(10.0, 1.0);
        let delays = fdn.modulated_delays();
        assert!((delays[0].depth() - 8.0).abs() < 1e-4);
        assert!(delays[7].depth() > delays[0].depth());
        assert!(delays[7].rate() > delays[0].rate());
    }

    #[test]
    fn test_reset_then_silence_is_silent() {
        let mut fdn = FdnReverb::new(48000.0, 8);
        let mut input = vec![0.5f32; 4096];
        input[0] = 1.0;
        let mut output = vec![0.0f32; 4096];
        fdn.process_mono(&input, &mut output);

        fdn.reset();
        let silence = vec![0.0f32; 4096];
        fdn.process_mono(&silence, &mut output);
        assert!(output.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_no_denormals_in_long_tail() {
        let mut fdn = FdnReverb::new(48000.0, 8);
        fdn.set_decay_time(0.3);
        let mut input = vec![0.0f32; 1024];
        input[0] = 1.0;
        let mut output = vec![0.0f32; 1024];
        fdn.process_mono(&input, &mut output);

        let silence = vec![0.0f32; 1024];
        for _ in 0..200 {
            fdn.process_mono(&silence, &mut output);
            for &x in &output {
                assert!(x == 0.0 || x.abs() > f32::MIN_POSITIVE);
            }
        }
    }
}
