//! Engine orchestrator.
//!
//! Owns the DSP graph, applies the atomic parameter targets through
//! per-parameter smoothers, mixes wet and dry, honours bypass, and keeps a
//! CPU-usage estimate. The engine is owned and mutated by the audio thread;
//! control threads talk to it exclusively through the shared
//! [`ParameterBus`].

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use resona_core::{
    DcBlocker, Effect, LogSmoothedParam, ParamDescriptor, ParameterInfo, SCurveSmoothedParam,
    SmoothedParam, db_to_linear, ms_to_samples, wet_dry_mix, wet_dry_mix_stereo,
};

use crate::crossfeed::CrossFeedProcessor;
use crate::fdn::{DEFAULT_DELAY_LINES, FdnReverb, ROOM_SIZE_FLUSH_THRESHOLD};
use crate::params::{PARAM_COUNT, ParameterBus, Preset, descriptor};
use crate::spread::StereoSpreadProcessor;
use crate::tone::ToneFilter;

/// Supported sample-rate range in Hz.
pub const MIN_SAMPLE_RATE: f32 = 44_100.0;
pub const MAX_SAMPLE_RATE: f32 = 96_000.0;

/// Smoothing time constants, per parameter class.
const WET_DRY_TAU_MS: f32 = 30.0;
const GAIN_TAU_MS: f32 = 40.0;
const DECAY_TAU_MS: f32 = 200.0;
const ROOM_SIZE_TAU_MS: f32 = 300.0;
const DAMPING_TAU_MS: f32 = 100.0;
const PRE_DELAY_TAU_MS: f32 = 50.0;

/// Snap thresholds: moves smaller than these are applied without smoothing.
const WET_DRY_SNAP: f32 = 0.01;
const GAIN_SNAP_RATIO: f32 = 0.0058; // 0.05 dB as a linear ratio

/// Configuration failures at [`ReverbEngine::initialize`].
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum InitError {
    /// Sample rate outside the supported range.
    #[error("sample rate {0} Hz outside supported range 44100-96000 Hz")]
    SampleRateOutOfRange(f32),
    /// Zero maximum block size.
    #[error("maximum block size must be non-zero")]
    InvalidBlockSize,
}

/// The reverberation engine.
///
/// Construction is cheap and leaves the engine uninitialised: processing
/// passes input through unchanged until [`initialize`](Self::initialize)
/// succeeds. All buffers are allocated during initialisation; the audio
/// path never allocates, locks, or blocks.
pub struct ReverbEngine {
    params: Arc<ParameterBus>,

    fdn: FdnReverb,
    cross_feed: CrossFeedProcessor,
    spread: StereoSpreadProcessor,
    tone: ToneFilter,
    dc_blocker_l: DcBlocker,
    dc_blocker_r: DcBlocker,

    wet_dry: SmoothedParam,
    input_gain: LogSmoothedParam,
    output_gain: LogSmoothedParam,
    decay: SmoothedParam,
    room_size: SmoothedParam,
    hf_damping: SmoothedParam,
    lf_damping: SmoothedParam,
    pre_delay: SCurveSmoothedParam,

    sample_rate: f32,
    max_block_size: usize,
    initialized: bool,
    /// Wipe the wet tail on the next unbypassed block.
    tail_flush_pending: bool,

    // Per-block scratch, sized once at initialise.
    dry_l: Vec<f32>,
    dry_r: Vec<f32>,
    feed_l: Vec<f32>,
    feed_r: Vec<f32>,
    wet_l: Vec<f32>,
    wet_r: Vec<f32>,
}

impl ReverbEngine {
    /// Create an uninitialised engine with default parameter targets.
    pub fn new() -> Self {
        let sample_rate = 48_000.0;
        let params = Arc::new(ParameterBus::new());
        let mut engine = Self {
            params,
            fdn: FdnReverb::new(sample_rate, DEFAULT_DELAY_LINES),
            cross_feed: CrossFeedProcessor::new(sample_rate),
            spread: StereoSpreadProcessor::new(),
            tone: ToneFilter::new(sample_rate),
            dc_blocker_l: DcBlocker::new(sample_rate),
            dc_blocker_r: DcBlocker::new(sample_rate),
            wet_dry: SmoothedParam::new(0.0),
            input_gain: LogSmoothedParam::with_config(1.0, sample_rate, GAIN_TAU_MS),
            output_gain: LogSmoothedParam::with_config(1.0, sample_rate, GAIN_TAU_MS),
            decay: SmoothedParam::new(2.0),
            room_size: SmoothedParam::new(0.5),
            hf_damping: SmoothedParam::new(0.5),
            lf_damping: SmoothedParam::new(0.2),
            pre_delay: SCurveSmoothedParam::with_config(0.0, sample_rate, PRE_DELAY_TAU_MS),
            sample_rate,
            max_block_size: 0,
            initialized: false,
            tail_flush_pending: false,
            dry_l: Vec::new(),
            dry_r: Vec::new(),
            feed_l: Vec::new(),
            feed_r: Vec::new(),
            wet_l: Vec::new(),
            wet_r: Vec::new(),
        };
        engine.seed_smoothers();
        engine
    }

    /// Configure for a sample rate and maximum block size. Idempotent; may
    /// be called again to reconfigure. This is the single allocation point.
    pub fn initialize(&mut self, sample_rate: f32, max_block_size: usize) -> Result<(), InitError> {
        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&sample_rate) {
            return Err(InitError::SampleRateOutOfRange(sample_rate));
        }
        if max_block_size == 0 {
            return Err(InitError::InvalidBlockSize);
        }

        self.sample_rate = sample_rate;
        self.max_block_size = max_block_size;

        self.fdn = FdnReverb::new(sample_rate, DEFAULT_DELAY_LINES);
        self.cross_feed = CrossFeedProcessor::new(sample_rate);
        self.spread = StereoSpreadProcessor::new();
        self.tone = ToneFilter::new(sample_rate);
        self.dc_blocker_l = DcBlocker::new(sample_rate);
        self.dc_blocker_r = DcBlocker::new(sample_rate);

        for buffer in [
            &mut self.dry_l,
            &mut self.dry_r,
            &mut self.feed_l,
            &mut self.feed_r,
            &mut self.wet_l,
            &mut self.wet_r,
        ] {
            buffer.clear();
            buffer.resize(max_block_size, 0.0);
        }

        self.wet_dry = SmoothedParam::with_config(0.0, sample_rate, WET_DRY_TAU_MS);
        self.input_gain = LogSmoothedParam::with_config(1.0, sample_rate, GAIN_TAU_MS);
        self.output_gain = LogSmoothedParam::with_config(1.0, sample_rate, GAIN_TAU_MS);
        self.decay = SmoothedParam::with_config(2.0, sample_rate, DECAY_TAU_MS);
        self.room_size = SmoothedParam::with_config(0.5, sample_rate, ROOM_SIZE_TAU_MS);
        self.hf_damping = SmoothedParam::with_config(0.5, sample_rate, DAMPING_TAU_MS);
        self.lf_damping = SmoothedParam::with_config(0.2, sample_rate, DAMPING_TAU_MS);
        self.pre_delay = SCurveSmoothedParam::with_config(0.0, sample_rate, PRE_DELAY_TAU_MS);
        self.seed_smoothers();

        self.tail_flush_pending = false;
        self.initialized = true;
        Ok(())
    }

    /// Whether [`initialize`](Self::initialize) has succeeded.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Engine sample rate in Hz.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Maximum block size accepted by [`process_block`](Self::process_block).
    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }

    /// The shared parameter bus. Clone the `Arc` into control threads; all
    /// setters on it are non-blocking.
    pub fn parameter_bus(&self) -> Arc<ParameterBus> {
        Arc::clone(&self.params)
    }

    /// Apply a named preset by writing its targets into the bus. The
    /// smoothers interpolate; DSP state is not reset.
    pub fn apply_preset(&self, preset: Preset) {
        self.params.apply_preset(preset);
    }

    /// Current preset.
    pub fn preset(&self) -> Preset {
        self.params.preset()
    }

    /// CPU usage of the last block as percent of the block duration.
    pub fn cpu_usage(&self) -> f32 {
        self.params.cpu_usage()
    }

    /// Configure tail modulation on the FDN lines.
    pub fn set_modulation(&mut self, depth: f32, rate: f32) {
        self.fdn.set_modulation(depth, rate);
    }

    /// Limit the number of active diffusion stages (1..=8).
    pub fn set_diffusion_stages(&mut self, stages: usize) {
        self.fdn.set_diffusion_stages(stages);
    }

    /// Flush all delay-line and filter state to zero.
    pub fn reset(&mut self) {
        self.fdn.reset();
        self.cross_feed.reset();
        self.spread.reset();
        self.tone.reset();
        self.dc_blocker_l.reset();
        self.dc_blocker_r.reset();
    }

    /// Process one block of planar f32 audio.
    ///
    /// `inputs` and `outputs` carry 1 (mono) or 2 (stereo) channels of
    /// equal length, at most the configured maximum block size. On bypass
    /// the inputs are copied to the outputs bit-exactly. An uninitialised
    /// engine, an oversized block, or an unsupported channel count also
    /// pass the input through unchanged.
    pub fn process_block(&mut self, inputs: &[&[f32]], outputs: &mut [&mut [f32]]) {
        let channels = inputs.len().min(outputs.len());
        if channels == 0 {
            return;
        }
        let samples = inputs[0].len();
        if samples == 0 {
            return;
        }

        if !self.initialized || channels > 2 || samples > self.max_block_size {
            Self::passthrough(inputs, outputs, channels);
            return;
        }

        let started = Instant::now();

        if self.params.bypass() {
            Self::passthrough(inputs, outputs, channels);
            // The stale tail is wiped when bypass is released.
            self.tail_flush_pending = true;
            self.params.store_cpu_usage(0.0);
            return;
        }

        if self.tail_flush_pending {
            self.fdn.clear();
            self.cross_feed.clear();
            self.tone.clear();
            self.dc_blocker_l.reset();
            self.dc_blocker_r.reset();
            self.tail_flush_pending = false;
        }

        self.apply_parameters(samples);

        if channels == 1 {
            self.process_mono(inputs[0], &mut *outputs[0], samples);
        } else {
            self.process_stereo(inputs, outputs, samples);
        }

        let block_duration = samples as f64 / self.sample_rate as f64;
        let usage = started.elapsed().as_secs_f64() / block_duration * 100.0;
        self.params.store_cpu_usage(usage as f32);
    }

    /// Snapshot the bus and push smoothed values into the DSP graph.
    fn apply_parameters(&mut self, samples: usize) {
        let snap = self.params.snapshot();

        self.wet_dry
            .set_target_snapped(snap.wet_dry_mix / 100.0, WET_DRY_SNAP);

        let in_target = db_to_linear(snap.input_gain_db);
        self.input_gain
            .set_target_snapped(in_target, in_target * GAIN_SNAP_RATIO);
        let out_target = db_to_linear(snap.output_gain_db);
        self.output_gain
            .set_target_snapped(out_target, out_target * GAIN_SNAP_RATIO);

        self.decay.set_target(snap.decay_time);
        self.fdn.set_decay_time(self.decay.advance_by(samples));

        // Room-size steps past the flush threshold snap straight to the
        // target: the flush wipes the tail anyway, so there is nothing to
        // glide. Smaller moves ride the 300 ms smoother and retune the
        // fractional taps click-free, with no flush.
        if (snap.room_size - self.room_size.get()).abs() > ROOM_SIZE_FLUSH_THRESHOLD {
            self.room_size.set_immediate(snap.room_size);
        } else {
            self.room_size.set_target(snap.room_size);
        }
        self.fdn.set_room_size(self.room_size.advance_by(samples));

        self.hf_damping.set_target(snap.hf_damping / 100.0);
        self.fdn.set_hf_damping(self.hf_damping.advance_by(samples));
        self.lf_damping.set_target(snap.lf_damping / 100.0);
        self.fdn.set_lf_damping(self.lf_damping.advance_by(samples));

        self.fdn.set_density(snap.density / 100.0);

        self.pre_delay
            .set_target(ms_to_samples(snap.pre_delay_ms, self.sample_rate));
        self.fdn.set_pre_delay(self.pre_delay.advance_by(samples));

        self.cross_feed.set_amount(snap.cross_feed);
        self.cross_feed.set_cross_delay_ms(snap.cross_delay_ms);
        self.cross_feed.set_phase_invert(snap.phase_invert);

        self.spread.set_width(snap.stereo_width);
        self.spread.set_compensate_gain(snap.spread_compensation);

        if (snap.high_cut_freq - self.tone.high_cut_freq()).abs() > 0.01 {
            self.tone.set_high_cut_freq(snap.high_cut_freq);
        }
        if (snap.low_cut_freq - self.tone.low_cut_freq()).abs() > 0.01 {
            self.tone.set_low_cut_freq(snap.low_cut_freq);
        }
        self.tone.set_high_cut_enabled(snap.high_cut_enabled);
        self.tone.set_low_cut_enabled(snap.low_cut_enabled);
    }

    fn process_mono(&mut self, input: &[f32], output: &mut [f32], samples: usize) {
        for i in 0..samples {
            self.dry_l[i] = input[i] * self.input_gain.advance();
        }

        self.fdn
            .process_mono(&self.dry_l[..samples], &mut self.wet_l[..samples]);

        for i in 0..samples {
            let mut wet = self.tone.process(self.wet_l[i]);
            wet = self.dc_blocker_l.process(wet);
            let mix = self.wet_dry.advance();
            output[i] = wet_dry_mix(self.dry_l[i], wet, mix) * self.output_gain.advance();
        }
    }

    fn process_stereo(&mut self, inputs: &[&[f32]], outputs: &mut [&mut [f32]], samples: usize) {
        for i in 0..samples {
            let gain = self.input_gain.advance();
            self.dry_l[i] = inputs[0][i] * gain;
            self.dry_r[i] = inputs[1][i] * gain;
        }

        // Cross-feed shapes the pair the network hears; the dry path stays
        // untouched for the final mix.
        self.feed_l[..samples].copy_from_slice(&self.dry_l[..samples]);
        self.feed_r[..samples].copy_from_slice(&self.dry_r[..samples]);
        self.cross_feed
            .process_block_stereo_inplace(&mut self.feed_l[..samples], &mut self.feed_r[..samples]);

        self.fdn.process_stereo(
            &self.feed_l[..samples],
            &self.feed_r[..samples],
            &mut self.wet_l[..samples],
            &mut self.wet_r[..samples],
        );

        self.spread
            .process_block_stereo_inplace(&mut self.wet_l[..samples], &mut self.wet_r[..samples]);
        self.tone
            .process_block_stereo_inplace(&mut self.wet_l[..samples], &mut self.wet_r[..samples]);

        let (out_l, out_r) = outputs.split_at_mut(1);
        let out_l = &mut out_l[0];
        let out_r = &mut out_r[0];
        for i in 0..samples {
            let wet_l = self.dc_blocker_l.process(self.wet_l[i]);
            let wet_r = self.dc_blocker_r.process(self.wet_r[i]);
            let mix = self.wet_dry.advance();
            let gain = self.output_gain.advance();
            let (l, r) = wet_dry_mix_stereo(self.dry_l[i], self.dry_r[i], wet_l, wet_r, mix);
            out_l[i] = l * gain;
            out_r[i] = r * gain;
        }
    }

    fn passthrough(inputs: &[&[f32]], outputs: &mut [&mut [f32]], channels: usize) {
        for ch in 0..channels {
            let n = inputs[ch].len().min(outputs[ch].len());
            outputs[ch][..n].copy_from_slice(&inputs[ch][..n]);
        }
    }

    /// Align every smoother with the bus targets, skipping any ramp-in.
    fn seed_smoothers(&mut self) {
        let snap = self.params.snapshot();
        self.wet_dry.set_immediate(snap.wet_dry_mix / 100.0);
        self.input_gain.set_immediate(db_to_linear(snap.input_gain_db));
        self.output_gain
            .set_immediate(db_to_linear(snap.output_gain_db));
        self.decay.set_immediate(snap.decay_time);
        self.room_size.set_immediate(snap.room_size);
        self.hf_damping.set_immediate(snap.hf_damping / 100.0);
        self.lf_damping.set_immediate(snap.lf_damping / 100.0);
        self.pre_delay
            .set_immediate(ms_to_samples(snap.pre_delay_ms, self.sample_rate));
    }

    pub(crate) fn fdn_mut(&mut self) -> &mut FdnReverb {
        &mut self.fdn
    }

    pub(crate) fn fdn(&self) -> &FdnReverb {
        &self.fdn
    }

    /// Multiline configuration report: delay lengths, matrix size and
    /// energy, and the Householder orthogonality verdict.
    pub fn configuration(&self) -> String {
        use std::fmt::Write;

        let mut report = String::new();
        let _ = writeln!(report, "=== FDN Reverb Configuration ===");
        let _ = writeln!(report, "Sample Rate: {:.1} Hz", self.sample_rate);
        let _ = writeln!(report, "Delay Lines: {}", self.fdn.num_lines());
        let _ = writeln!(report, "FDN Delay Lengths (samples):");
        for (i, len) in self.fdn.current_delay_lengths().iter().enumerate() {
            let ms = len / self.sample_rate * 1000.0;
            let _ = writeln!(report, "  Line {i}: {len:.1} ({ms:.1} ms)");
        }

        let matrix = self.fdn.matrix();
        let _ = writeln!(
            report,
            "Matrix Size: {0}x{0}",
            matrix.size()
        );
        let _ = writeln!(
            report,
            "Matrix Energy: {:.6} (should be ~{} for orthogonal)",
            matrix.energy(),
            matrix.size()
        );
        let _ = writeln!(
            report,
            "Orthogonality: {} (max error {:.2e})",
            if matrix.is_orthogonal() { "Yes" } else { "No" },
            matrix.orthogonality_error()
        );
        let _ = writeln!(report, "Feedback Gain: {:.4}", matrix.gain());
        report
    }

    /// Print the configuration report to stdout. Diagnostic only; never
    /// call this from the audio thread.
    pub fn print_configuration(&self) {
        println!("{}", self.configuration());
    }
}

impl Default for ReverbEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterInfo for ReverbEngine {
    fn param_count(&self) -> usize {
        PARAM_COUNT
    }

    fn param_info(&self, index: usize) -> Option<ParamDescriptor> {
        descriptor(index)
    }

    fn get_param(&self, index: usize) -> f32 {
        self.params.get_by_index(index)
    }

    fn set_param(&mut self, index: usize, value: f32) {
        self.params.set_by_index(index, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_engine() -> ReverbEngine {
        let mut engine = ReverbEngine::new();
        engine.initialize(48000.0, 512).unwrap();
        engine
    }

    #[test]
    fn test_initialize_validates_ranges() {
        let mut engine = ReverbEngine::new();
        assert_eq!(
            engine.initialize(22_050.0, 512),
            Err(InitError::SampleRateOutOfRange(22_050.0))
        );
        assert_eq!(
            engine.initialize(192_000.0, 512),
            Err(InitError::SampleRateOutOfRange(192_000.0))
        );
        assert_eq!(engine.initialize(48_000.0, 0), Err(InitError::InvalidBlockSize));
        assert!(!engine.is_initialized());

        assert!(engine.initialize(48_000.0, 512).is_ok());
        assert!(engine.is_initialized());

        // Idempotent reconfiguration.
        assert!(engine.initialize(96_000.0, 1024).is_ok());
        assert_eq!(engine.sample_rate(), 96_000.0);
        assert_eq!(engine.max_block_size(), 1024);
    }

    #[test]
    fn test_uninitialized_passes_through() {
        let mut engine = ReverbEngine::new();
        let input: Vec<f32> = (0..64).map(|i| (i as f32 * 0.1).sin()).collect();
        let mut output = vec![0.0f32; 64];
        engine.process_block(&[&input], &mut [&mut output]);
        assert_eq!(input, output);
    }

    #[test]
    fn test_zero_samples_returns_immediately() {
        let mut engine = init_engine();
        let input: Vec<f32> = Vec::new();
        let mut output: Vec<f32> = Vec::new();
        engine.process_block(&[&input], &mut [&mut output]);
    }

    #[test]
    fn test_oversized_block_passes_through() {
        let mut engine = init_engine();
        let input = vec![0.25f32; 4096];
        let mut output = vec![0.0f32; 4096];
        engine.process_block(&[&input], &mut [&mut output]);
        assert_eq!(input, output);
    }

    #[test]
    fn test_bypass_is_bit_exact() {
        let mut engine = init_engine();
        engine.parameter_bus().set_bypass(true);

        let left: Vec<f32> = (0..512).map(|i| (i as f32 * 0.013).sin() * 0.5).collect();
        let right: Vec<f32> = left.iter().map(|x| -x).collect();
        let mut out_l = vec![0.0f32; 512];
        let mut out_r = vec![0.0f32; 512];
        engine.process_block(&[&left, &right], &mut [&mut out_l, &mut out_r]);

        assert_eq!(left, out_l);
        assert_eq!(right, out_r);
        assert_eq!(engine.cpu_usage(), 0.0);
    }

    #[test]
    fn test_bypass_release_flushes_tail() {
        let mut engine = init_engine();
        engine.parameter_bus().set_wet_dry_mix(100.0);

        // Excite the tail.
        let mut impulse = vec![0.0f32; 512];
        impulse[0] = 1.0;
        let mut out = vec![0.0f32; 512];
        engine.process_block(&[&impulse], &mut [&mut out]);

        // Bypass, then release: the old tail must not resume.
        engine.parameter_bus().set_bypass(true);
        let silence = vec![0.0f32; 512];
        engine.process_block(&[&silence], &mut [&mut out]);
        engine.parameter_bus().set_bypass(false);
        engine.process_block(&[&silence], &mut [&mut out]);

        let energy: f32 = out.iter().map(|x| x * x).sum();
        assert!(energy < 1e-9, "tail should be flushed after bypass, got {energy}");
    }

    #[test]
    fn test_wet_signal_appears() {
        let mut engine = init_engine();
        engine.parameter_bus().set_wet_dry_mix(100.0);
        engine.parameter_bus().set_pre_delay(0.0);

        let mut impulse = vec![0.0f32; 512];
        impulse[0] = 1.0;
        let mut out = vec![0.0f32; 512];
        engine.process_block(&[&impulse], &mut [&mut out]);

        let silence = vec![0.0f32; 512];
        let mut energy = 0.0f32;
        for _ in 0..32 {
            engine.process_block(&[&silence], &mut [&mut out]);
            energy += out.iter().map(|x| x * x).sum::<f32>();
        }
        assert!(energy > 1e-6, "wet tail should ring, got {energy}");
    }

    #[test]
    fn test_stereo_output_differs_from_dry_when_wet() {
        let mut engine = init_engine();
        engine.parameter_bus().set_wet_dry_mix(50.0);
        engine.parameter_bus().set_pre_delay(0.0);

        let left: Vec<f32> = (0..512).map(|i| (i as f32 * 0.05).sin() * 0.3).collect();
        let right = left.clone();
        let mut out_l = vec![0.0f32; 512];
        let mut out_r = vec![0.0f32; 512];
        for _ in 0..16 {
            engine.process_block(&[&left, &right], &mut [&mut out_l, &mut out_r]);
        }
        let diff: f32 = out_l
            .iter()
            .zip(left.iter())
            .map(|(o, i)| (o - i).abs())
            .sum();
        assert!(diff > 1e-3, "wet blend should alter the signal");
    }

    #[test]
    fn test_cpu_usage_is_tracked() {
        let mut engine = init_engine();
        let input = vec![0.1f32; 512];
        let mut output = vec![0.0f32; 512];
        engine.process_block(&[&input], &mut [&mut output]);
        let usage = engine.cpu_usage();
        assert!(usage >= 0.0 && usage.is_finite());
    }

    #[test]
    fn test_reset_after_initialize_is_noop() {
        let mut engine = init_engine();
        engine.reset();

        let silence = vec![0.0f32; 512];
        let mut out = vec![1.0f32; 512];
        engine.process_block(&[&silence], &mut [&mut out]);
        assert!(out.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_parameter_info_surface() {
        let mut engine = init_engine();
        assert_eq!(engine.param_count(), PARAM_COUNT);

        let idx = engine.find_param_by_name("Room Size").unwrap();
        engine.set_param(idx, 0.9);
        assert!((engine.get_param(idx) - 0.9).abs() < 1e-6);

        // Clamps at descriptor bounds.
        engine.set_param(idx, 7.0);
        assert_eq!(engine.get_param(idx), 1.0);
    }

    #[test]
    fn test_preset_via_engine() {
        let engine = init_engine();
        engine.apply_preset(Preset::Cathedral);
        assert_eq!(engine.preset(), Preset::Cathedral);
        assert_eq!(engine.parameter_bus().decay_time(), 2.8);
    }

    #[test]
    fn test_configuration_report() {
        let engine = init_engine();
        let report = engine.configuration();
        assert!(report.contains("Delay Lines: 8"));
        assert!(report.contains("Matrix Size: 8x8"));
        assert!(report.contains("Orthogonality: Yes"));
        assert!(report.contains("Line 0:"));
    }

    #[test]
    fn test_output_gain_scales_output() {
        let mut quiet = init_engine();
        let mut loud = init_engine();
        quiet.parameter_bus().set_output_gain(-12.0);
        loud.parameter_bus().set_output_gain(12.0);
        quiet.parameter_bus().set_wet_dry_mix(0.0);
        loud.parameter_bus().set_wet_dry_mix(0.0);

        let input = vec![0.5f32; 512];
        let mut out_q = vec![0.0f32; 512];
        let mut out_l = vec![0.0f32; 512];
        // Let the gain smoothers settle.
        for _ in 0..40 {
            quiet.process_block(&[&input], &mut [&mut out_q]);
            loud.process_block(&[&input], &mut [&mut out_l]);
        }
        assert!(out_q[511] < 0.2);
        assert!(out_l[511] > 1.5);
    }
}
