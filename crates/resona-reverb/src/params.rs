//! Lock-free parameter transport between control threads and the audio
//! thread.
//!
//! Every externally mutable parameter is one atomic cell of its scalar
//! type, written with relaxed ordering: the audio thread only needs to
//! eventually observe the latest value, and each per-parameter smoother
//! absorbs the transient. Consistency *between* parameters is not required,
//! so no locks appear anywhere near the audio path.
//!
//! Values are stored in their descriptor units (percent, seconds, ms, Hz);
//! setters clamp silently at the range endpoints. Getters expose the
//! *targets* — the most recently written values — for observability.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use resona_core::ParamDescriptor;

/// An `f32` stored as atomic bits.
#[derive(Debug)]
struct AtomicF32 {
    bits: AtomicU32,
}

impl AtomicF32 {
    fn new(value: f32) -> Self {
        Self {
            bits: AtomicU32::new(value.to_bits()),
        }
    }

    #[inline]
    fn load(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }

    #[inline]
    fn store(&self, value: f32) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }
}

/// Parameter indices, stable across the engine's lifetime.
pub mod index {
    pub const WET_DRY_MIX: usize = 0;
    pub const DECAY_TIME: usize = 1;
    pub const PRE_DELAY: usize = 2;
    pub const CROSS_FEED: usize = 3;
    pub const ROOM_SIZE: usize = 4;
    pub const DENSITY: usize = 5;
    pub const HF_DAMPING: usize = 6;
    pub const LF_DAMPING: usize = 7;
    pub const STEREO_WIDTH: usize = 8;
    pub const PHASE_INVERT: usize = 9;
    pub const HIGH_CUT_FREQ: usize = 10;
    pub const LOW_CUT_FREQ: usize = 11;
    pub const BYPASS: usize = 12;
    pub const CROSS_DELAY: usize = 13;
    pub const INPUT_GAIN: usize = 14;
    pub const OUTPUT_GAIN: usize = 15;
}

/// Number of exposed parameters.
pub const PARAM_COUNT: usize = 16;

/// Descriptor for the parameter at `idx`, `None` when out of range.
pub fn descriptor(idx: usize) -> Option<ParamDescriptor> {
    match idx {
        index::WET_DRY_MIX => Some(ParamDescriptor::percent("Wet/Dry Mix", "Mix", 35.0)),
        index::DECAY_TIME => Some(ParamDescriptor::time_s("Decay Time", "Decay", 0.1, 8.0, 2.0)),
        index::PRE_DELAY => Some(ParamDescriptor::time_ms("Pre-Delay", "PreDly", 0.0, 200.0, 75.0)),
        index::CROSS_FEED => Some(ParamDescriptor::unitless("Cross-Feed", "XFeed", 0.0, 1.0, 0.5)),
        index::ROOM_SIZE => Some(ParamDescriptor::unitless("Room Size", "Size", 0.0, 1.0, 0.82)),
        index::DENSITY => Some(ParamDescriptor::percent("Density", "Density", 70.0)),
        index::HF_DAMPING => Some(ParamDescriptor::percent("HF Damping", "HFDamp", 50.0)),
        index::LF_DAMPING => Some(ParamDescriptor::percent("LF Damping", "LFDamp", 20.0)),
        index::STEREO_WIDTH => Some(ParamDescriptor::unitless("Stereo Width", "Width", 0.0, 2.0, 1.0)),
        index::PHASE_INVERT => Some(ParamDescriptor::unitless("Phase Invert", "PhInv", 0.0, 1.0, 0.0)),
        index::HIGH_CUT_FREQ => Some(ParamDescriptor::freq_hz("High Cut", "HiCut", 1_000.0, 20_000.0, 20_000.0)),
        index::LOW_CUT_FREQ => Some(ParamDescriptor::freq_hz("Low Cut", "LoCut", 20.0, 1_000.0, 20.0)),
        index::BYPASS => Some(ParamDescriptor::unitless("Bypass", "Bypass", 0.0, 1.0, 0.0)),
        index::CROSS_DELAY => Some(ParamDescriptor::time_ms("Cross-Feed Delay", "XDelay", 0.0, 50.0, 10.0)),
        index::INPUT_GAIN => Some(ParamDescriptor::gain_db("Input Gain", "InGain", -24.0, 24.0, 0.0)),
        index::OUTPUT_GAIN => Some(ParamDescriptor::gain_db("Output Gain", "OutGain", -24.0, 24.0, 0.0)),
        _ => None,
    }
}

/// Named preset configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preset {
    /// Dry passthrough; also engages bypass.
    Clean,
    /// Tight, short ambience.
    VocalBooth,
    /// Medium room for general production work.
    Studio,
    /// Long, dark, wide tail.
    Cathedral,
    /// Leaves the current targets untouched.
    #[default]
    Custom,
}

impl Preset {
    /// Preset for an index in {0..4}; out-of-range maps to `Custom`.
    pub fn from_index(index: u32) -> Self {
        match index {
            0 => Preset::Clean,
            1 => Preset::VocalBooth,
            2 => Preset::Studio,
            3 => Preset::Cathedral,
            _ => Preset::Custom,
        }
    }

    /// Stable index of this preset.
    pub fn index(self) -> u32 {
        match self {
            Preset::Clean => 0,
            Preset::VocalBooth => 1,
            Preset::Studio => 2,
            Preset::Cathedral => 3,
            Preset::Custom => 4,
        }
    }

    /// Target values `(wet_dry %, decay s, pre-delay ms, cross-feed,
    /// room size, density %, hf damping %)`, `None` for `Custom`.
    fn targets(self) -> Option<(f32, f32, f32, f32, f32, f32, f32)> {
        match self {
            Preset::Clean => Some((0.0, 0.1, 0.0, 0.0, 0.0, 0.0, 0.0)),
            Preset::VocalBooth => Some((18.0, 0.9, 8.0, 0.3, 0.35, 70.0, 30.0)),
            Preset::Studio => Some((40.0, 1.7, 15.0, 0.5, 0.60, 85.0, 45.0)),
            Preset::Cathedral => Some((65.0, 2.8, 25.0, 0.7, 0.85, 60.0, 60.0)),
            Preset::Custom => None,
        }
    }
}

/// Plain-value snapshot of the whole bus, taken once per block by the
/// audio thread to keep atomic traffic out of the inner loop.
#[derive(Debug, Clone, Copy)]
pub struct ParamSnapshot {
    pub wet_dry_mix: f32,
    pub decay_time: f32,
    pub pre_delay_ms: f32,
    pub cross_feed: f32,
    pub cross_delay_ms: f32,
    pub room_size: f32,
    pub density: f32,
    pub hf_damping: f32,
    pub lf_damping: f32,
    pub stereo_width: f32,
    pub high_cut_freq: f32,
    pub low_cut_freq: f32,
    pub input_gain_db: f32,
    pub output_gain_db: f32,
    pub phase_invert: bool,
    pub bypass: bool,
    pub high_cut_enabled: bool,
    pub low_cut_enabled: bool,
    pub spread_compensation: bool,
}

/// The atomic parameter registry.
///
/// Control threads write targets through the setters; the audio thread
/// reads them via [`snapshot`](Self::snapshot). All accesses are relaxed
/// atomics — non-blocking from both sides.
#[derive(Debug)]
pub struct ParameterBus {
    wet_dry_mix: AtomicF32,
    decay_time: AtomicF32,
    pre_delay_ms: AtomicF32,
    cross_feed: AtomicF32,
    cross_delay_ms: AtomicF32,
    room_size: AtomicF32,
    density: AtomicF32,
    hf_damping: AtomicF32,
    lf_damping: AtomicF32,
    stereo_width: AtomicF32,
    high_cut_freq: AtomicF32,
    low_cut_freq: AtomicF32,
    input_gain_db: AtomicF32,
    output_gain_db: AtomicF32,

    phase_invert: AtomicBool,
    bypass: AtomicBool,
    high_cut_enabled: AtomicBool,
    low_cut_enabled: AtomicBool,
    spread_compensation: AtomicBool,

    preset: AtomicU32,
    /// CPU meter, written by the audio thread, read by control threads.
    cpu_usage: AtomicF32,
}

impl ParameterBus {
    /// Create a bus seeded with every parameter's default.
    pub fn new() -> Self {
        let dflt = |idx: usize| descriptor(idx).map_or(0.0, |d| d.default);
        Self {
            wet_dry_mix: AtomicF32::new(dflt(index::WET_DRY_MIX)),
            decay_time: AtomicF32::new(dflt(index::DECAY_TIME)),
            pre_delay_ms: AtomicF32::new(dflt(index::PRE_DELAY)),
            cross_feed: AtomicF32::new(dflt(index::CROSS_FEED)),
            cross_delay_ms: AtomicF32::new(dflt(index::CROSS_DELAY)),
            room_size: AtomicF32::new(dflt(index::ROOM_SIZE)),
            density: AtomicF32::new(dflt(index::DENSITY)),
            hf_damping: AtomicF32::new(dflt(index::HF_DAMPING)),
            lf_damping: AtomicF32::new(dflt(index::LF_DAMPING)),
            stereo_width: AtomicF32::new(dflt(index::STEREO_WIDTH)),
            high_cut_freq: AtomicF32::new(dflt(index::HIGH_CUT_FREQ)),
            low_cut_freq: AtomicF32::new(dflt(index::LOW_CUT_FREQ)),
            input_gain_db: AtomicF32::new(dflt(index::INPUT_GAIN)),
            output_gain_db: AtomicF32::new(dflt(index::OUTPUT_GAIN)),
            phase_invert: AtomicBool::new(false),
            bypass: AtomicBool::new(false),
            high_cut_enabled: AtomicBool::new(false),
            low_cut_enabled: AtomicBool::new(false),
            spread_compensation: AtomicBool::new(true),
            preset: AtomicU32::new(Preset::default().index()),
            cpu_usage: AtomicF32::new(0.0),
        }
    }

    fn store_clamped(cell: &AtomicF32, idx: usize, value: f32) {
        let clamped = descriptor(idx).map_or(value, |d| d.clamp(value));
        cell.store(clamped);
    }

    /// Set the wet/dry mix in percent (0..100).
    pub fn set_wet_dry_mix(&self, percent: f32) {
        Self::store_clamped(&self.wet_dry_mix, index::WET_DRY_MIX, percent);
    }

    /// Set the decay time (RT60 target) in seconds (0.1..8.0).
    pub fn set_decay_time(&self, seconds: f32) {
        Self::store_clamped(&self.decay_time, index::DECAY_TIME, seconds);
    }

    /// Set the pre-delay in milliseconds (0..200).
    pub fn set_pre_delay(&self, ms: f32) {
        Self::store_clamped(&self.pre_delay_ms, index::PRE_DELAY, ms);
    }

    /// Set the cross-feed amount (0..1).
    pub fn set_cross_feed(&self, amount: f32) {
        Self::store_clamped(&self.cross_feed, index::CROSS_FEED, amount);
    }

    /// Set the cross-feed inter-channel delay in milliseconds (0..50).
    pub fn set_cross_delay(&self, ms: f32) {
        Self::store_clamped(&self.cross_delay_ms, index::CROSS_DELAY, ms);
    }

    /// Set the room size (0..1).
    pub fn set_room_size(&self, size: f32) {
        Self::store_clamped(&self.room_size, index::ROOM_SIZE, size);
    }

    /// Set the diffusion density in percent (0..100).
    pub fn set_density(&self, percent: f32) {
        Self::store_clamped(&self.density, index::DENSITY, percent);
    }

    /// Set high-frequency damping in percent (0..100).
    pub fn set_hf_damping(&self, percent: f32) {
        Self::store_clamped(&self.hf_damping, index::HF_DAMPING, percent);
    }

    /// Set low-frequency damping in percent (0..100).
    pub fn set_lf_damping(&self, percent: f32) {
        Self::store_clamped(&self.lf_damping, index::LF_DAMPING, percent);
    }

    /// Set the wet stereo width (0..2).
    pub fn set_stereo_width(&self, width: f32) {
        Self::store_clamped(&self.stereo_width, index::STEREO_WIDTH, width);
    }

    /// Set the high-cut frequency in Hz (1k..20k).
    pub fn set_high_cut_freq(&self, hz: f32) {
        Self::store_clamped(&self.high_cut_freq, index::HIGH_CUT_FREQ, hz);
    }

    /// Set the low-cut frequency in Hz (20..1k).
    pub fn set_low_cut_freq(&self, hz: f32) {
        Self::store_clamped(&self.low_cut_freq, index::LOW_CUT_FREQ, hz);
    }

    /// Set the input gain in dB (-24..24).
    pub fn set_input_gain(&self, db: f32) {
        Self::store_clamped(&self.input_gain_db, index::INPUT_GAIN, db);
    }

    /// Set the output gain in dB (-24..24).
    pub fn set_output_gain(&self, db: f32) {
        Self::store_clamped(&self.output_gain_db, index::OUTPUT_GAIN, db);
    }

    /// Set phase inversion on the cross-feed R->L path.
    pub fn set_phase_invert(&self, invert: bool) {
        self.phase_invert.store(invert, Ordering::Relaxed);
    }

    /// Engage or release the engine bypass.
    pub fn set_bypass(&self, bypass: bool) {
        self.bypass.store(bypass, Ordering::Relaxed);
    }

    /// Enable the high-cut tone filter.
    pub fn set_high_cut_enabled(&self, enabled: bool) {
        self.high_cut_enabled.store(enabled, Ordering::Relaxed);
    }

    /// Enable the low-cut tone filter.
    pub fn set_low_cut_enabled(&self, enabled: bool) {
        self.low_cut_enabled.store(enabled, Ordering::Relaxed);
    }

    /// Enable mid-gain compensation in the spread stage.
    pub fn set_spread_compensation(&self, enabled: bool) {
        self.spread_compensation.store(enabled, Ordering::Relaxed);
    }

    // Target getters (observability: the most recently written values).

    pub fn wet_dry_mix(&self) -> f32 {
        self.wet_dry_mix.load()
    }

    pub fn decay_time(&self) -> f32 {
        self.decay_time.load()
    }

    pub fn pre_delay(&self) -> f32 {
        self.pre_delay_ms.load()
    }

    pub fn cross_feed(&self) -> f32 {
        self.cross_feed.load()
    }

    pub fn cross_delay(&self) -> f32 {
        self.cross_delay_ms.load()
    }

    pub fn room_size(&self) -> f32 {
        self.room_size.load()
    }

    pub fn density(&self) -> f32 {
        self.density.load()
    }

    pub fn hf_damping(&self) -> f32 {
        self.hf_damping.load()
    }

    pub fn lf_damping(&self) -> f32 {
        self.lf_damping.load()
    }

    pub fn stereo_width(&self) -> f32 {
        self.stereo_width.load()
    }

    pub fn high_cut_freq(&self) -> f32 {
        self.high_cut_freq.load()
    }

    pub fn low_cut_freq(&self) -> f32 {
        self.low_cut_freq.load()
    }

    pub fn input_gain(&self) -> f32 {
        self.input_gain_db.load()
    }

    pub fn output_gain(&self) -> f32 {
        self.output_gain_db.load()
    }

    pub fn phase_invert(&self) -> bool {
        self.phase_invert.load(Ordering::Relaxed)
    }

    pub fn bypass(&self) -> bool {
        self.bypass.load(Ordering::Relaxed)
    }

    pub fn high_cut_enabled(&self) -> bool {
        self.high_cut_enabled.load(Ordering::Relaxed)
    }

    pub fn low_cut_enabled(&self) -> bool {
        self.low_cut_enabled.load(Ordering::Relaxed)
    }

    pub fn spread_compensation(&self) -> bool {
        self.spread_compensation.load(Ordering::Relaxed)
    }

    /// Current preset.
    pub fn preset(&self) -> Preset {
        Preset::from_index(self.preset.load(Ordering::Relaxed))
    }

    /// CPU usage of the last processed block, in percent of the block
    /// duration. Written by the audio thread.
    pub fn cpu_usage(&self) -> f32 {
        self.cpu_usage.load()
    }

    pub(crate) fn store_cpu_usage(&self, percent: f32) {
        self.cpu_usage.store(percent);
    }

    /// Write a preset's targets. Non-destructive: DSP state is untouched;
    /// the smoothers carry the engine to the new targets. `Clean` also
    /// engages bypass, every other preset releases it.
    pub fn apply_preset(&self, preset: Preset) {
        if let Some((wet, decay, pre, cross, size, density, hf)) = preset.targets() {
            self.set_wet_dry_mix(wet);
            self.set_decay_time(decay);
            self.set_pre_delay(pre);
            self.set_cross_feed(cross);
            self.set_room_size(size);
            self.set_density(density);
            self.set_hf_damping(hf);
        }
        self.set_bypass(preset == Preset::Clean);
        self.preset.store(preset.index(), Ordering::Relaxed);
    }

    /// Snapshot every target into a plain struct.
    pub fn snapshot(&self) -> ParamSnapshot {
        ParamSnapshot {
            wet_dry_mix: self.wet_dry_mix(),
            decay_time: self.decay_time(),
            pre_delay_ms: self.pre_delay(),
            cross_feed: self.cross_feed(),
            cross_delay_ms: self.cross_delay(),
            room_size: self.room_size(),
            density: self.density(),
            hf_damping: self.hf_damping(),
            lf_damping: self.lf_damping(),
            stereo_width: self.stereo_width(),
            high_cut_freq: self.high_cut_freq(),
            low_cut_freq: self.low_cut_freq(),
            input_gain_db: self.input_gain(),
            output_gain_db: self.output_gain(),
            phase_invert: self.phase_invert(),
            bypass: self.bypass(),
            high_cut_enabled: self.high_cut_enabled(),
            low_cut_enabled: self.low_cut_enabled(),
            spread_compensation: self.spread_compensation(),
        }
    }

    /// Set a parameter by its stable index (descriptor units; booleans take
    /// 0.0 / 1.0). Out-of-range indices are ignored.
    pub fn set_by_index(&self, idx: usize, value: f32) {
        match idx {
            index::WET_DRY_MIX => self.set_wet_dry_mix(value),
            index::DECAY_TIME => self.set_decay_time(value),
            index::PRE_DELAY => self.set_pre_delay(value),
            index::CROSS_FEED => self.set_cross_feed(value),
            index::ROOM_SIZE => self.set_room_size(value),
            index::DENSITY => self.set_density(value),
            index::HF_DAMPING => self.set_hf_damping(value),
            index::LF_DAMPING => self.set_lf_damping(value),
            index::STEREO_WIDTH => self.set_stereo_width(value),
            index::PHASE_INVERT => self.set_phase_invert(value >= 0.5),
            index::HIGH_CUT_FREQ => self.set_high_cut_freq(value),
            index::LOW_CUT_FREQ => self.set_low_cut_freq(value),
            index::BYPASS => self.set_bypass(value >= 0.5),
            index::CROSS_DELAY => self.set_cross_delay(value),
            index::INPUT_GAIN => self.set_input_gain(value),
            index::OUTPUT_GAIN => self.set_output_gain(value),
            _ => {}
        }
    }

    /// Read a parameter target by its stable index.
    pub fn get_by_index(&self, idx: usize) -> f32 {
        match idx {
            index::WET_DRY_MIX => self.wet_dry_mix(),
            index::DECAY_TIME => self.decay_time(),
            index::PRE_DELAY => self.pre_delay(),
            index::CROSS_FEED => self.cross_feed(),
            index::ROOM_SIZE => self.room_size(),
            index::DENSITY => self.density(),
            index::HF_DAMPING => self.hf_damping(),
            index::LF_DAMPING => self.lf_damping(),
            index::STEREO_WIDTH => self.stereo_width(),
            index::PHASE_INVERT => self.phase_invert() as u8 as f32,
            index::HIGH_CUT_FREQ => self.high_cut_freq(),
            index::LOW_CUT_FREQ => self.low_cut_freq(),
            index::BYPASS => self.bypass() as u8 as f32,
            index::CROSS_DELAY => self.cross_delay(),
            index::INPUT_GAIN => self.input_gain(),
            index::OUTPUT_GAIN => self.output_gain(),
            _ => 0.0,
        }
    }
}

impl Default for ParameterBus {
    fn default() -> Self {
        Self::new()
    }
}
