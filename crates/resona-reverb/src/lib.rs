//! Resona Reverb - algorithmic reverberation engine
//!
//! A Feedback Delay Network (FDN) reverb for real-time audio: early
//! reflection and diffusion all-pass chains in front of an 8-line FDN with
//! an orthogonal Householder feedback matrix, two-band damping inside the
//! loop, and cross-feed / stereo-spread / tone shaping around it. Parameter
//! changes travel from control threads to the audio thread through a
//! lock-free atomic bus and per-parameter smoothers.
//!
//! # Quick Start
//!
//! ```rust
//! use resona_reverb::{ReverbEngine, Preset};
//!
//! let mut engine = ReverbEngine::new();
//! engine.initialize(48000.0, 512).unwrap();
//! engine.apply_preset(Preset::Studio);
//!
//! let input = vec![0.0f32; 512];
//! let mut out_l = vec![0.0f32; 512];
//! let mut out_r = vec![0.0f32; 512];
//! engine.process_block(&[&input, &input], &mut [&mut out_l, &mut out_r]);
//! ```
//!
//! # Threading
//!
//! The engine itself is owned and mutated by the audio thread only. Control
//! threads hold a clone of [`ParameterBus`] (via
//! [`ReverbEngine::parameter_bus`]) and write targets through relaxed
//! atomics; the audio thread snapshots the bus once per block and lets the
//! smoothers absorb the transitions. Nothing on the audio path locks,
//! blocks, or allocates.

pub mod calibration;
pub mod crossfeed;
pub mod damping;
pub mod diffusion;
pub mod early;
pub mod engine;
pub mod fdn;
pub mod matrix;
pub mod mod_delay;
pub mod params;
pub mod spread;
pub mod tone;

pub use calibration::measure_rt60;
pub use crossfeed::CrossFeedProcessor;
pub use damping::DampingFilter;
pub use diffusion::DiffusionChain;
pub use early::EarlyReflections;
pub use engine::{InitError, ReverbEngine};
pub use fdn::{FdnReverb, MAX_DELAY_LENGTH};
pub use matrix::FeedbackMatrix;
pub use mod_delay::ModulatedDelay;
pub use params::{ParameterBus, Preset};
pub use spread::StereoSpreadProcessor;
pub use tone::ToneFilter;
