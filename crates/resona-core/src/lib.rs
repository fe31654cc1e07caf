//! Resona Core - DSP primitives for the reverberation engine
//!
//! This crate provides the foundational building blocks the reverb is
//! assembled from:
//!
//! - [`Effect`] trait for stereo-first sample and block processing
//! - [`DelayLine`] fractional delay with a stored tap position
//! - [`AllPassFilter`] Schroeder all-pass for diffusion
//! - [`Biquad`] second-order IIR filter with RBJ coefficient helpers
//! - [`SmoothedParam`], [`SCurveSmoothedParam`] and [`LogSmoothedParam`]
//!   for zipper-free parameter changes
//! - [`DcBlocker`] for wet-bus DC and denormal hygiene
//! - [`ParamDescriptor`] / [`ParameterInfo`] for parameter introspection
//!
//! ## no_std Support
//!
//! This crate is `no_std` compatible. Use `default-features = false` in your
//! `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! resona-core = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod allpass;
pub mod biquad;
pub mod dc_blocker;
pub mod delay;
pub mod effect;
pub mod math;
pub mod param;
pub mod param_info;

// Re-export main types at crate root
pub use allpass::AllPassFilter;
pub use biquad::{Biquad, highpass_coefficients, lowpass_coefficients};
pub use dc_blocker::DcBlocker;
pub use delay::DelayLine;
pub use effect::Effect;
pub use math::{
    db_to_linear, deinterleave_stereo, flush_denormal, interleave_stereo, linear_to_db,
    mono_sum, ms_to_samples, samples_to_ms, wet_dry_mix, wet_dry_mix_stereo,
};
pub use param::{LogSmoothedParam, SCurveSmoothedParam, SmoothedParam};
pub use param_info::{ParamDescriptor, ParamUnit, ParameterInfo};
