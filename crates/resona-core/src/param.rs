//! Parameter smoothing for zipper-free changes.
//!
//! Audio parameters need smooth transitions to avoid audible "zipper noise"
//! when values change. Three smoothing flavours are provided:
//!
//! - [`SmoothedParam`] — exponential (one-pole lowpass); the default for
//!   most parameters
//! - [`SCurveSmoothedParam`] — smoothstep-shaped progress; natural feel for
//!   user-dragged controls
//! - [`LogSmoothedParam`] — smooths in log-amplitude space so gain fades
//!   sound linear in perceived loudness
//!
//! Each smoother can skip smoothing entirely for sub-audible moves via
//! [`SmoothedParam::set_target_snapped`] and friends; spending samples on
//! inaudible motion is wasted CPU.

use libm::{expf, logf};

/// A parameter with exponential smoothing.
///
/// One-pole lowpass towards the target:
///
/// ```text
/// c <- c + k * (t - c),   k = 1 - exp(-1 / (tau * fs))
/// ```
///
/// # Usage
///
/// ```rust
/// use resona_core::SmoothedParam;
///
/// let mut gain = SmoothedParam::with_config(1.0, 48000.0, 30.0);
/// gain.set_target(0.5);
/// for _ in 0..480 {
///     let smoothed = gain.advance();
///     // use smoothed value...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SmoothedParam {
    /// Current smoothed value
    current: f32,
    /// Target value we're smoothing towards
    target: f32,
    /// Smoothing coefficient (1 = instant)
    coeff: f32,
    /// Sample rate in Hz
    sample_rate: f32,
    /// Smoothing time constant in milliseconds
    smoothing_time_ms: f32,
}

impl SmoothedParam {
    /// Create a new smoothed parameter with initial value and no smoothing.
    pub fn new(initial: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            coeff: 1.0,
            sample_rate: 44100.0,
            smoothing_time_ms: 0.0,
        }
    }

    /// Create a smoothed parameter with full configuration.
    pub fn with_config(initial: f32, sample_rate: f32, smoothing_time_ms: f32) -> Self {
        let mut param = Self::new(initial);
        param.sample_rate = sample_rate;
        param.smoothing_time_ms = smoothing_time_ms;
        param.recalculate_coeff();
        param
    }

    /// Set the target value; the current value converges exponentially.
    #[inline]
    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Set the target, snapping immediately when the move is smaller than
    /// `threshold` (sub-audible changes need no smoothing).
    #[inline]
    pub fn set_target_snapped(&mut self, target: f32, threshold: f32) {
        if (target - self.current).abs() < threshold {
            self.set_immediate(target);
        } else {
            self.target = target;
        }
    }

    /// Set target and current at once (no smoothing).
    #[inline]
    pub fn set_immediate(&mut self, value: f32) {
        self.target = value;
        self.current = value;
    }

    /// Update sample rate and recalculate the smoothing coefficient.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.recalculate_coeff();
    }

    /// Set the smoothing time constant in milliseconds.
    pub fn set_smoothing_time_ms(&mut self, time_ms: f32) {
        self.smoothing_time_ms = time_ms;
        self.recalculate_coeff();
    }

    /// Advance by one sample and return the new smoothed value.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        self.current += self.coeff * (self.target - self.current);
        self.current
    }

    /// Advance by `n` samples at once using the closed form
    /// `c = t + (c - t) * (1 - k)^n`. Used by block-rate parameters.
    pub fn advance_by(&mut self, n: usize) -> f32 {
        if n > 0 {
            let remain = libm::powf(1.0 - self.coeff, n as f32);
            self.current = self.target + (self.current - self.target) * remain;
        }
        self.current
    }

    /// Current smoothed value without advancing.
    #[inline]
    pub fn get(&self) -> f32 {
        self.current
    }

    /// Target value.
    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Whether the parameter has reached its target (within epsilon).
    #[inline]
    pub fn is_settled(&self) -> bool {
        (self.current - self.target).abs() < 1e-6
    }

    /// Jump to the target immediately.
    #[inline]
    pub fn snap_to_target(&mut self) {
        self.current = self.target;
    }

    /// The coefficient derivation: a one-pole with pole `(1 - k)` reaches
    /// 63.2% of the target after one time constant `tau`, so
    /// `k = 1 - exp(-1 / (tau * fs))`. A zero time constant disables
    /// smoothing (k = 1).
    fn recalculate_coeff(&mut self) {
        if self.smoothing_time_ms <= 0.0 || self.sample_rate <= 0.0 {
            self.coeff = 1.0;
        } else {
            let samples = self.smoothing_time_ms / 1000.0 * self.sample_rate;
            self.coeff = 1.0 - expf(-1.0 / samples);
        }
    }
}

impl Default for SmoothedParam {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// A parameter smoothed along an S-curve.
///
/// A progress counter runs from 0 to 1 over the configured time; the
/// smoothstep polynomial `3t^2 - 2t^3` shapes each increment, giving a
/// gentle start and landing. Feels more natural than exponential smoothing
/// for parameters a user drags by hand.
#[derive(Debug, Clone)]
pub struct SCurveSmoothedParam {
    current: f32,
    target: f32,
    /// Progress through the transition, [0, 1]
    phase: f32,
    /// Progress increment per sample
    delta: f32,
    sample_rate: f32,
    smoothing_time_ms: f32,
}

impl SCurveSmoothedParam {
    /// Create with full configuration.
    pub fn with_config(initial: f32, sample_rate: f32, smoothing_time_ms: f32) -> Self {
        let mut param = Self {
            current: initial,
            target: initial,
            phase: 1.0,
            delta: 0.0,
            sample_rate,
            smoothing_time_ms,
        };
        param.recalculate_delta();
        param
    }

    /// Set a new target and restart the S-curve.
    pub fn set_target(&mut self, target: f32) {
        if (target - self.target).abs() > 1e-9 {
            self.target = target;
            self.phase = 0.0;
        }
    }

    /// Set the target, snapping when the move is below `threshold`.
    pub fn set_target_snapped(&mut self, target: f32, threshold: f32) {
        if (target - self.current).abs() < threshold {
            self.set_immediate(target);
        } else {
            self.set_target(target);
        }
    }

    /// Set target and current at once (no smoothing).
    pub fn set_immediate(&mut self, value: f32) {
        self.current = value;
        self.target = value;
        self.phase = 1.0;
    }

    /// Update the sample rate.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.recalculate_delta();
    }

    /// Set the transition time in milliseconds.
    pub fn set_smoothing_time_ms(&mut self, time_ms: f32) {
        self.smoothing_time_ms = time_ms;
        self.recalculate_delta();
    }

    /// Advance by one sample and return the new value.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        if self.phase < 1.0 {
            let t = self.phase;
            let smooth_step = t * t * (3.0 - 2.0 * t);
            self.current += (self.target - self.current) * smooth_step.max(self.delta);
            self.phase += self.delta;
            if self.phase >= 1.0 {
                self.current = self.target;
            }
        }
        self.current
    }

    /// Advance by `n` samples.
    pub fn advance_by(&mut self, n: usize) -> f32 {
        for _ in 0..n {
            if self.phase >= 1.0 {
                break;
            }
            self.advance();
        }
        self.current
    }

    /// Current value without advancing.
    #[inline]
    pub fn get(&self) -> f32 {
        self.current
    }

    /// Target value.
    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Whether the transition has completed.
    #[inline]
    pub fn is_settled(&self) -> bool {
        self.phase >= 1.0
    }

    fn recalculate_delta(&mut self) {
        if self.smoothing_time_ms <= 0.0 || self.sample_rate <= 0.0 {
            self.delta = 1.0;
        } else {
            self.delta = 1000.0 / (self.smoothing_time_ms * self.sample_rate);
        }
    }
}

/// A parameter smoothed in log-amplitude space.
///
/// Exponential smoothing applied to `ln(value)`, so a fade between two
/// gains moves at a constant rate in decibels — perceptually linear. Falls
/// back to plain exponential smoothing when either endpoint is not strictly
/// positive.
#[derive(Debug, Clone)]
pub struct LogSmoothedParam {
    current: f32,
    target: f32,
    /// Pole of the one-pole smoother, `exp(-1 / (tau * fs))`
    pole: f32,
    sample_rate: f32,
    smoothing_time_ms: f32,
}

impl LogSmoothedParam {
    /// Create with full configuration.
    pub fn with_config(initial: f32, sample_rate: f32, smoothing_time_ms: f32) -> Self {
        let mut param = Self {
            current: initial,
            target: initial,
            pole: 0.0,
            sample_rate,
            smoothing_time_ms,
        };
        param.recalculate_pole();
        param
    }

    /// Set the target value.
    #[inline]
    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Set the target, snapping when the move is below `threshold`.
    #[inline]
    pub fn set_target_snapped(&mut self, target: f32, threshold: f32) {
        if (target - self.current).abs() < threshold {
            self.set_immediate(target);
        } else {
            self.target = target;
        }
    }

    /// Set target and current at once (no smoothing).
    #[inline]
    pub fn set_immediate(&mut self, value: f32) {
        self.current = value;
        self.target = value;
    }

    /// Update the sample rate.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.recalculate_pole();
    }

    /// Set the smoothing time constant in milliseconds.
    pub fn set_smoothing_time_ms(&mut self, time_ms: f32) {
        self.smoothing_time_ms = time_ms;
        self.recalculate_pole();
    }

    /// Advance by one sample and return the new value.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        if self.target > 0.0 && self.current > 0.0 {
            let log_current = logf(self.current);
            let log_target = logf(self.target);
            let log_next = log_current * self.pole + log_target * (1.0 - self.pole);
            self.current = expf(log_next);
        } else {
            self.current += (1.0 - self.pole) * (self.target - self.current);
        }
        self.current
    }

    /// Advance by `n` samples using the log-domain closed form.
    pub fn advance_by(&mut self, n: usize) -> f32 {
        if n == 0 {
            return self.current;
        }
        if self.target > 0.0 && self.current > 0.0 {
            let remain = libm::powf(self.pole, n as f32);
            let log_next =
                logf(self.target) + (logf(self.current) - logf(self.target)) * remain;
            self.current = expf(log_next);
        } else {
            let remain = libm::powf(self.pole, n as f32);
            self.current = self.target + (self.current - self.target) * remain;
        }
        self.current
    }

    /// Current value without advancing.
    #[inline]
    pub fn get(&self) -> f32 {
        self.current
    }

    /// Target value.
    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    fn recalculate_pole(&mut self) {
        if self.smoothing_time_ms <= 0.0 || self.sample_rate <= 0.0 {
            self.pole = 0.0;
        } else {
            let samples = self.smoothing_time_ms / 1000.0 * self.sample_rate;
            self.pole = expf(-1.0 / samples);
        }
    }
}
