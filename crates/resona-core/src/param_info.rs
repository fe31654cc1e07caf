//! Parameter introspection for discoverable engine parameters.
//!
//! [`ParamDescriptor`] captures the unit, range and default of one exposed
//! parameter; [`ParameterInfo`] lets hosts and tests enumerate and drive
//! parameters by index without knowing the engine's field layout.
//!
//! Fully `no_std` compatible, no heap allocations.

/// Trait for components that expose introspectable parameters.
///
/// Parameters are accessed by zero-based index, stable for the lifetime of
/// the instance. Out-of-range reads return `0.0`; out-of-range writes are
/// ignored; in-range writes clamp to the descriptor range.
pub trait ParameterInfo {
    /// Number of exposed parameters. Valid indices are `0..param_count()`.
    fn param_count(&self) -> usize;

    /// Descriptor for the parameter at `index`, `None` when out of range.
    fn param_info(&self, index: usize) -> Option<ParamDescriptor>;

    /// Current value of the parameter at `index`.
    fn get_param(&self, index: usize) -> f32;

    /// Set the parameter at `index`, clamping to its valid range.
    fn set_param(&mut self, index: usize, value: f32);

    /// Find a parameter index by name (case-insensitive), matching both the
    /// full and the short name.
    fn find_param_by_name(&self, name: &str) -> Option<usize> {
        (0..self.param_count()).find(|&i| {
            self.param_info(i).is_some_and(|desc| {
                desc.name.eq_ignore_ascii_case(name)
                    || desc.short_name.eq_ignore_ascii_case(name)
            })
        })
    }
}

/// Describes a single parameter's metadata for display and validation.
///
/// `short_name` should be 8 characters or less for hardware displays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamDescriptor {
    /// Full parameter name for display (e.g., "Room Size").
    pub name: &'static str,

    /// Short name for hardware displays, max 8 characters.
    pub short_name: &'static str,

    /// Unit type for formatting the parameter value.
    pub unit: ParamUnit,

    /// Minimum allowed value.
    pub min: f32,

    /// Maximum allowed value.
    pub max: f32,

    /// Default value.
    pub default: f32,

    /// Recommended step increment for encoder-based control.
    pub step: f32,
}

impl ParamDescriptor {
    /// Percent parameter with custom name and default (0-100%).
    pub const fn percent(name: &'static str, short_name: &'static str, default: f32) -> Self {
        Self {
            name,
            short_name,
            unit: ParamUnit::Percent,
            min: 0.0,
            max: 100.0,
            default,
            step: 1.0,
        }
    }

    /// Normalised parameter in an arbitrary unitless range.
    pub const fn unitless(
        name: &'static str,
        short_name: &'static str,
        min: f32,
        max: f32,
        default: f32,
    ) -> Self {
        Self {
            name,
            short_name,
            unit: ParamUnit::None,
            min,
            max,
            default,
            step: 0.01,
        }
    }

    /// Time parameter in milliseconds.
    pub const fn time_ms(
        name: &'static str,
        short_name: &'static str,
        min: f32,
        max: f32,
        default: f32,
    ) -> Self {
        Self {
            name,
            short_name,
            unit: ParamUnit::Milliseconds,
            min,
            max,
            default,
            step: 1.0,
        }
    }

    /// Time parameter in seconds.
    pub const fn time_s(
        name: &'static str,
        short_name: &'static str,
        min: f32,
        max: f32,
        default: f32,
    ) -> Self {
        Self {
            name,
            short_name,
            unit: ParamUnit::Seconds,
            min,
            max,
            default,
            step: 0.1,
        }
    }

    /// Frequency parameter in Hz.
    pub const fn freq_hz(
        name: &'static str,
        short_name: &'static str,
        min: f32,
        max: f32,
        default: f32,
    ) -> Self {
        Self {
            name,
            short_name,
            unit: ParamUnit::Hertz,
            min,
            max,
            default,
            step: 1.0,
        }
    }

    /// Gain parameter in decibels.
    pub const fn gain_db(
        name: &'static str,
        short_name: &'static str,
        min: f32,
        max: f32,
        default: f32,
    ) -> Self {
        Self {
            name,
            short_name,
            unit: ParamUnit::Decibels,
            min,
            max,
            default,
            step: 0.5,
        }
    }

    /// Clamps a value to this parameter's valid range.
    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        if value < self.min {
            self.min
        } else if value > self.max {
            self.max
        } else {
            value
        }
    }
}

/// Unit type for parameter display and formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamUnit {
    /// Decibels (dB) - gain and level parameters.
    Decibels,
    /// Hertz (Hz) - frequency parameters.
    Hertz,
    /// Milliseconds (ms) - short time parameters.
    Milliseconds,
    /// Seconds (s) - long time parameters (decay).
    Seconds,
    /// Percentage (%) - mix and normalized parameters.
    Percent,
    /// No unit - dimensionless parameters.
    None,
}

impl ParamUnit {
    /// Returns the unit suffix string for display.
    pub const fn suffix(&self) -> &'static str {
        match self {
            ParamUnit::Decibels => " dB",
            ParamUnit::Hertz => " Hz",
            ParamUnit::Milliseconds => " ms",
            ParamUnit::Seconds => " s",
            ParamUnit::Percent => "%",
            ParamUnit::None => "",
        }
    }
}
