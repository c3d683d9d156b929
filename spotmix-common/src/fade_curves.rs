//! Fade curve selection for the closing fade-out of a spot
//!
//! The audio engine applies the fade itself; this module only names the
//! curve shape and maps it onto the engine's `afade` curve identifiers.

use serde::Deserialize;

/// Fade curve types for the outro fade
///
/// - Linear: Constant rate of change (precise, predictable)
/// - Exponential: Quadratic shape, v(t) = t²
/// - Logarithmic: Fast start, slow finish
/// - SCurve: Smooth acceleration and deceleration, 0.5 × (1 - cos(π × t))
/// - EqualPower: Quarter sine, constant perceived loudness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum FadeCurve {
    #[default]
    Linear,
    Exponential,
    Logarithmic,
    SCurve,
    EqualPower,
}

impl FadeCurve {
    /// Parse curve from a configuration string
    ///
    /// Supports:
    /// - 'linear'
    /// - 'exponential'
    /// - 'logarithmic'
    /// - 'cosine', 's_curve', 'scurve', 's-curve' (aliases for SCurve)
    /// - 'equal_power', 'equalpower' (aliases)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "linear" => Some(FadeCurve::Linear),
            "exponential" => Some(FadeCurve::Exponential),
            "logarithmic" => Some(FadeCurve::Logarithmic),
            "cosine" | "scurve" | "s-curve" | "s_curve" => Some(FadeCurve::SCurve),
            "equal_power" | "equalpower" => Some(FadeCurve::EqualPower),
            _ => None,
        }
    }

    /// Engine `afade` curve name
    ///
    /// Returns `None` for Linear, which is the engine's default (`tri`) and
    /// is therefore left out of the rendered filter.
    pub fn engine_curve_name(&self) -> Option<&'static str> {
        match self {
            FadeCurve::Linear => None,
            FadeCurve::Exponential => Some("qua"),
            FadeCurve::Logarithmic => Some("log"),
            FadeCurve::SCurve => Some("hsin"),
            FadeCurve::EqualPower => Some("qsin"),
        }
    }

    /// Get human-readable display name
    pub fn display_name(&self) -> &'static str {
        match self {
            FadeCurve::Linear => "Linear",
            FadeCurve::Exponential => "Exponential",
            FadeCurve::Logarithmic => "Logarithmic",
            FadeCurve::SCurve => "S-Curve",
            FadeCurve::EqualPower => "Equal Power",
        }
    }

    pub fn all_variants() -> &'static [FadeCurve] {
        &[
            FadeCurve::Linear,
            FadeCurve::Exponential,
            FadeCurve::Logarithmic,
            FadeCurve::SCurve,
            FadeCurve::EqualPower,
        ]
    }
}

impl TryFrom<String> for FadeCurve {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        FadeCurve::from_str(&value).ok_or_else(|| format!("unknown fade curve '{}'", value))
    }
}

impl std::fmt::Display for FadeCurve {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
