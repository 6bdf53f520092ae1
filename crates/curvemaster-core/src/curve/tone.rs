//! Output shaping applied after curve evaluation.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::Interpolation;
use crate::clamp_unit;

const STRENGTH_RANGE: (f32, f32) = (0.05, 2.0);
const GAMMA_RANGE: (f32, f32) = (0.1, 3.0);

/// How a curve becomes output tones.
///
/// `strength` bends the evaluated curve with `y^(1/strength)`, then `gamma`
/// applies `y^gamma`. Both are neutral at 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneOptions {
    pub interpolation: Interpolation,
    /// Curve strength (0.05 to 2.0)
    pub strength: f32,
    /// Output gamma (0.1 to 3.0)
    pub gamma: f32,
}

impl Default for ToneOptions {
    fn default() -> Self {
        Self {
            interpolation: Interpolation::CatmullRom,
            strength: 1.0,
            gamma: 1.0,
        }
    }
}

impl ToneOptions {
    /// Strength clamped to its valid range.
    pub fn strength(&self) -> f32 {
        clamp_param("strength", self.strength, STRENGTH_RANGE)
    }

    /// Gamma clamped to its valid range.
    pub fn gamma(&self) -> f32 {
        clamp_param("gamma", self.gamma, GAMMA_RANGE)
    }

    /// Check if shaping leaves values unchanged.
    pub fn is_neutral(&self) -> bool {
        (self.strength() - 1.0).abs() < f32::EPSILON && (self.gamma() - 1.0).abs() < f32::EPSILON
    }
}

/// Pre-clamped exponents, so hot loops skip the range checks and warnings.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Shaper {
    inv_strength: Option<f32>,
    gamma: Option<f32>,
}

impl Shaper {
    pub(crate) fn new(options: &ToneOptions) -> Self {
        let strength = options.strength();
        let gamma = options.gamma();
        Self {
            inv_strength: ((strength - 1.0).abs() >= f32::EPSILON).then(|| 1.0 / strength),
            gamma: ((gamma - 1.0).abs() >= f32::EPSILON).then_some(gamma),
        }
    }

    #[inline]
    pub(crate) fn apply(&self, y: f32) -> f32 {
        let mut y = clamp_unit(y);
        if let Some(exponent) = self.inv_strength {
            y = y.powf(exponent);
        }
        if let Some(gamma) = self.gamma {
            y = y.powf(gamma);
        }
        clamp_unit(y)
    }
}

fn clamp_param(name: &'static str, value: f32, (lo, hi): (f32, f32)) -> f32 {
    if value.is_nan() {
        warn!(param = name, "Tone parameter is NaN, using 1.0");
        return 1.0;
    }
    if !(lo..=hi).contains(&value) {
        warn!(param = name, value, lo, hi, "Tone parameter out of range, clamping");
    }
    value.clamp(lo, hi)
}
