//! Discrete curve tables.

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::tone::Shaper;
use super::{evaluate_with, CurveModel, ToneOptions};
use crate::clamp_unit;

/// Sample count used for 8-bit tables.
pub const DEFAULT_STEPS: usize = 256;

/// Largest strength accepted by [`Curve1D::smoothed`].
const MAX_FILTER_STRENGTH: f32 = 2.0;

/// A curve sampled at evenly spaced inputs.
///
/// Entry `i` holds the output for input `i / (len - 1)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Curve1D {
    values: Vec<f32>,
}

#[allow(clippy::len_without_is_empty)]
impl Curve1D {
    /// Evaluate `f` at `steps` evenly spaced inputs in [0, 1].
    pub(crate) fn from_fn(steps: usize, f: impl Fn(f32) -> f32) -> Self {
        let values = match steps {
            0 => Vec::new(),
            1 => vec![f(0.0)],
            _ => {
                let last = (steps - 1) as f32;
                (0..steps).map(|i| f(i as f32 / last)).collect()
            }
        };
        Self { values }
    }

    /// The samples, in input order.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f32> {
        self.values.get(index).copied()
    }

    /// Output for `x`, read from the nearest sample.
    ///
    /// An empty table behaves as the identity.
    pub fn lookup(&self, x: f32) -> f32 {
        match self.values.len() {
            0 => clamp_unit(x),
            1 => self.values[0],
            n => {
                let index = (clamp_unit(x) * (n - 1) as f32).round() as usize;
                self.values[index.min(n - 1)]
            }
        }
    }

    /// Output for `x`, linear between the two surrounding samples.
    ///
    /// An empty table behaves as the identity.
    pub fn interpolate(&self, x: f32) -> f32 {
        match self.values.len() {
            0 => clamp_unit(x),
            1 => self.values[0],
            n => {
                let pos = clamp_unit(x) * (n - 1) as f32;
                let i0 = (pos.floor() as usize).min(n - 2);
                let t = pos - i0 as f32;
                self.values[i0] + (self.values[i0 + 1] - self.values[i0]) * t
            }
        }
    }

    /// Gaussian-filtered copy, blended with the original by `strength`.
    ///
    /// The kernel has `sigma = strength` and an odd width of at least 3
    /// taps. Ends are padded with their edge value, so endpoints drift only
    /// as far as their inner neighbors pull them. The blend weight is
    /// `min(strength, 1)`. Strength is clamped to 0.0-2.0; zero or NaN
    /// returns the table unchanged.
    pub fn smoothed(&self, strength: f32) -> Curve1D {
        if strength.is_nan() || strength <= 0.0 || self.values.len() < 2 {
            return self.clone();
        }
        let strength = strength.min(MAX_FILTER_STRENGTH);

        let mut width = ((strength * 5.0) as usize).max(3);
        if width % 2 == 0 {
            width += 1;
        }
        let half = width / 2;
        let kernel: Vec<f32> = (0..width)
            .map(|i| {
                let d = i as f32 - half as f32;
                (-(d * d) / (2.0 * strength * strength)).exp()
            })
            .collect();
        let total: f32 = kernel.iter().sum();

        let n = self.values.len();
        let blend = strength.min(1.0);
        let values = (0..n)
            .map(|i| {
                let filtered: f32 = kernel
                    .iter()
                    .enumerate()
                    .map(|(k, w)| w * self.values[(i + k).saturating_sub(half).min(n - 1)])
                    .sum::<f32>()
                    / total;
                let original = self.values[i];
                original * (1.0 - blend) + clamp_unit(filtered) * blend
            })
            .collect();

        trace!(strength, width, "Filtered curve table");
        Curve1D { values }
    }
}

/// Sample the curve at `steps` evenly spaced inputs in [0, 1].
///
/// `steps == 0` yields an empty table; `steps == 1` yields `[evaluate(0)]`.
pub fn sample(model: &CurveModel, steps: usize) -> Curve1D {
    sample_with(model, steps, &ToneOptions::default())
}

/// Sample with explicit interpolation and output shaping.
pub fn sample_with(model: &CurveModel, steps: usize, options: &ToneOptions) -> Curve1D {
    trace!(steps, points = model.len(), "Sampling curve");

    let shaper = Shaper::new(options);
    Curve1D::from_fn(steps, |x| {
        shaper.apply(evaluate_with(model, x, options.interpolation))
    })
}

/// 256-entry lookup table for applying a curve to 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToneCurveLut {
    /// `lut[input] = output`
    pub lut: [u8; 256],
}

impl ToneCurveLut {
    /// Build from a model with output shaping.
    pub fn from_model(model: &CurveModel, options: &ToneOptions) -> Self {
        // Fast path for linear curve
        if model.is_linear() && options.is_neutral() {
            return Self::identity();
        }
        Self::from_curve(&sample_with(model, DEFAULT_STEPS, options))
    }

    /// Quantize a sampled curve.
    pub fn from_curve(curve: &Curve1D) -> Self {
        let mut lut = [0u8; 256];
        for (i, value) in lut.iter_mut().enumerate() {
            let y = curve.lookup(i as f32 / 255.0);
            *value = (clamp_unit(y) * 255.0).round() as u8;
        }
        Self { lut }
    }

    /// Create identity LUT (no change).
    pub fn identity() -> Self {
        let mut lut = [0u8; 256];
        for (i, value) in lut.iter_mut().enumerate() {
            *value = i as u8;
        }
        Self { lut }
    }

    pub fn is_identity(&self) -> bool {
        self.lut.iter().enumerate().all(|(i, &v)| v == i as u8)
    }

    #[inline]
    pub fn apply(&self, value: u8) -> u8 {
        self.lut[value as usize]
    }

    /// Gaussian-filtered copy; see [`Curve1D::smoothed`].
    pub fn smoothed(&self, strength: f32) -> ToneCurveLut {
        let curve = Curve1D {
            values: self.lut.iter().map(|&v| v as f32 / 255.0).collect(),
        };
        Self::from_curve(&curve.smoothed(strength))
    }
}

impl Default for ToneCurveLut {
    fn default() -> Self {
        Self::identity()
    }
}
