//! Curve Master Core - tone curve and LUT library
//!
//! This crate turns user-edited tone curves into reusable color transforms:
//! control point editing, spline evaluation, 1D curve sampling, 3D LUT
//! construction with trilinear sampling, and the pixel pipeline that applies
//! a built LUT to 8-bit image buffers.
//!
//! # Module Structure
//!
//! - `curve` - Control point model, spline evaluation, sampling, curve strings
//! - `lut` - 3D LUT construction, trilinear sampling, `.cube` text format
//! - `apply` - Buffer transforms, blend modes, `image` crate adapters
//! - `settings` - Complete grading configuration and the render pass
//! - `preset` - Named settings behind an injected store

pub mod apply;
pub mod curve;
pub mod lut;
pub mod preset;
pub mod settings;

pub use apply::{
    apply_lut, apply_lut_cancellable, apply_lut_to, apply_lut_with, ApplyError, ApplyOptions,
    BlendMode, PixelFormat,
};
pub use curve::{
    evaluate, sample, Curve1D, CurveError, CurveModel, Interpolation, Smoothing, ToneOptions,
};
pub use lut::{ChannelCurves, Lut3D, LutError, LutInterpolation};
pub use preset::{CurvePreset, MemoryPresetStore, PresetError, PresetStore};
pub use settings::CurveSettings;

/// Tone curve control point.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ControlPoint {
    /// Input tone (0.0 = black, 1.0 = white)
    pub x: f32,
    /// Output tone (0.0 to 1.0)
    pub y: f32,
}

impl ControlPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `(x, y)` in normalized curve space.
    #[inline]
    pub fn distance_to(&self, x: f32, y: f32) -> f32 {
        ((self.x - x).powi(2) + (self.y - y).powi(2)).sqrt()
    }
}

/// Clamp a value into [0, 1], mapping NaN to 0.
#[inline]
pub(crate) fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
