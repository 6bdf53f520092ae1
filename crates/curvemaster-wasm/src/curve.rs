//! Curve editor WASM bindings.
//!
//! The canvas forwards raw pointer positions in normalized [0, 1] space; the
//! model clamps and rejects illegal edits itself, so the UI never has to
//! validate.

use curvemaster_core::curve::{sample, CurveModel, ToneCurveLut, ToneOptions};
use curvemaster_core::evaluate;
use wasm_bindgen::prelude::*;

use crate::{console_warn, js_error};

/// JavaScript-accessible editable tone curve.
///
/// # Example (TypeScript)
/// ```typescript
/// const curve = new JsCurveModel();          // 5-point identity
/// const i = curve.insert(0.3, 0.2);          // -1 if rejected
/// curve.move_point(i, 0.32, 0.18);
/// const hit = curve.nearest(mx, my, 0.05);   // -1 if nothing in range
/// const ys = curve.sample(256);              // Float32Array for drawing
/// settings.curve_points_rgb = curve.to_curve_string();
/// ```
#[wasm_bindgen]
pub struct JsCurveModel {
    inner: CurveModel,
}

#[wasm_bindgen]
impl JsCurveModel {
    /// Create the default 5-point identity curve.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            inner: CurveModel::new(),
        }
    }

    /// Create the 2-point linear curve.
    pub fn linear() -> Self {
        Self {
            inner: CurveModel::linear(),
        }
    }

    /// Parse a curve string like `"0,0;128,140;255,255"`.
    ///
    /// Malformed strings fall back to the linear curve and log a console
    /// warning.
    pub fn from_string(s: &str) -> Self {
        let inner = match CurveModel::try_parse(s) {
            Ok(model) => model,
            Err(err) => {
                console_warn(&format!("Invalid curve string {:?}: {}", s, err));
                CurveModel::linear()
            }
        };
        Self { inner }
    }

    /// Number of control points.
    #[wasm_bindgen(getter)]
    pub fn length(&self) -> usize {
        self.inner.len()
    }

    /// Insert a point. Returns its index, or -1 if the edit was rejected.
    pub fn insert(&mut self, x: f32, y: f32) -> i32 {
        index_or_none(self.inner.insert(x, y))
    }

    /// Move a point, clamped into its legal region. Returns false for an
    /// index out of range.
    pub fn move_point(&mut self, index: usize, x: f32, y: f32) -> bool {
        self.inner.move_point(index, x, y).is_some()
    }

    /// Remove an interior point. Endpoints cannot be removed.
    pub fn remove(&mut self, index: usize) -> bool {
        self.inner.remove(index).is_some()
    }

    /// Index of the point closest to `(x, y)` within `threshold`, or -1.
    pub fn nearest(&self, x: f32, y: f32, threshold: f32) -> i32 {
        index_or_none(self.inner.nearest(x, y, threshold))
    }

    /// Control points as an array of `{x, y}` objects.
    pub fn points(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.inner.points())
            .map_err(|e| js_error("Failed to serialize points", e))
    }

    /// Export as an 8-bit curve string.
    pub fn to_curve_string(&self) -> String {
        self.inner.to_curve_string()
    }

    /// Curve output at `x`.
    pub fn evaluate(&self, x: f32) -> f32 {
        evaluate(&self.inner, x)
    }

    /// `steps` evenly spaced outputs over [0, 1], for drawing the curve.
    pub fn sample(&self, steps: usize) -> Vec<f32> {
        sample(&self.inner, steps).values().to_vec()
    }

    /// 256-entry 8-bit table for the curve, Gaussian-filtered by
    /// `smoothing` (0 leaves it as is). Feeds the histogram overlay.
    pub fn to_lut(&self, smoothing: f32) -> Vec<u8> {
        ToneCurveLut::from_model(&self.inner, &ToneOptions::default())
            .smoothed(smoothing)
            .lut
            .to_vec()
    }

    /// Explicitly free WASM memory.
    pub fn free(self) {}
}

impl Default for JsCurveModel {
    fn default() -> Self {
        Self::new()
    }
}

fn index_or_none(index: Option<usize>) -> i32 {
    index.map_or(-1, |i| i as i32)
}
