//! 3D LUT WASM bindings.

use curvemaster_core::lut::cube::write_cube;
use curvemaster_core::settings::DEFAULT_CHANNEL_CURVE;
use curvemaster_core::{
    apply_lut as core_apply, apply_lut_with as core_apply_with, ApplyOptions, CurveSettings, Lut3D,
    LutInterpolation,
};
use wasm_bindgen::prelude::*;

use crate::js_error;
use crate::types::JsImage;

/// JavaScript-accessible 3D LUT.
///
/// # Example (TypeScript)
/// ```typescript
/// const lut = JsLut3D.from_settings({ curve_points_rgb: "0,0;64,40;255,255" });
/// const preview = apply_lut(image, lut);
/// download(lut.to_cube("My Grade"));
/// lut.free();
/// ```
#[wasm_bindgen]
pub struct JsLut3D {
    inner: Lut3D,
}

#[wasm_bindgen]
impl JsLut3D {
    /// Build from four curve strings. Empty strings mean "no adjustment";
    /// malformed ones fall back to the identity.
    pub fn from_curves(rgb: &str, red: &str, green: &str, blue: &str, resolution: usize) -> JsLut3D {
        let settings = CurveSettings {
            curve_points_rgb: curve_or_linear(rgb),
            curve_points_red: curve_or_linear(red),
            curve_points_green: curve_or_linear(green),
            curve_points_blue: curve_or_linear(blue),
            lut_resolution: resolution,
            ..Default::default()
        };
        Self {
            inner: settings.build_lut(),
        }
    }

    /// Build from a settings object. Missing fields take their defaults.
    ///
    /// # Errors
    /// Returns an error if the object cannot be deserialized
    pub fn from_settings(settings: JsValue) -> Result<JsLut3D, JsValue> {
        let settings = settings_from_js(settings)?;
        Ok(Self {
            inner: settings.build_lut(),
        })
    }

    /// Grid points per axis.
    #[wasm_bindgen(getter)]
    pub fn resolution(&self) -> usize {
        self.inner.resolution()
    }

    /// Map one normalized color through the LUT. Returns `[r, g, b]`.
    pub fn sample(&self, r: f32, g: f32, b: f32) -> Vec<f32> {
        self.inner.sample(r, g, b).to_vec()
    }

    /// Grid entries flattened to `r, g, b` triples, blue index fastest.
    pub fn data(&self) -> Vec<f32> {
        self.inner.as_slice().iter().flatten().copied().collect()
    }

    /// Export as `.cube` text.
    pub fn to_cube(&self, title: &str) -> String {
        write_cube(&self.inner, title)
    }

    /// Explicitly free WASM memory.
    pub fn free(self) {}
}

/// Apply a LUT to an image, returning a new image. Alpha is kept.
#[wasm_bindgen]
pub fn apply_lut(image: &JsImage, lut: &JsLut3D) -> JsImage {
    let mut pixels = image.pixels();
    core_apply(&mut pixels, image.format(), &lut.inner);
    JsImage::from_parts(image.width(), image.height(), image.channels(), pixels)
}

/// Apply a LUT with tetrahedral or trilinear sampling, mixed with the
/// original by `intensity` (0.0 to 2.0).
#[wasm_bindgen]
pub fn apply_lut_with(image: &JsImage, lut: &JsLut3D, tetrahedral: bool, intensity: f32) -> JsImage {
    let options = ApplyOptions {
        interpolation: if tetrahedral {
            LutInterpolation::Tetrahedral
        } else {
            LutInterpolation::Trilinear
        },
        intensity,
    };
    let mut pixels = image.pixels();
    core_apply_with(&mut pixels, image.format(), &lut.inner, &options);
    JsImage::from_parts(image.width(), image.height(), image.channels(), pixels)
}

/// Run a full settings pass (LUT, luminosity, blend) over an image.
///
/// # Errors
/// Returns an error if the settings object cannot be deserialized
#[wasm_bindgen]
pub fn render(image: &JsImage, settings: JsValue) -> Result<JsImage, JsValue> {
    let settings = settings_from_js(settings)?;
    let mut pixels = image.pixels();
    settings
        .render(&mut pixels, image.format())
        .map_err(|e| js_error("Render failed", e))?;
    Ok(JsImage::from_parts(
        image.width(),
        image.height(),
        image.channels(),
        pixels,
    ))
}

fn settings_from_js(value: JsValue) -> Result<CurveSettings, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(|e| js_error("Invalid curve settings", e))
}

fn curve_or_linear(s: &str) -> String {
    if s.trim().is_empty() {
        DEFAULT_CHANNEL_CURVE.to_string()
    } else {
        s.to_string()
    }
}
