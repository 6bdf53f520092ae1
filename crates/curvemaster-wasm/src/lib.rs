//! Curve Master WASM - WebAssembly bindings for the curve editor
//!
//! Exposes curvemaster-core to a browser-side editor: the canvas edits a
//! [`JsCurveModel`], the preview builds a [`JsLut3D`] and applies it to a
//! [`JsImage`].
//!
//! # Module Structure
//!
//! - `curve` - Editable control point model and curve evaluation
//! - `lut` - 3D LUT construction, sampling, `.cube` export and application
//! - `types` - WASM-compatible wrapper types for image data
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsCurveModel, JsLut3D, JsImage, apply_lut } from '@curvemaster/wasm';
//!
//! await init();
//!
//! const curve = JsCurveModel.from_string("0,0;64,40;192,215;255,255");
//! const lut = JsLut3D.from_curves(curve.to_curve_string(), "", "", "", 33);
//! const graded = apply_lut(new JsImage(w, h, 4, pixels), lut);
//! ```

use wasm_bindgen::prelude::*;

mod curve;
mod lut;
mod types;

pub use curve::JsCurveModel;
pub use lut::{apply_lut, apply_lut_with, render, JsLut3D};
pub use types::JsImage;

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Log a recovered problem to the browser console.
pub(crate) fn console_warn(message: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::warn_1(&JsValue::from_str(message));

    #[cfg(not(target_arch = "wasm32"))]
    let _ = message;
}

/// Map a serde-wasm-bindgen error into a JS exception value.
pub(crate) fn js_error(context: &str, err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&format!("{}: {}", context, err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }

    #[test]
    fn test_console_warn_is_silent_natively() {
        console_warn("nothing to see");
    }
}
