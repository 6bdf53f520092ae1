//! WASM-compatible wrapper types for image data.

use curvemaster_core::PixelFormat;
use wasm_bindgen::prelude::*;

/// An 8-bit RGB or RGBA image for JavaScript.
///
/// # Memory Management
///
/// Pixels live in WASM memory; `pixels()` copies them out as a `Uint8Array`.
/// Call `free()` to release a large image early.
#[wasm_bindgen]
pub struct JsImage {
    width: u32,
    height: u32,
    channels: u8,
    pixels: Vec<u8>,
}

#[wasm_bindgen]
impl JsImage {
    /// Wrap a pixel buffer.
    ///
    /// # Arguments
    /// * `width` - Image width in pixels
    /// * `height` - Image height in pixels
    /// * `channels` - 3 for RGB or 4 for RGBA
    /// * `pixels` - Interleaved pixel data, row-major
    ///
    /// # Errors
    /// Rejects channel counts other than 3 and 4, dimensions whose byte
    /// count overflows, and buffers whose length is not
    /// `width * height * channels`.
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32, channels: u8, pixels: Vec<u8>) -> Result<JsImage, JsValue> {
        if format_from_channels(channels).is_none() {
            return Err(JsValue::from_str(&format!(
                "Unsupported channel count: {} (expected 3 or 4)",
                channels
            )));
        }
        let expected = byte_len(width, height, channels).ok_or_else(|| {
            JsValue::from_str(&format!(
                "Image dimensions overflow: {}x{}x{}",
                width, height, channels
            ))
        })?;
        if pixels.len() != expected {
            return Err(JsValue::from_str(&format!(
                "Pixel buffer has {} bytes, expected {}",
                pixels.len(),
                expected
            )));
        }
        Ok(Self::from_parts(width, height, channels, pixels))
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// 3 for RGB, 4 for RGBA
    #[wasm_bindgen(getter)]
    pub fn channels(&self) -> u8 {
        self.channels
    }

    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.pixels.len()
    }

    /// Copy of the pixel data as a Uint8Array.
    pub fn pixels(&self) -> Vec<u8> {
        self.pixels.clone()
    }

    /// Explicitly free WASM memory.
    pub fn free(self) {}
}

impl JsImage {
    /// Build without validation; callers guarantee the layout.
    pub(crate) fn from_parts(width: u32, height: u32, channels: u8, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            channels,
            pixels,
        }
    }

    pub(crate) fn format(&self) -> PixelFormat {
        format_from_channels(self.channels).unwrap_or_default()
    }
}

/// `width * height * channels`, or `None` if it does not fit in `usize`.
fn byte_len(width: u32, height: u32, channels: u8) -> Option<usize> {
    (width as usize)
        .checked_mul(height as usize)?
        .checked_mul(channels as usize)
}

/// Channel count to pixel format; only 3 and 4 are supported.
pub(crate) fn format_from_channels(channels: u8) -> Option<PixelFormat> {
    PixelFormat::from_channels(channels as usize)
}
