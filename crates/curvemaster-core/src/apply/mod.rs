//! Applying built LUTs to 8-bit pixel buffers.
//!
//! Buffers are interleaved display-encoded RGB or RGBA bytes. Each pixel is
//! normalized to [0, 1], sampled through the LUT and written back with
//! `round(v * 255)`. Alpha is never touched, and trailing bytes that do not
//! form a whole pixel are left as they are.
//!
//! Work is split into fixed-size pixel chunks; with the `parallel` feature
//! the chunks run on the rayon pool.

mod blend;
mod dynamic;
mod separable;

pub use blend::{blend_buffers, preserve_value, BlendMode};
pub use dynamic::{apply_lut_to_image, render_image};
pub use separable::{apply_channel_luts, ChannelLuts};

use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::clamp_unit;
use crate::lut::{Lut3D, LutInterpolation};

/// Pixels per work unit.
pub(crate) const CHUNK_PIXELS: usize = 16 * 1024;

/// Interleaved 8-bit pixel layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    #[default]
    Rgb,
    /// RGB plus an untouched alpha byte.
    Rgba,
}

impl PixelFormat {
    /// Bytes per pixel.
    #[inline]
    pub fn channels(self) -> usize {
        match self {
            PixelFormat::Rgb => 3,
            PixelFormat::Rgba => 4,
        }
    }

    pub fn from_channels(channels: usize) -> Option<Self> {
        match channels {
            3 => Some(PixelFormat::Rgb),
            4 => Some(PixelFormat::Rgba),
            _ => None,
        }
    }

    /// Whole pixels in a buffer of `len` bytes.
    #[inline]
    pub fn pixel_count(self, len: usize) -> usize {
        len / self.channels()
    }
}

/// Error types for buffer transforms.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    /// Source and destination buffers differ in length.
    #[error("Buffer length mismatch: source has {src} bytes, destination has {dst}")]
    LengthMismatch { src: usize, dst: usize },

    /// The caller's cancel flag was raised.
    #[error("Operation cancelled")]
    Cancelled,
}

const INTENSITY_RANGE: (f32, f32) = (0.0, 2.0);

/// How a built LUT is read and mixed into the image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplyOptions {
    pub interpolation: LutInterpolation,
    /// Mix between the original (0.0) and the LUT output (1.0); values up
    /// to 2.0 push past the LUT
    pub intensity: f32,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            interpolation: LutInterpolation::Trilinear,
            intensity: 1.0,
        }
    }
}

impl ApplyOptions {
    /// Intensity clamped to 0.0-2.0.
    pub fn intensity(&self) -> f32 {
        if self.intensity.is_nan() {
            warn!("LUT intensity is NaN, using 1.0");
            return 1.0;
        }
        let (lo, hi) = INTENSITY_RANGE;
        if !(lo..=hi).contains(&self.intensity) {
            warn!(intensity = self.intensity, "LUT intensity out of range, clamping");
        }
        self.intensity.clamp(lo, hi)
    }
}

/// One pixel through the LUT, mixed by intensity.
#[derive(Clone, Copy)]
struct PixelMapper<'a> {
    lut: &'a Lut3D,
    interpolation: LutInterpolation,
    intensity: f32,
}

impl<'a> PixelMapper<'a> {
    fn new(lut: &'a Lut3D, options: &ApplyOptions) -> Self {
        Self {
            lut,
            interpolation: options.interpolation,
            intensity: options.intensity(),
        }
    }

    #[inline]
    fn map(&self, px: &[u8]) -> [u8; 3] {
        let src = [to_unit(px[0]), to_unit(px[1]), to_unit(px[2])];
        let out = self
            .lut
            .sample_with(src[0], src[1], src[2], self.interpolation);

        if self.intensity == 1.0 {
            return [to_u8(out[0]), to_u8(out[1]), to_u8(out[2])];
        }
        let mix = |c: usize| to_u8(src[c] + (out[c] - src[c]) * self.intensity);
        [mix(0), mix(1), mix(2)]
    }
}

/// Apply a LUT to a buffer in place.
pub fn apply_lut(pixels: &mut [u8], format: PixelFormat, lut: &Lut3D) {
    apply_lut_with(pixels, format, lut, &ApplyOptions::default());
}

/// Apply a LUT in place with explicit interpolation and intensity.
pub fn apply_lut_with(pixels: &mut [u8], format: PixelFormat, lut: &Lut3D, options: &ApplyOptions) {
    debug!(
        pixels = format.pixel_count(pixels.len()),
        resolution = lut.resolution(),
        interpolation = ?options.interpolation,
        intensity = options.intensity,
        "Applying 3D LUT"
    );

    let channels = format.channels();
    let mapper = PixelMapper::new(lut, options);
    for_each_chunk(pixels, channels, |chunk| map_chunk(chunk, channels, &mapper));
}

/// Apply a LUT from `src` into `dst`.
///
/// Alpha is copied from the source. Trailing partial-pixel bytes of `dst`
/// are not written.
pub fn apply_lut_to(
    src: &[u8],
    dst: &mut [u8],
    format: PixelFormat,
    lut: &Lut3D,
) -> Result<(), ApplyError> {
    check_lengths(src, dst)?;
    debug!(
        pixels = format.pixel_count(src.len()),
        resolution = lut.resolution(),
        "Applying 3D LUT to destination buffer"
    );

    let channels = format.channels();
    let mapper = PixelMapper::new(lut, &ApplyOptions::default());
    for_each_chunk_pair(src, dst, channels, |s, d| {
        for (sp, dp) in s.chunks_exact(channels).zip(d.chunks_exact_mut(channels)) {
            dp[..3].copy_from_slice(&mapper.map(sp));
            if channels == 4 {
                dp[3] = sp[3];
            }
        }
    });
    Ok(())
}

/// Apply a LUT in place, checking `cancel` before each chunk.
///
/// On cancellation, chunks already processed keep their new values and
/// [`ApplyError::Cancelled`] is returned.
pub fn apply_lut_cancellable(
    pixels: &mut [u8],
    format: PixelFormat,
    lut: &Lut3D,
    cancel: &AtomicBool,
) -> Result<(), ApplyError> {
    debug!(
        pixels = format.pixel_count(pixels.len()),
        resolution = lut.resolution(),
        "Applying 3D LUT (cancellable)"
    );

    let channels = format.channels();
    let mapper = PixelMapper::new(lut, &ApplyOptions::default());
    let result = try_for_each_chunk(pixels, channels, |chunk| {
        if cancel.load(Ordering::Relaxed) {
            return Err(ApplyError::Cancelled);
        }
        map_chunk(chunk, channels, &mapper);
        Ok(())
    });

    if result.is_err() {
        debug!("3D LUT application cancelled");
    }
    result
}

#[inline]
fn map_chunk(chunk: &mut [u8], channels: usize, mapper: &PixelMapper<'_>) {
    for px in chunk.chunks_exact_mut(channels) {
        let out = mapper.map(px);
        px[..3].copy_from_slice(&out);
    }
}

#[inline]
pub(crate) fn to_unit(v: u8) -> f32 {
    v as f32 / 255.0
}

#[inline]
pub(crate) fn to_u8(v: f32) -> u8 {
    (clamp_unit(v) * 255.0).round() as u8
}

pub(crate) fn check_lengths(src: &[u8], dst: &[u8]) -> Result<(), ApplyError> {
    if src.len() != dst.len() {
        return Err(ApplyError::LengthMismatch {
            src: src.len(),
            dst: dst.len(),
        });
    }
    Ok(())
}

// ============================================================================
// Chunked iteration
// ============================================================================

pub(crate) fn for_each_chunk<F>(pixels: &mut [u8], channels: usize, f: F)
where
    F: Fn(&mut [u8]) + Sync + Send,
{
    let size = CHUNK_PIXELS * channels;

    #[cfg(feature = "parallel")]
    pixels.par_chunks_mut(size).for_each(f);

    #[cfg(not(feature = "parallel"))]
    pixels.chunks_mut(size).for_each(f);
}

pub(crate) fn try_for_each_chunk<F>(pixels: &mut [u8], channels: usize, f: F) -> Result<(), ApplyError>
where
    F: Fn(&mut [u8]) -> Result<(), ApplyError> + Sync + Send,
{
    let size = CHUNK_PIXELS * channels;

    #[cfg(feature = "parallel")]
    let result = pixels.par_chunks_mut(size).try_for_each(f);

    #[cfg(not(feature = "parallel"))]
    let result = pixels.chunks_mut(size).try_for_each(f);

    result
}

pub(crate) fn for_each_chunk_pair<F>(src: &[u8], dst: &mut [u8], channels: usize, f: F)
where
    F: Fn(&[u8], &mut [u8]) + Sync + Send,
{
    let size = CHUNK_PIXELS * channels;

    #[cfg(feature = "parallel")]
    src.par_chunks(size)
        .zip(dst.par_chunks_mut(size))
        .for_each(|(s, d)| f(s, d));

    #[cfg(not(feature = "parallel"))]
    src.chunks(size)
        .zip(dst.chunks_mut(size))
        .for_each(|(s, d)| f(s, d));
}
