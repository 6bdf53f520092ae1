//! Blending a processed buffer back over its original.

use serde::{Deserialize, Serialize};

use super::{check_lengths, for_each_chunk_pair, to_u8, to_unit, ApplyError, PixelFormat};
use crate::clamp_unit;

/// How the processed image combines with the original.
///
/// Formulas take the original as `base` and the processed image as `overlay`,
/// both in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// The processed value replaces the original.
    #[default]
    Normal,
    /// `b * o`
    Multiply,
    /// `1 - (1 - b)(1 - o)`
    Screen,
    /// Multiply in the shadows of the base, screen in its highlights.
    Overlay,
    /// Soft light, pegtop-style on the overlay.
    SoftLight,
}

impl BlendMode {
    /// Blend one channel value.
    #[inline]
    pub fn blend(self, base: f32, overlay: f32) -> f32 {
        let b = base;
        let o = overlay;
        match self {
            BlendMode::Normal => o,
            BlendMode::Multiply => b * o,
            BlendMode::Screen => 1.0 - (1.0 - b) * (1.0 - o),
            BlendMode::Overlay => {
                if b < 0.5 {
                    2.0 * b * o
                } else {
                    1.0 - 2.0 * (1.0 - b) * (1.0 - o)
                }
            }
            BlendMode::SoftLight => {
                if o < 0.5 {
                    b - (1.0 - 2.0 * o) * b * (1.0 - b)
                } else {
                    b + (2.0 * o - 1.0) * (b.sqrt() - b)
                }
            }
        }
    }
}

/// Blend `processed` over `original` in place, mixing by `opacity`.
///
/// Each channel becomes `b * (1 - opacity) + blend(b, o) * opacity` with
/// opacity clamped to [0, 1]. Alpha keeps the processed value. Normal at
/// full opacity is a no-op.
pub fn blend_buffers(
    original: &[u8],
    processed: &mut [u8],
    format: PixelFormat,
    mode: BlendMode,
    opacity: f32,
) -> Result<(), ApplyError> {
    check_lengths(original, processed)?;

    let opacity = clamp_unit(opacity);
    if mode == BlendMode::Normal && opacity >= 1.0 {
        return Ok(());
    }

    let channels = format.channels();
    for_each_chunk_pair(original, processed, channels, |orig, proc| {
        for (op, pp) in orig.chunks_exact(channels).zip(proc.chunks_exact_mut(channels)) {
            for c in 0..3 {
                let b = to_unit(op[c]);
                let blended = mode.blend(b, to_unit(pp[c]));
                pp[c] = to_u8(b * (1.0 - opacity) + blended * opacity);
            }
        }
    });
    Ok(())
}

/// Restore each pixel's original HSV value (max channel) while keeping the
/// processed hue and saturation.
///
/// The processed RGB is scaled by `v_orig / v_proc`; a black processed pixel
/// becomes neutral gray at `v_orig`.
pub fn preserve_value(
    original: &[u8],
    processed: &mut [u8],
    format: PixelFormat,
) -> Result<(), ApplyError> {
    check_lengths(original, processed)?;

    let channels = format.channels();
    for_each_chunk_pair(original, processed, channels, |orig, proc| {
        for (op, pp) in orig.chunks_exact(channels).zip(proc.chunks_exact_mut(channels)) {
            let v_orig = op[0].max(op[1]).max(op[2]);
            let v_proc = pp[0].max(pp[1]).max(pp[2]);

            if v_proc == 0 {
                pp[..3].fill(v_orig);
                continue;
            }

            let scale = v_orig as f32 / v_proc as f32;
            for c in &mut pp[..3] {
                *c = (*c as f32 * scale).round().min(255.0) as u8;
            }
        }
    });
    Ok(())
}
