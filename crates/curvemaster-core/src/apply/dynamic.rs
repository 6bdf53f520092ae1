//! Adapters for `image` crate buffers.

use image::DynamicImage;
use tracing::trace;

use super::{apply_lut, ApplyError, PixelFormat};
use crate::lut::Lut3D;
use crate::settings::CurveSettings;

/// Apply a LUT to an image in place.
///
/// RGB8 and RGBA8 images are processed directly; any other layout is
/// converted to RGBA8 first.
pub fn apply_lut_to_image(img: &mut DynamicImage, lut: &Lut3D) {
    with_pixels(img, |pixels, format| apply_lut(pixels, format, lut));
}

/// Run a full settings pass (LUT, luminosity, blend) over an image.
pub fn render_image(img: &mut DynamicImage, settings: &CurveSettings) -> Result<(), ApplyError> {
    with_pixels(img, |pixels, format| settings.render(pixels, format))
}

fn with_pixels<R, F>(img: &mut DynamicImage, f: F) -> R
where
    F: FnOnce(&mut [u8], PixelFormat) -> R,
{
    match img {
        DynamicImage::ImageRgb8(buf) => f(&mut **buf, PixelFormat::Rgb),
        DynamicImage::ImageRgba8(buf) => f(&mut **buf, PixelFormat::Rgba),
        other => {
            trace!(color = ?other.color(), "Converting image to RGBA8");
            let mut rgba = other.to_rgba8();
            let result = f(&mut *rgba, PixelFormat::Rgba);
            *other = DynamicImage::ImageRgba8(rgba);
            result
        }
    }
}
