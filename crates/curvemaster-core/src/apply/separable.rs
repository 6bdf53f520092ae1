//! Per-channel 8-bit tables: the separable alternative to a 3D LUT.

use tracing::debug;

use super::{for_each_chunk, PixelFormat};
use crate::curve::{Curve1D, ToneCurveLut, ToneOptions, DEFAULT_STEPS};
use crate::lut::{Channel, ChannelCurves};

/// One fused 256-entry table per RGB channel.
///
/// Composition matches [`Lut3D::build_with`](crate::lut::Lut3D::build_with):
/// composite curve, then the channel's curve, then tone shaping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelLuts {
    pub red: ToneCurveLut,
    pub green: ToneCurveLut,
    pub blue: ToneCurveLut,
}

impl ChannelLuts {
    /// Evaluate the curves at every 8-bit input.
    pub fn from_curves(curves: &ChannelCurves, options: &ToneOptions) -> Self {
        let table = |channel: Channel| {
            let curve = Curve1D::from_fn(DEFAULT_STEPS, curves.evaluator(channel, options));
            ToneCurveLut::from_curve(&curve)
        };

        Self {
            red: table(Channel::Red),
            green: table(Channel::Green),
            blue: table(Channel::Blue),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.red.is_identity() && self.green.is_identity() && self.blue.is_identity()
    }

    pub fn channel(&self, channel: Channel) -> &ToneCurveLut {
        match channel {
            Channel::Red => &self.red,
            Channel::Green => &self.green,
            Channel::Blue => &self.blue,
        }
    }
}

/// Apply per-channel tables to a buffer in place. Alpha is untouched.
pub fn apply_channel_luts(pixels: &mut [u8], format: PixelFormat, luts: &ChannelLuts) {
    // Early exit for identity
    if luts.is_identity() {
        return;
    }
    debug!(pixels = format.pixel_count(pixels.len()), "Applying channel LUTs");

    let channels = format.channels();
    for_each_chunk(pixels, channels, |chunk| {
        for px in chunk.chunks_exact_mut(channels) {
            px[0] = luts.red.apply(px[0]);
            px[1] = luts.green.apply(px[1]);
            px[2] = luts.blue.apply(px[2]);
        }
    });
}
