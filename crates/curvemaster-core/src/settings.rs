//! Complete grading configuration and the render pass.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::apply::{
    apply_lut_with, blend_buffers, preserve_value, ApplyError, ApplyOptions, BlendMode, ChannelLuts,
    PixelFormat,
};
use crate::curve::{CurveModel, Smoothing, ToneOptions};
use crate::lut::{ChannelCurves, Lut3D, DEFAULT_RESOLUTION};
use crate::preset::{PresetError, PresetStore};

/// Composite curve the editor opens with.
pub const DEFAULT_COMPOSITE_CURVE: &str = "0,0;64,64;128,128;192,192;255,255";

/// Channel curve the editor opens with.
pub const DEFAULT_CHANNEL_CURVE: &str = "0,0;255,255";

/// Everything needed to turn an image into its graded version.
///
/// Curves are kept as curve strings so settings stay serializable exactly as
/// the editor produced them; malformed strings fall back to the identity
/// when the LUT is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveSettings {
    /// Composite curve applied to all three channels
    pub curve_points_rgb: String,
    pub curve_points_red: String,
    pub curve_points_green: String,
    pub curve_points_blue: String,
    pub tone: ToneOptions,
    /// Keep each pixel's original HSV value
    pub preserve_luminosity: bool,
    pub blend_mode: BlendMode,
    /// Blend opacity (0.0 to 1.0)
    pub opacity: f32,
    /// Smooth control points before evaluation and filter the finished
    /// channel tables
    pub smoothing: Option<Smoothing>,
    /// 3D LUT grid size (2 to 129)
    pub lut_resolution: usize,
    /// LUT sampling and intensity
    pub apply: ApplyOptions,
}

impl Default for CurveSettings {
    fn default() -> Self {
        Self {
            curve_points_rgb: DEFAULT_COMPOSITE_CURVE.to_string(),
            curve_points_red: DEFAULT_CHANNEL_CURVE.to_string(),
            curve_points_green: DEFAULT_CHANNEL_CURVE.to_string(),
            curve_points_blue: DEFAULT_CHANNEL_CURVE.to_string(),
            tone: ToneOptions::default(),
            preserve_luminosity: false,
            blend_mode: BlendMode::Normal,
            opacity: 1.0,
            smoothing: None,
            lut_resolution: DEFAULT_RESOLUTION,
            apply: ApplyOptions::default(),
        }
    }
}

impl CurveSettings {
    /// Create settings with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if all values are at their defaults
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Opacity clamped to [0, 1].
    pub fn opacity(&self) -> f32 {
        if self.opacity.is_nan() {
            warn!("Opacity is NaN, using 1.0");
            return 1.0;
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            warn!(opacity = self.opacity, "Opacity out of range, clamping");
        }
        self.opacity.clamp(0.0, 1.0)
    }

    /// Parse (and optionally smooth) the four curves.
    ///
    /// Curves that parse to the 2-point identity are left out. Smoothing is
    /// carried along so the channel tables get filtered as well.
    pub fn channel_curves(&self) -> ChannelCurves {
        let load = |s: &str| {
            let model = CurveModel::parse_or_identity(s);
            let model = match &self.smoothing {
                Some(smoothing) => model.smoothed(smoothing),
                None => model,
            };
            (!model.is_linear()).then_some(model)
        };

        ChannelCurves {
            composite: load(&self.curve_points_rgb),
            red: load(&self.curve_points_red),
            green: load(&self.curve_points_green),
            blue: load(&self.curve_points_blue),
            smoothing: self.smoothing,
        }
    }

    pub fn build_lut(&self) -> Lut3D {
        Lut3D::build_with(&self.channel_curves(), self.lut_resolution, &self.tone)
    }

    /// Per-channel 8-bit tables for the same curves.
    pub fn channel_luts(&self) -> ChannelLuts {
        ChannelLuts::from_curves(&self.channel_curves(), &self.tone)
    }

    /// Build the LUT and render `pixels` in place.
    pub fn render(&self, pixels: &mut [u8], format: PixelFormat) -> Result<(), ApplyError> {
        self.render_with_lut(pixels, format, &self.build_lut())
    }

    /// Render with a prebuilt LUT: LUT, then luminosity preservation, then
    /// blending with the original.
    pub fn render_with_lut(
        &self,
        pixels: &mut [u8],
        format: PixelFormat,
        lut: &Lut3D,
    ) -> Result<(), ApplyError> {
        let opacity = self.opacity();
        let needs_original =
            self.preserve_luminosity || self.blend_mode != BlendMode::Normal || opacity < 1.0;

        debug!(
            preserve_luminosity = self.preserve_luminosity,
            blend_mode = ?self.blend_mode,
            opacity,
            "Rendering curve settings"
        );

        if !needs_original {
            apply_lut_with(pixels, format, lut, &self.apply);
            return Ok(());
        }

        let original = pixels.to_vec();
        apply_lut_with(pixels, format, lut, &self.apply);

        if self.preserve_luminosity {
            preserve_value(&original, pixels, format)?;
        }
        blend_buffers(&original, pixels, format, self.blend_mode, opacity)
    }

    /// Load the settings stored under `name`.
    pub fn from_preset<S: PresetStore + ?Sized>(store: &S, name: &str) -> Result<Self, PresetError> {
        store
            .get(name)
            .map(|preset| preset.settings)
            .ok_or_else(|| PresetError::NotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lut::{LutInterpolation, MAX_RESOLUTION};
    use crate::preset::{CurvePreset, MemoryPresetStore};

    fn invert_settings() -> CurveSettings {
        CurveSettings {
            curve_points_rgb: "0,255;255,0".to_string(),
            lut_resolution: 9,
            ..Default::default()
        }
    }

    // ========================================================================
    // Defaults and parsing
    // ========================================================================

    #[test]
    fn test_default_settings() {
        let s = CurveSettings::new();
        assert!(s.is_default());
        assert_eq!(s.curve_points_rgb, "0,0;64,64;128,128;192,192;255,255");
        assert_eq!(s.curve_points_red, "0,0;255,255");
        assert_eq!(s.opacity(), 1.0);
        assert_eq!(s.lut_resolution, 33);
        assert!(s.smoothing.is_none());
    }

    #[test]
    fn test_channel_curves_drop_linear() {
        let curves = CurveSettings::default().channel_curves();
        assert!(curves.composite.is_some());
        assert!(curves.red.is_none());
        assert!(curves.green.is_none());
        assert!(curves.blue.is_none());
    }

    #[test]
    fn test_malformed_curve_falls_back() {
        let s = CurveSettings {
            curve_points_red: "not a curve".to_string(),
            ..Default::default()
        };
        assert!(s.channel_curves().red.is_none());
    }

    #[test]
    fn test_smoothing_applied_to_curves() {
        let s = CurveSettings {
            curve_points_rgb: "0,0;64,150;128,20;192,230;255,255".to_string(),
            smoothing: Some(Smoothing::default()),
            ..Default::default()
        };
        let raw = CurveModel::parse_or_identity(&s.curve_points_rgb);
        let smoothed = s.channel_curves().composite.unwrap();
        assert_ne!(raw, smoothed);
        assert_eq!(raw.len(), smoothed.len());
    }

    #[test]
    fn test_opacity_clamped() {
        let mut s = CurveSettings::default();
        s.opacity = 3.0;
        assert_eq!(s.opacity(), 1.0);
        s.opacity = -1.0;
        assert_eq!(s.opacity(), 0.0);
        s.opacity = f32::NAN;
        assert_eq!(s.opacity(), 1.0);
    }

    #[test]
    fn test_build_lut_uses_resolution() {
        let mut s = invert_settings();
        assert_eq!(s.build_lut().resolution(), 9);
        s.lut_resolution = 4096;
        assert_eq!(s.build_lut().resolution(), MAX_RESOLUTION);
    }

    // ========================================================================
    // Render
    // ========================================================================

    #[test]
    fn test_render_inverts() {
        let mut pixels = vec![0, 128, 255, 50];
        invert_settings().render(&mut pixels, PixelFormat::Rgba).unwrap();
        assert_eq!(pixels, vec![255, 127, 0, 50]);
    }

    #[test]
    fn test_render_zero_opacity_is_noop() {
        let mut s = invert_settings();
        s.opacity = 0.0;
        let mut pixels = vec![10, 20, 30];
        s.render(&mut pixels, PixelFormat::Rgb).unwrap();
        assert_eq!(pixels, vec![10, 20, 30]);
    }

    #[test]
    fn test_render_preserve_luminosity() {
        let mut s = invert_settings();
        s.preserve_luminosity = true;
        // Inverted to (155, 55, 255), then scaled back to the original value 200
        let mut pixels = vec![100, 200, 0];
        s.render(&mut pixels, PixelFormat::Rgb).unwrap();
        assert_eq!(pixels, vec![122, 43, 200]);
    }

    #[test]
    fn test_render_half_intensity() {
        let mut s = invert_settings();
        s.apply.intensity = 0.5;
        let mut pixels = vec![0, 255, 255];
        s.render(&mut pixels, PixelFormat::Rgb).unwrap();
        assert_eq!(pixels, vec![128, 128, 128]);
    }

    #[test]
    fn test_render_tetrahedral_inverts() {
        let mut s = invert_settings();
        s.apply.interpolation = LutInterpolation::Tetrahedral;
        let mut pixels = vec![0, 128, 255, 50];
        s.render(&mut pixels, PixelFormat::Rgba).unwrap();
        assert_eq!(pixels, vec![255, 127, 0, 50]);
    }

    #[test]
    fn test_smoothing_filters_channel_luts() {
        let s = CurveSettings {
            curve_points_rgb: "0,0;115,13;140,242;255,255".to_string(),
            ..Default::default()
        };
        let smoothed = CurveSettings {
            smoothing: Some(Smoothing {
                strength: 2.0,
                iterations: 0,
                anti_clipping: false,
            }),
            ..s.clone()
        };
        assert_eq!(smoothed.channel_curves().composite, s.channel_curves().composite);
        assert_ne!(smoothed.channel_luts(), s.channel_luts());
        assert_ne!(smoothed.build_lut(), s.build_lut());
    }

    #[test]
    fn test_channel_luts_match_settings() {
        let luts = invert_settings().channel_luts();
        assert_eq!(luts.red.apply(0), 255);
        assert_eq!(luts.blue.apply(255), 0);
    }

    #[test]
    fn test_deserialize_fills_missing_fields() {
        use serde::de::value::{Error, MapDeserializer};

        let entries = vec![("opacity", 0.5f32)];
        let de: MapDeserializer<'_, _, Error> = MapDeserializer::new(entries.into_iter());
        let s = CurveSettings::deserialize(de).unwrap();
        assert_eq!(s.opacity, 0.5);
        assert_eq!(s.curve_points_rgb, DEFAULT_COMPOSITE_CURVE);
    }

    // ========================================================================
    // Presets
    // ========================================================================

    #[test]
    fn test_from_preset() {
        let mut store = MemoryPresetStore::new();
        store
            .put(CurvePreset::new("Invert", invert_settings()))
            .unwrap();

        let s = CurveSettings::from_preset(&store, "Invert").unwrap();
        assert_eq!(s, invert_settings());
        assert_eq!(
            CurveSettings::from_preset(&store, "Missing"),
            Err(PresetError::NotFound("Missing".to_string()))
        );
    }
}
