//! 3D LUT storage and construction.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, warn};

use super::{LutError, LutResult};
use crate::clamp_unit;
use crate::curve::{
    evaluate_with, Curve1D, CurveModel, Shaper, Smoothing, ToneOptions, DEFAULT_STEPS,
};

/// Smallest grid: one cell spanning the whole cube.
pub const MIN_RESOLUTION: usize = 2;

/// Largest grid accepted (about 2.1M vertices).
pub const MAX_RESOLUTION: usize = 129;

/// Resolution used when none is configured.
pub const DEFAULT_RESOLUTION: usize = 33;

/// An RGB channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Red, Channel::Green, Channel::Blue];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Channel::Red => 0,
            Channel::Green => 1,
            Channel::Blue => 2,
        }
    }
}

/// The curves a LUT is built from.
///
/// Each channel runs through the composite curve first, then its own curve.
/// Missing curves are the identity. With `smoothing` set, each channel's
/// finished 8-bit table is Gaussian-filtered before it is used.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelCurves {
    pub composite: Option<CurveModel>,
    pub red: Option<CurveModel>,
    pub green: Option<CurveModel>,
    pub blue: Option<CurveModel>,
    pub smoothing: Option<Smoothing>,
}

impl ChannelCurves {
    /// No curves: builds the identity.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_composite(mut self, model: CurveModel) -> Self {
        self.composite = Some(model);
        self
    }

    pub fn with_channel(mut self, channel: Channel, model: CurveModel) -> Self {
        *self.slot_mut(channel) = Some(model);
        self
    }

    pub fn with_smoothing(mut self, smoothing: Smoothing) -> Self {
        self.smoothing = Some(smoothing);
        self
    }

    pub fn channel(&self, channel: Channel) -> Option<&CurveModel> {
        match channel {
            Channel::Red => self.red.as_ref(),
            Channel::Green => self.green.as_ref(),
            Channel::Blue => self.blue.as_ref(),
        }
    }

    fn slot_mut(&mut self, channel: Channel) -> &mut Option<CurveModel> {
        match channel {
            Channel::Red => &mut self.red,
            Channel::Green => &mut self.green,
            Channel::Blue => &mut self.blue,
        }
    }

    /// True if every present curve is the 2-point identity.
    pub fn is_identity(&self) -> bool {
        [&self.composite, &self.red, &self.green, &self.blue]
            .iter()
            .all(|c| c.as_ref().map_or(true, CurveModel::is_linear))
    }

    /// Output of `channel` for input `x`: composite, then channel curve,
    /// then tone shaping, then table smoothing if enabled.
    ///
    /// Builds the channel's transfer function on every call; use
    /// [`ChannelLuts`](crate::apply::ChannelLuts) or a [`Lut3D`] for bulk
    /// work.
    pub fn evaluate(&self, channel: Channel, x: f32, options: &ToneOptions) -> f32 {
        self.evaluator(channel, options)(x)
    }

    /// The composed transfer function of one channel.
    pub(crate) fn evaluator<'a>(
        &'a self,
        channel: Channel,
        options: &ToneOptions,
    ) -> Box<dyn Fn(f32) -> f32 + Send + Sync + 'a> {
        let shaper = Shaper::new(options);
        let interpolation = options.interpolation;
        let composite = self.composite.as_ref();
        let own = self.channel(channel);

        let raw = move |x: f32| {
            let mut y = clamp_unit(x);
            if let Some(model) = composite {
                y = evaluate_with(model, y, interpolation);
            }
            if let Some(model) = own {
                y = evaluate_with(model, y, interpolation);
            }
            shaper.apply(y)
        };

        let strength = self.smoothing.as_ref().map_or(0.0, Smoothing::filter_strength);
        if strength > 0.0 {
            let table = Curve1D::from_fn(DEFAULT_STEPS, raw).smoothed(strength);
            Box::new(move |x| table.interpolate(x))
        } else {
            Box::new(raw)
        }
    }

    /// Composed outputs at the `resolution` grid inputs of one axis.
    fn axis(&self, channel: Channel, resolution: usize, options: &ToneOptions) -> Vec<f32> {
        let eval = self.evaluator(channel, options);
        let last = (resolution - 1) as f32;
        (0..resolution).map(|i| eval(i as f32 / last)).collect()
    }
}

/// A 3D color lookup table.
///
/// Entry `(i, j, k)` holds the output for input
/// `(i, j, k) / (resolution - 1)`, with red as `i`. Storage is flat with blue
/// varying fastest. Every stored component is in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct Lut3D {
    resolution: usize,
    data: Vec<[f32; 3]>,
}

impl Lut3D {
    /// Build from curves with default tone options.
    pub fn build(curves: &ChannelCurves, resolution: usize) -> Self {
        Self::build_with(curves, resolution, &ToneOptions::default())
    }

    /// Build from curves.
    ///
    /// Resolution outside [`MIN_RESOLUTION`]..=[`MAX_RESOLUTION`] is clamped.
    /// Curves act per channel, so each axis is evaluated once and the grid
    /// is filled from the three axis tables.
    pub fn build_with(curves: &ChannelCurves, resolution: usize, options: &ToneOptions) -> Self {
        let resolution = clamp_resolution(resolution);
        let red = curves.axis(Channel::Red, resolution, options);
        let green = curves.axis(Channel::Green, resolution, options);
        let blue = curves.axis(Channel::Blue, resolution, options);

        let mut data = vec![[0.0; 3]; resolution.pow(3)];
        fill_grid(&mut data, resolution, |i, j, k| [red[i], green[j], blue[k]]);

        debug!(
            resolution,
            entries = data.len(),
            composite = curves.composite.is_some(),
            red = curves.red.is_some(),
            green = curves.green.is_some(),
            blue = curves.blue.is_some(),
            "Built 3D LUT"
        );

        Self { resolution, data }
    }

    /// Build by evaluating `f` at every grid input. Outputs are clamped.
    pub fn from_fn<F>(resolution: usize, f: F) -> Self
    where
        F: Fn([f32; 3]) -> [f32; 3] + Sync,
    {
        let resolution = clamp_resolution(resolution);
        let last = (resolution - 1) as f32;

        let mut data = vec![[0.0; 3]; resolution.pow(3)];
        fill_grid(&mut data, resolution, |i, j, k| {
            let out = f([i as f32 / last, j as f32 / last, k as f32 / last]);
            [clamp_unit(out[0]), clamp_unit(out[1]), clamp_unit(out[2])]
        });

        debug!(resolution, entries = data.len(), "Built 3D LUT from function");
        Self { resolution, data }
    }

    /// The identity LUT.
    pub fn identity(resolution: usize) -> Self {
        Self::from_fn(resolution, |rgb| rgb)
    }

    /// Wrap existing entries (blue fastest). Components are clamped.
    pub fn from_data(resolution: usize, mut data: Vec<[f32; 3]>) -> LutResult<Self> {
        if !(MIN_RESOLUTION..=MAX_RESOLUTION).contains(&resolution) {
            return Err(LutError::InvalidResolution(resolution));
        }
        let expected = resolution.pow(3);
        if data.len() != expected {
            return Err(LutError::DataLength {
                expected,
                got: data.len(),
            });
        }

        for entry in &mut data {
            for c in entry.iter_mut() {
                *c = clamp_unit(*c);
            }
        }

        Ok(Self { resolution, data })
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Entry at grid index `(i, j, k)`, or `None` out of range.
    pub fn get(&self, i: usize, j: usize, k: usize) -> Option<[f32; 3]> {
        let n = self.resolution;
        if i >= n || j >= n || k >= n {
            return None;
        }
        Some(self.data[self.index(i, j, k)])
    }

    /// All entries, blue fastest.
    pub fn as_slice(&self) -> &[[f32; 3]] {
        &self.data
    }

    /// Check every entry against its grid input within `tolerance`.
    pub fn is_identity(&self, tolerance: f32) -> bool {
        let last = (self.resolution - 1) as f32;
        let n = self.resolution;
        self.data.iter().enumerate().all(|(idx, out)| {
            let input = [
                (idx / (n * n)) as f32 / last,
                ((idx / n) % n) as f32 / last,
                (idx % n) as f32 / last,
            ];
            out.iter()
                .zip(input)
                .all(|(o, x)| (o - x).abs() <= tolerance)
        })
    }

    #[inline]
    pub(crate) fn index(&self, i: usize, j: usize, k: usize) -> usize {
        (i * self.resolution + j) * self.resolution + k
    }

    #[inline]
    pub(crate) fn at(&self, i: usize, j: usize, k: usize) -> [f32; 3] {
        self.data[self.index(i, j, k)]
    }
}

fn clamp_resolution(resolution: usize) -> usize {
    let clamped = resolution.clamp(MIN_RESOLUTION, MAX_RESOLUTION);
    if clamped != resolution {
        warn!(requested = resolution, used = clamped, "LUT resolution out of range, clamping");
    }
    clamped
}

/// Fill a `resolution^3` grid, one red plane per task.
fn fill_grid<F>(data: &mut [[f32; 3]], resolution: usize, f: F)
where
    F: Fn(usize, usize, usize) -> [f32; 3] + Sync,
{
    let plane = resolution * resolution;
    let fill_plane = |(i, chunk): (usize, &mut [[f32; 3]])| {
        for (jk, out) in chunk.iter_mut().enumerate() {
            *out = f(i, jk / resolution, jk % resolution);
        }
    };

    #[cfg(feature = "parallel")]
    data.par_chunks_mut(plane).enumerate().for_each(fill_plane);

    #[cfg(not(feature = "parallel"))]
    data.chunks_mut(plane).enumerate().for_each(fill_plane);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ControlPoint;

    fn inverted() -> CurveModel {
        CurveModel::try_from_points(vec![ControlPoint::new(0.0, 1.0), ControlPoint::new(1.0, 0.0)])
            .unwrap()
    }

    fn half_gain() -> CurveModel {
        CurveModel::try_from_points(vec![ControlPoint::new(0.0, 0.0), ControlPoint::new(1.0, 0.5)])
            .unwrap()
    }

    // ========================================================================
    // Construction
    // ========================================================================

    #[test]
    fn test_identity_curves_build_identity() {
        let curves = ChannelCurves::new()
            .with_composite(CurveModel::linear())
            .with_channel(Channel::Red, CurveModel::linear());
        let lut = Lut3D::build(&curves, 9);

        assert_eq!(lut.resolution(), 9);
        assert_eq!(lut.as_slice().len(), 729);
        for i in 0..9 {
            for j in 0..9 {
                for k in 0..9 {
                    let expected = [i as f32 / 8.0, j as f32 / 8.0, k as f32 / 8.0];
                    assert_eq!(lut.get(i, j, k), Some(expected));
                }
            }
        }
        assert!(lut.is_identity(0.0));
    }

    #[test]
    fn test_no_curves_matches_identity() {
        assert_eq!(Lut3D::build(&ChannelCurves::new(), 17), Lut3D::identity(17));
    }

    #[test]
    fn test_corners_reflect_black_and_white() {
        let curves = ChannelCurves::new().with_composite(inverted());
        let lut = Lut3D::build(&curves, 5);
        assert_eq!(lut.get(0, 0, 0), Some([1.0, 1.0, 1.0]));
        assert_eq!(lut.get(4, 4, 4), Some([0.0, 0.0, 0.0]));
    }

    #[test]
    fn test_channel_curve_only_touches_its_axis() {
        let curves = ChannelCurves::new().with_channel(Channel::Green, inverted());
        let lut = Lut3D::build(&curves, 3);

        let out = lut.get(2, 0, 1).unwrap();
        assert_eq!(out, [1.0, 1.0, 0.5]);
    }

    #[test]
    fn test_composite_applies_before_channel() {
        // composite halves, then red inverts: 1.0 -> 0.5 -> 0.5; 0.0 -> 0.0 -> 1.0
        let curves = ChannelCurves::new()
            .with_composite(half_gain())
            .with_channel(Channel::Red, inverted());
        let lut = Lut3D::build(&curves, 2);

        let white = lut.get(1, 1, 1).unwrap();
        assert!((white[0] - 0.5).abs() < 1e-6);
        assert!((white[1] - 0.5).abs() < 1e-6);

        let black = lut.get(0, 0, 0).unwrap();
        assert!((black[0] - 1.0).abs() < 1e-6);
        assert_eq!(black[1], 0.0);
    }

    #[test]
    fn test_build_with_shaping() {
        let options = ToneOptions {
            gamma: 2.0,
            ..Default::default()
        };
        let lut = Lut3D::build_with(&ChannelCurves::new(), 3, &options);
        assert_eq!(lut.get(1, 1, 1), Some([0.25, 0.25, 0.25]));
    }

    #[test]
    fn test_resolution_clamped() {
        assert_eq!(Lut3D::identity(0).resolution(), MIN_RESOLUTION);
        assert_eq!(Lut3D::identity(1).resolution(), MIN_RESOLUTION);
        assert_eq!(
            Lut3D::build(&ChannelCurves::new(), 1000).resolution(),
            MAX_RESOLUTION
        );
    }

    #[test]
    fn test_from_fn_clamps_output() {
        let lut = Lut3D::from_fn(2, |[r, g, b]| [r * 3.0 - 1.0, -g, b + f32::NAN]);
        assert_eq!(lut.get(1, 1, 1), Some([1.0, 0.0, 0.0]));
        assert_eq!(lut.get(0, 0, 0), Some([0.0, 0.0, 0.0]));
    }

    #[test]
    fn test_from_data_validates() {
        assert!(matches!(
            Lut3D::from_data(1, vec![[0.0; 3]]),
            Err(LutError::InvalidResolution(1))
        ));
        assert!(matches!(
            Lut3D::from_data(2, vec![[0.0; 3]; 7]),
            Err(LutError::DataLength { expected: 8, got: 7 })
        ));

        let lut = Lut3D::from_data(2, vec![[2.0, -1.0, 0.5]; 8]).unwrap();
        assert_eq!(lut.get(1, 0, 1), Some([1.0, 0.0, 0.5]));
    }

    #[test]
    fn test_get_out_of_range() {
        let lut = Lut3D::identity(4);
        assert_eq!(lut.get(4, 0, 0), None);
        assert_eq!(lut.get(0, 0, 4), None);
    }

    #[test]
    fn test_memory_order_blue_fastest() {
        let lut = Lut3D::identity(3);
        assert_eq!(lut.as_slice()[1], [0.0, 0.0, 0.5]);
        assert_eq!(lut.as_slice()[3], [0.0, 0.5, 0.0]);
        assert_eq!(lut.as_slice()[9], [0.5, 0.0, 0.0]);
    }

    #[test]
    fn test_is_identity_tolerance() {
        let curves = ChannelCurves::new().with_composite(CurveModel::new());
        let lut = Lut3D::build(&curves, 17);
        assert!(!lut.is_identity(1e-6));
        assert!(lut.is_identity(0.05));
    }

    #[test]
    fn test_channel_curves_is_identity() {
        assert!(ChannelCurves::new().is_identity());
        assert!(ChannelCurves::new()
            .with_channel(Channel::Blue, CurveModel::linear())
            .is_identity());
        assert!(!ChannelCurves::new().with_composite(inverted()).is_identity());
    }

    #[test]
    fn test_evaluate_matches_grid() {
        let curves = ChannelCurves::new()
            .with_composite(CurveModel::new())
            .with_channel(Channel::Blue, half_gain());
        let options = ToneOptions::default();
        let lut = Lut3D::build(&curves, 5);

        let y = curves.evaluate(Channel::Blue, 0.75, &options);
        assert_eq!(lut.get(0, 0, 3).unwrap()[2], y);
    }

    #[test]
    fn test_smoothing_filters_channel_tables() {
        // Hard contrast knee around the midpoint
        let knee = CurveModel::try_from_points(vec![
            ControlPoint::new(0.0, 0.0),
            ControlPoint::new(0.45, 0.05),
            ControlPoint::new(0.55, 0.95),
            ControlPoint::new(1.0, 1.0),
        ])
        .unwrap();
        let options = ToneOptions::default();
        let sharp = ChannelCurves::new().with_composite(knee);
        let soft = sharp.clone().with_smoothing(Smoothing {
            strength: 2.0,
            ..Default::default()
        });

        let x = 0.45;
        let expected = Curve1D::from_fn(DEFAULT_STEPS, |x| sharp.evaluate(Channel::Red, x, &options))
            .smoothed(1.0)
            .interpolate(x);
        let y = soft.evaluate(Channel::Red, x, &options);
        assert!((y - expected).abs() < 1e-6, "{} vs {}", y, expected);
        assert_ne!(y, sharp.evaluate(Channel::Red, x, &options));

        // The grid picks up the filtered axis too
        let lut = Lut3D::build(&soft, 3);
        assert_eq!(lut.get(1, 1, 1).unwrap()[0], soft.evaluate(Channel::Red, 0.5, &options));
    }

    #[test]
    fn test_zero_strength_smoothing_is_exact() {
        let curves = ChannelCurves::new().with_composite(half_gain());
        let off = curves.clone().with_smoothing(Smoothing {
            strength: 0.0,
            ..Default::default()
        });
        let options = ToneOptions::default();
        for x in [0.0, 0.3, 0.77, 1.0] {
            assert_eq!(
                off.evaluate(Channel::Green, x, &options),
                curves.evaluate(Channel::Green, x, &options)
            );
        }
    }

    #[test]
    fn test_lut_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Lut3D>();
    }
}
