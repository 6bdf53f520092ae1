//! Spline evaluation through tone curve control points.
//!
//! Curves with four or more points use a uniform Catmull-Rom spline on the y
//! components. For each segment between P1 and P2, with neighbors P0 and P3
//! (duplicated at the ends):
//! ```text
//! y(t) = 0.5 × (2×P1 + (-P0 + P2)×t + (2×P0 - 5×P1 + 4×P2 - P3)×t² + (-P0 + 3×P1 - 3×P2 + P3)×t³)
//! ```
//! where `t` is the position inside the segment's own x span. The spline
//! passes through every control point and is continuous at segment joins.
//! Shorter curves interpolate linearly.

use serde::{Deserialize, Serialize};

use super::CurveModel;
use crate::{clamp_unit, ControlPoint};

/// Segments narrower than this are treated as a step (t = 0).
const DEGENERATE_SPAN: f32 = 1e-6;

/// Interpolation used between control points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Interpolation {
    /// Straight lines between points.
    Linear,
    /// Catmull-Rom spline (linear below four points).
    #[default]
    #[serde(alias = "cubic")]
    CatmullRom,
}

/// Evaluate the curve at `x` (clamped to [0, 1]).
///
/// Uses Catmull-Rom interpolation for four or more points and linear
/// interpolation otherwise. The result is clamped to [0, 1].
pub fn evaluate(model: &CurveModel, x: f32) -> f32 {
    evaluate_with(model, x, Interpolation::CatmullRom)
}

/// Evaluate the curve at `x` with an explicit interpolation mode.
pub fn evaluate_with(model: &CurveModel, x: f32, interpolation: Interpolation) -> f32 {
    evaluate_points(model.points(), x, interpolation)
}

/// Evaluate a sorted point slice.
///
/// Tolerates slices that do not satisfy the model invariants: an empty slice
/// is the identity, a single point is constant, and inputs outside the point
/// range hold the nearest endpoint's y.
pub(crate) fn evaluate_points(points: &[ControlPoint], x: f32, interpolation: Interpolation) -> f32 {
    let n = points.len();
    if n == 0 {
        return clamp_unit(x);
    }
    if n == 1 {
        return clamp_unit(points[0].y);
    }

    let x = clamp_unit(x);
    if x <= points[0].x {
        return clamp_unit(points[0].y);
    }
    if x >= points[n - 1].x {
        return clamp_unit(points[n - 1].y);
    }

    let j = find_segment(points, x);
    let p1 = points[j];
    let p2 = points[j + 1];

    let span = p2.x - p1.x;
    let t = if span.abs() < DEGENERATE_SPAN {
        0.0
    } else {
        ((x - p1.x) / span).clamp(0.0, 1.0)
    };

    let y = if n < 4 || interpolation == Interpolation::Linear {
        p1.y + t * (p2.y - p1.y)
    } else {
        let p0 = points[j.saturating_sub(1)].y;
        let p3 = points[(j + 2).min(n - 1)].y;
        catmull_rom(t, p0, p1.y, p2.y, p3)
    };

    clamp_unit(y)
}

/// Index `j` of the first segment `[p_j, p_j+1]` with `x <= p_j+1.x`.
///
/// A point's own x therefore resolves to the segment that ends there.
#[inline]
fn find_segment(points: &[ControlPoint], x: f32) -> usize {
    let n = points.len();
    points[1..].partition_point(|p| p.x < x).min(n - 2)
}

/// Uniform Catmull-Rom basis on scalar values.
#[inline]
fn catmull_rom(t: f32, p0: f32, p1: f32, p2: f32, p3: f32) -> f32 {
    let t2 = t * t;
    let t3 = t2 * t;

    0.5 * ((2.0 * p1)
        + (-p0 + p2) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (-p0 + 3.0 * p1 - 3.0 * p2 + p3) * t3)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn model(points: &[(f32, f32)]) -> CurveModel {
        CurveModel::try_from_points(
            points
                .iter()
                .map(|&(x, y)| ControlPoint::new(x, y))
                .collect(),
        )
        .unwrap()
    }

    fn s_curve() -> CurveModel {
        model(&[(0.0, 0.0), (0.25, 0.15), (0.5, 0.5), (0.75, 0.85), (1.0, 1.0)])
    }

    #[test]
    fn test_identity_five_point_midpoint() {
        let m = CurveModel::new();
        assert!((evaluate(&m, 0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_identity_five_point_interior_segments_exact() {
        // Uniform spacing with real neighbors on both sides reproduces the line
        let m = CurveModel::new();
        for i in 25..=75 {
            let x = i as f32 / 100.0;
            assert!((evaluate(&m, x) - x).abs() < 1e-5, "x={}", x);
        }
    }

    #[test]
    fn test_identity_five_point_monotone() {
        let m = CurveModel::new();
        let mut prev = evaluate(&m, 0.0);
        for i in 1..=200 {
            let y = evaluate(&m, i as f32 / 200.0);
            assert!(y >= prev, "not monotone at step {}", i);
            prev = y;
        }
    }

    #[test]
    fn test_linear_for_fewer_than_four_points() {
        let m = model(&[(0.0, 0.0), (0.5, 0.8), (1.0, 1.0)]);
        assert!((evaluate(&m, 0.25) - 0.4).abs() < 1e-6);
        assert!((evaluate(&m, 0.75) - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_two_point_curve_interpolates() {
        let m = model(&[(0.0, 0.2), (1.0, 0.8)]);
        assert!((evaluate(&m, 0.5) - 0.5).abs() < 1e-6);
        assert!((evaluate(&m, 0.0) - 0.2).abs() < 1e-6);
        assert!((evaluate(&m, 1.0) - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_inverted_curve() {
        let m = model(&[(0.0, 1.0), (1.0, 0.0)]);
        assert!((evaluate(&m, 0.0) - 1.0).abs() < 1e-6);
        assert!((evaluate(&m, 1.0) - 0.0).abs() < 1e-6);
        assert!((evaluate(&m, 0.3) - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_passes_through_control_points() {
        let m = s_curve();
        for p in m.points() {
            let y = evaluate(&m, p.x);
            assert!((y - p.y).abs() < 1e-5, "at x={}: {} != {}", p.x, y, p.y);
        }
    }

    #[test]
    fn test_s_curve_increases_contrast() {
        let m = s_curve();
        assert!(evaluate(&m, 0.2) < 0.2, "Shadows not darkened");
        assert!(evaluate(&m, 0.8) > 0.8, "Highlights not brightened");
    }

    #[test]
    fn test_forced_linear_mode() {
        let m = s_curve();
        let y = evaluate_with(&m, 0.375, Interpolation::Linear);
        assert!((y - 0.325).abs() < 1e-6);
    }

    #[test]
    fn test_result_clamped() {
        // Steep neighbors make Catmull-Rom overshoot between the last two points
        let m = model(&[(0.0, 0.0), (0.1, 1.0), (0.2, 1.0), (0.3, 0.0), (1.0, 0.0)]);
        for i in 0..=200 {
            let y = evaluate(&m, i as f32 / 200.0);
            assert!((0.0..=1.0).contains(&y), "y={}", y);
        }
    }

    #[test]
    fn test_out_of_range_input_clamped() {
        let m = s_curve();
        assert_eq!(evaluate(&m, -1.0), evaluate(&m, 0.0));
        assert_eq!(evaluate(&m, 2.0), evaluate(&m, 1.0));
        assert_eq!(evaluate(&m, f32::NAN), evaluate(&m, 0.0));
    }

    #[test]
    fn test_find_segment_boundary_resolves_to_earlier() {
        let points = s_curve().points().to_vec();
        assert_eq!(find_segment(&points, 0.25), 0);
        assert_eq!(find_segment(&points, 0.26), 1);
        assert_eq!(find_segment(&points, 0.5), 1);
        assert_eq!(find_segment(&points, 0.99), 3);
    }

    #[test]
    fn test_degenerate_span_uses_start() {
        let points = vec![
            ControlPoint::new(0.0, 0.0),
            ControlPoint::new(0.5, 0.2),
            ControlPoint::new(0.5, 0.9),
            ControlPoint::new(1.0, 1.0),
        ];
        let y = evaluate_points(&points, 0.5, Interpolation::Linear);
        assert!((y - 0.2).abs() < 1e-6);
        assert!(evaluate_points(&points, 0.75, Interpolation::CatmullRom).is_finite());
    }

    #[test]
    fn test_degenerate_slices() {
        assert_eq!(evaluate_points(&[], 0.3, Interpolation::CatmullRom), 0.3);
        let single = [ControlPoint::new(0.5, 0.7)];
        assert_eq!(evaluate_points(&single, 0.1, Interpolation::CatmullRom), 0.7);
    }

    #[test]
    fn test_interpolation_serde_names() {
        let name = variant_name(Interpolation::CatmullRom);
        assert_eq!(name, "catmull-rom");
        assert_eq!(variant_name(Interpolation::Linear), "linear");
    }

    /// Check a variant deserializes from its expected name.
    fn variant_name(value: Interpolation) -> String {
        use serde::de::value::{Error, StrDeserializer};
        use serde::de::IntoDeserializer;

        let name = match value {
            Interpolation::Linear => "linear",
            Interpolation::CatmullRom => "catmull-rom",
        };
        let de: StrDeserializer<'_, Error> = name.into_deserializer();
        let parsed = Interpolation::deserialize(de).unwrap();
        assert_eq!(parsed, value);
        name.to_string()
    }

    #[test]
    fn test_interpolation_cubic_alias() {
        use serde::de::value::{Error, StrDeserializer};
        use serde::de::IntoDeserializer;

        let de: StrDeserializer<'_, Error> = "cubic".into_deserializer();
        assert_eq!(Interpolation::deserialize(de).unwrap(), Interpolation::CatmullRom);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
