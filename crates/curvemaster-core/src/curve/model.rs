//! Control point container with invariant-checked mutation.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::CurveError;
use crate::{clamp_unit, ControlPoint};

/// Minimum horizontal distance between neighboring control points.
pub const MIN_SPACING: f32 = 0.01;

/// Slack for float round-off when comparing against [`MIN_SPACING`]
/// (e.g. 0.26 - 0.25 in f32 lands just under 0.01).
const SPACING_TOLERANCE: f32 = 1e-5;

/// Largest per-iteration y change allowed by anti-clipping smoothing.
const MAX_SMOOTHING_STEP: f32 = 0.1;

/// Upper bound on smoothing passes.
const MAX_SMOOTHING_ITERATIONS: u32 = 10;

/// An ordered, validated set of tone curve control points.
///
/// Invariants, upheld by every constructor and mutation:
/// - at least 2 points
/// - first point at x = 0, last point at x = 1
/// - neighbors at least [`MIN_SPACING`] apart in x
/// - every y in [0, 1]
///
/// Models parsed from 8-bit curve strings only guarantee strictly increasing
/// x (one 8-bit step apart), since quantization can pull points that were
/// exactly [`MIN_SPACING`] apart to 2/255. Edits on such a model still
/// respect [`MIN_SPACING`] wherever the neighbors leave room.
///
/// Mutations never fail loudly: out-of-range input is clamped and edits that
/// would break an invariant are ignored, so an interactive editor can forward
/// raw pointer positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ControlPoint>", into = "Vec<ControlPoint>")]
pub struct CurveModel {
    points: Vec<ControlPoint>,
}

impl Default for CurveModel {
    /// The 5-point identity curve the composite editor opens with.
    fn default() -> Self {
        Self {
            points: vec![
                ControlPoint::new(0.0, 0.0),
                ControlPoint::new(0.25, 0.25),
                ControlPoint::new(0.5, 0.5),
                ControlPoint::new(0.75, 0.75),
                ControlPoint::new(1.0, 1.0),
            ],
        }
    }
}

#[allow(clippy::len_without_is_empty)]
impl CurveModel {
    /// Create the default 5-point identity curve.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the 2-point linear curve `[(0,0), (1,1)]`.
    pub fn linear() -> Self {
        Self {
            points: vec![ControlPoint::new(0.0, 0.0), ControlPoint::new(1.0, 1.0)],
        }
    }

    /// Build a model from points sorted by x.
    ///
    /// Endpoints within 1e-6 of 0 and 1 are snapped exactly; y values are
    /// clamped. Anything else that breaks an invariant is an error.
    pub fn try_from_points(points: Vec<ControlPoint>) -> Result<Self, CurveError> {
        Self::try_from_points_spaced(points, MIN_SPACING)
    }

    /// [`try_from_points`](Self::try_from_points) with a custom minimum
    /// neighbor spacing.
    pub(crate) fn try_from_points_spaced(
        mut points: Vec<ControlPoint>,
        min_spacing: f32,
    ) -> Result<Self, CurveError> {
        if points.len() < 2 {
            return Err(CurveError::TooFewPoints(points.len()));
        }
        if let Some(index) = points
            .iter()
            .position(|p| !p.x.is_finite() || !p.y.is_finite())
        {
            return Err(CurveError::NonFinite(index));
        }

        let last = points.len() - 1;
        if points[0].x.abs() > 1e-6 {
            return Err(CurveError::StartNotAtBlack(points[0].x));
        }
        if (points[last].x - 1.0).abs() > 1e-6 {
            return Err(CurveError::EndNotAtWhite(points[last].x));
        }
        points[0].x = 0.0;
        points[last].x = 1.0;

        if let Some(index) = points
            .windows(2)
            .position(|w| w[1].x - w[0].x < min_spacing - SPACING_TOLERANCE)
        {
            return Err(CurveError::TooClose(index));
        }

        for p in &mut points {
            p.y = clamp_unit(p.y);
        }

        Ok(Self { points })
    }

    /// Read-only view of the control points, sorted by x.
    pub fn points(&self) -> &[ControlPoint] {
        &self.points
    }

    /// Number of control points (always at least 2).
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the curve is the 2-point identity (no adjustment).
    pub fn is_linear(&self) -> bool {
        if self.points.len() != 2 {
            return false;
        }
        let first = &self.points[0];
        let last = &self.points[1];
        first.y.abs() < f32::EPSILON && (last.y - 1.0).abs() < f32::EPSILON
    }

    /// Insert a point, keeping x order.
    ///
    /// Returns the new point's index, or `None` if the point would land on an
    /// endpoint or closer than [`MIN_SPACING`] to a neighbor.
    pub fn insert(&mut self, x: f32, y: f32) -> Option<usize> {
        let x = clamp_unit(x);
        let y = clamp_unit(y);

        let index = self
            .points
            .iter()
            .position(|p| x < p.x)
            .unwrap_or(self.points.len());

        // Endpoints are pinned, so new points always land strictly inside.
        if index == 0 || index >= self.points.len() {
            return None;
        }

        let prev = self.points[index - 1].x;
        let next = self.points[index].x;
        if x < prev + MIN_SPACING - SPACING_TOLERANCE || x > next - MIN_SPACING + SPACING_TOLERANCE
        {
            return None;
        }

        self.points.insert(index, ControlPoint::new(x, y));
        Some(index)
    }

    /// Move a point, clamping it into its legal region.
    ///
    /// The first point stays at x = 0 and the last at x = 1; interior points
    /// are held between their neighbors with [`MIN_SPACING`] clearance. y is
    /// clamped to [0, 1]. Returns the stored point, or `None` for an index
    /// out of range.
    pub fn move_point(&mut self, index: usize, x: f32, y: f32) -> Option<ControlPoint> {
        let last = self.points.len() - 1;
        if index > last {
            return None;
        }

        let x = if index == 0 {
            0.0
        } else if index == last {
            1.0
        } else {
            let prev = self.points[index - 1].x;
            let next = self.points[index + 1].x;
            let lo = prev + MIN_SPACING;
            let hi = next - MIN_SPACING;
            if lo > hi {
                (prev + next) * 0.5
            } else {
                // NaN falls through `max` to the lower bound
                x.max(lo).min(hi)
            }
        };

        let point = ControlPoint::new(x, clamp_unit(y));
        self.points[index] = point;
        Some(point)
    }

    /// Remove an interior point. Endpoints and out-of-range indices are ignored.
    pub fn remove(&mut self, index: usize) -> Option<ControlPoint> {
        if index == 0 || index >= self.points.len() - 1 {
            return None;
        }
        Some(self.points.remove(index))
    }

    /// Index of the point closest to `(x, y)` strictly within `threshold`.
    ///
    /// Ties go to the lower index.
    pub fn nearest(&self, x: f32, y: f32, threshold: f32) -> Option<usize> {
        let mut best = None;
        let mut best_distance = threshold;

        for (i, point) in self.points.iter().enumerate() {
            let distance = point.distance_to(x, y);
            if distance < best_distance {
                best_distance = distance;
                best = Some(i);
            }
        }

        best
    }

    /// Return a copy with interior y values smoothed.
    ///
    /// Each pass moves every interior point towards the 1-2-1 weighted
    /// average of itself and its neighbors. x never changes, so the result
    /// satisfies the same invariants.
    pub fn smoothed(&self, smoothing: &Smoothing) -> CurveModel {
        let iterations = smoothing.iterations();
        if self.points.len() < 3 || iterations == 0 {
            return self.clone();
        }

        let blend = smoothing.strength() * 0.3;
        let mut current = self.points.clone();
        let n = current.len();

        for _ in 0..iterations {
            let mut next = current.clone();

            for i in 1..n - 1 {
                let prev = current[i - 1].y;
                let curr = current[i].y;
                let following = current[i + 1].y;

                let averaged = prev * 0.25 + curr * 0.5 + following * 0.25;
                let mut y = curr * (1.0 - blend) + averaged * blend;

                if smoothing.anti_clipping {
                    let change = y - curr;
                    if change.abs() > MAX_SMOOTHING_STEP {
                        y = curr + MAX_SMOOTHING_STEP.copysign(change);
                    }

                    // Local extrema away from the ends keep most of their height
                    if i > 1 && i < n - 2 && (curr - prev) * (following - curr) < 0.0 {
                        y = curr * 0.7 + y * 0.3;
                    }
                }

                next[i].y = clamp_unit(y);
            }

            current = next;
        }

        CurveModel { points: current }
    }
}

impl TryFrom<Vec<ControlPoint>> for CurveModel {
    type Error = CurveError;

    fn try_from(points: Vec<ControlPoint>) -> Result<Self, Self::Error> {
        Self::try_from_points(points)
    }
}

impl From<CurveModel> for Vec<ControlPoint> {
    fn from(model: CurveModel) -> Self {
        model.points
    }
}

/// Control point smoothing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Smoothing {
    /// Smoothing strength (0.0 to 2.0)
    pub strength: f32,
    /// Number of passes (0 to 10)
    pub iterations: u32,
    /// Cap per-pass changes and protect local extrema
    pub anti_clipping: bool,
}

impl Default for Smoothing {
    fn default() -> Self {
        Self {
            strength: 0.5,
            iterations: 3,
            anti_clipping: true,
        }
    }
}

impl Smoothing {
    /// Strength clamped to 0.0-2.0.
    pub fn strength(&self) -> f32 {
        if !(0.0..=2.0).contains(&self.strength) {
            warn!(strength = self.strength, "Smoothing strength out of range, clamping");
        }
        if self.strength.is_nan() {
            0.0
        } else {
            self.strength.clamp(0.0, 2.0)
        }
    }

    /// Strength of the Gaussian filter run over finished curve tables.
    pub fn filter_strength(&self) -> f32 {
        self.strength() * 0.5
    }

    /// Iteration count clamped to 10.
    pub fn iterations(&self) -> u32 {
        if self.iterations > MAX_SMOOTHING_ITERATIONS {
            warn!(
                iterations = self.iterations,
                "Too many smoothing iterations, clamping"
            );
        }
        self.iterations.min(MAX_SMOOTHING_ITERATIONS)
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
