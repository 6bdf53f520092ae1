//! Tone curve editing and evaluation.
//!
//! A curve starts life as a [`CurveModel`], an ordered list of control points
//! whose mutation API keeps the endpoints pinned to black and white and the
//! interior points spaced at least [`MIN_SPACING`] apart. Everything
//! downstream is a pure function of a model snapshot:
//!
//! - [`evaluate`] - Catmull-Rom (or linear) spline through the control points
//! - [`sample`] - evenly spaced evaluation into a [`Curve1D`]
//! - [`ToneCurveLut`] - 256-entry 8-bit table for separable application
//!
//! Curves travel across the UI boundary as `"X,Y;X,Y;..."` strings with
//! components quantized to 0-255 (see [`CurveModel::try_parse`]).

mod model;
mod sampler;
mod serial;
mod spline;
mod tone;

pub use model::{CurveModel, Smoothing, MIN_SPACING};
pub use sampler::{sample, sample_with, Curve1D, ToneCurveLut, DEFAULT_STEPS};
pub use spline::{evaluate, evaluate_with, Interpolation};
pub use tone::ToneOptions;

pub(crate) use spline::evaluate_points;
pub(crate) use tone::Shaper;

use thiserror::Error;

/// Error types for curve construction and parsing.
///
/// Interactive edits never produce these: [`CurveModel`] mutations clamp or
/// reject silently. They surface only from the fallible constructors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CurveError {
    /// The curve string contains no control points.
    #[error("Curve string contains no control points")]
    Empty,

    /// A pair is not of the form `X,Y`.
    #[error("Malformed control point pair: {0:?}")]
    MalformedPair(String),

    /// A component is not an integer in 0-255.
    #[error("Invalid control point component {0:?} (expected an integer 0-255)")]
    InvalidComponent(String),

    /// Fewer than two control points.
    #[error("A curve needs at least 2 control points, got {0}")]
    TooFewPoints(usize),

    /// A coordinate is NaN or infinite.
    #[error("Control point {0} has a non-finite coordinate")]
    NonFinite(usize),

    /// The first point does not sit at x = 0.
    #[error("First control point must have x = 0, got {0}")]
    StartNotAtBlack(f32),

    /// The last point does not sit at x = 1.
    #[error("Last control point must have x = 1, got {0}")]
    EndNotAtWhite(f32),

    /// Two neighboring points are closer than [`MIN_SPACING`] in x.
    #[error("Control point {0} is closer than the minimum spacing to its successor")]
    TooClose(usize),
}
