//! `"X,Y;X,Y;..."` curve strings.
//!
//! Components are integers in 0-255, so a model survives a round trip only
//! up to 1/255 quantization. Parsed points need only be one step apart:
//! points [`MIN_SPACING`](super::MIN_SPACING) apart can export as 2/255.

use std::fmt;
use std::str::FromStr;

use tracing::warn;

use super::{CurveError, CurveModel};
use crate::{clamp_unit, ControlPoint};

/// One 8-bit step in normalized x.
const STEP: f32 = 1.0 / 255.0;

impl CurveModel {
    /// Parse a curve string.
    ///
    /// Whitespace around pairs and components is ignored, as are empty
    /// segments (so a trailing `;` is fine). Pairs are sorted by X before
    /// the model invariants are checked, with neighbors allowed down to one
    /// 8-bit step apart.
    pub fn try_parse(s: &str) -> Result<Self, CurveError> {
        let mut points = Vec::new();

        for pair in s.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let (x, y) = pair
                .split_once(',')
                .ok_or_else(|| CurveError::MalformedPair(pair.to_string()))?;
            points.push(ControlPoint::new(
                parse_component(x)?,
                parse_component(y)?,
            ));
        }

        if points.is_empty() {
            return Err(CurveError::Empty);
        }

        points.sort_by(|a, b| a.x.total_cmp(&b.x));
        Self::try_from_points_spaced(points, STEP)
    }

    /// Parse a curve string, falling back to the linear curve on error.
    pub fn parse_or_identity(s: &str) -> Self {
        match Self::try_parse(s) {
            Ok(model) => model,
            Err(err) => {
                warn!(input = s, error = %err, "Invalid curve string, using identity");
                Self::linear()
            }
        }
    }

    /// Export as a curve string, rounding each component to 0-255.
    pub fn to_curve_string(&self) -> String {
        self.to_string()
    }
}

fn parse_component(s: &str) -> Result<f32, CurveError> {
    let s = s.trim();
    s.parse::<u8>()
        .map(|v| v as f32 / 255.0)
        .map_err(|_| CurveError::InvalidComponent(s.to_string()))
}

#[inline]
fn quantize(v: f32) -> u8 {
    (clamp_unit(v) * 255.0).round() as u8
}

impl fmt::Display for CurveModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, p) in self.points().iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            write!(f, "{},{}", quantize(p.x), quantize(p.y))?;
        }
        Ok(())
    }
}

impl FromStr for CurveModel {
    type Err = CurveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_parse(s)
    }
}
