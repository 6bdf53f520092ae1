//! Tetrahedral sampling and the interpolation switch.

use serde::{Deserialize, Serialize};

use super::trilinear::axis;
use super::Lut3D;
use crate::clamp_unit;

/// How [`Lut3D::sample_with`] reads between grid vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LutInterpolation {
    /// Blend all 8 cell corners.
    #[default]
    Trilinear,
    /// Blend the 4 corners of the tetrahedron holding the input. Keeps the
    /// neutral axis on the cell diagonal.
    Tetrahedral,
}

impl Lut3D {
    /// Sample with the chosen interpolation.
    #[inline]
    pub fn sample_with(&self, r: f32, g: f32, b: f32, interpolation: LutInterpolation) -> [f32; 3] {
        match interpolation {
            LutInterpolation::Trilinear => self.sample(r, g, b),
            LutInterpolation::Tetrahedral => self.sample_tetrahedral(r, g, b),
        }
    }

    /// Tetrahedral sample at `(r, g, b)`, each clamped to [0, 1].
    ///
    /// The cell is split into six tetrahedra by ordering the red, green and
    /// blue fractions. Vertex inputs return the stored entry exactly.
    pub fn sample_tetrahedral(&self, r: f32, g: f32, b: f32) -> [f32; 3] {
        let n = self.resolution() - 1;
        let (r0, r1, fr) = axis(r, n);
        let (g0, g1, fg) = axis(g, n);
        let (b0, b1, fb) = axis(b, n);

        let c000 = self.at(r0, g0, b0);
        let c111 = self.at(r1, g1, b1);

        // Walk from c000 to c111 along the axes in decreasing fraction order
        let (first, second, (w0, w1, w2)) = if fr > fg {
            if fg > fb {
                (self.at(r1, g0, b0), self.at(r1, g1, b0), (fr, fg, fb))
            } else if fr > fb {
                (self.at(r1, g0, b0), self.at(r1, g0, b1), (fr, fb, fg))
            } else {
                (self.at(r0, g0, b1), self.at(r1, g0, b1), (fb, fr, fg))
            }
        } else if fg > fb {
            if fr > fb {
                (self.at(r0, g1, b0), self.at(r1, g1, b0), (fg, fr, fb))
            } else {
                (self.at(r0, g1, b0), self.at(r0, g1, b1), (fg, fb, fr))
            }
        } else {
            (self.at(r0, g0, b1), self.at(r0, g1, b1), (fb, fg, fr))
        };

        let mut out = [0.0; 3];
        for c in 0..3 {
            let v = c000[c]
                + w0 * (first[c] - c000[c])
                + w1 * (second[c] - first[c])
                + w2 * (c111[c] - second[c]);
            out[c] = clamp_unit(v);
        }
        out
    }
}
