//! Trilinear sampling between LUT grid vertices.

use super::Lut3D;
use crate::clamp_unit;

/// Inputs this close to a grid coordinate are read from the vertex itself.
const GRID_SNAP: f32 = 1e-4;

impl Lut3D {
    /// Sample the LUT at `(r, g, b)`, each clamped to [0, 1].
    ///
    /// Interpolates the 8 surrounding vertices along red, then green, then
    /// blue. Inputs on a grid vertex return that vertex's entry exactly.
    #[inline]
    pub fn sample(&self, r: f32, g: f32, b: f32) -> [f32; 3] {
        let n = self.resolution() - 1;
        let (r0, r1, tr) = axis(r, n);
        let (g0, g1, tg) = axis(g, n);
        let (b0, b1, tb) = axis(b, n);

        let c000 = self.at(r0, g0, b0);
        let c100 = self.at(r1, g0, b0);
        let c010 = self.at(r0, g1, b0);
        let c110 = self.at(r1, g1, b0);
        let c001 = self.at(r0, g0, b1);
        let c101 = self.at(r1, g0, b1);
        let c011 = self.at(r0, g1, b1);
        let c111 = self.at(r1, g1, b1);

        // Along red
        let c00 = lerp3(c000, c100, tr);
        let c10 = lerp3(c010, c110, tr);
        let c01 = lerp3(c001, c101, tr);
        let c11 = lerp3(c011, c111, tr);

        // Along green
        let c0 = lerp3(c00, c10, tg);
        let c1 = lerp3(c01, c11, tg);

        // Along blue
        let out = lerp3(c0, c1, tb);
        [clamp_unit(out[0]), clamp_unit(out[1]), clamp_unit(out[2])]
    }

    /// [`sample`](Self::sample) on an RGB triple.
    #[inline]
    pub fn sample_rgb(&self, rgb: [f32; 3]) -> [f32; 3] {
        self.sample(rgb[0], rgb[1], rgb[2])
    }
}

/// Lower index, upper index (clamped to `n`), and fraction along one axis.
#[inline]
pub(super) fn axis(v: f32, n: usize) -> (usize, usize, f32) {
    let pos = clamp_unit(v) * n as f32;
    let nearest = pos.round();
    let pos = if (pos - nearest).abs() < GRID_SNAP {
        nearest
    } else {
        pos
    };

    let i0 = (pos.floor() as usize).min(n);
    let i1 = (i0 + 1).min(n);
    (i0, i1, pos - i0 as f32)
}

#[inline]
fn lerp3(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}
