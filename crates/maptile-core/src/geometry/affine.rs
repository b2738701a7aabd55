//! 2x3 affine transforms.
//!
//! A transform maps a source point to a destination point:
//!
//! ```text
//! dst_x = m[0][0] * x + m[0][1] * y + m[0][2]
//! dst_y = m[1][0] * x + m[1][1] * y + m[1][2]
//! ```

/// Row-major 2x3 affine matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    pub m: [[f64; 3]; 2],
}

impl AffineTransform {
    pub fn identity() -> Self {
        Self {
            m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        }
    }

    /// Rotation by `angle_degrees` about `(cx, cy)`, positive angles turning
    /// counter-clockwise on screen (y axis pointing down).
    ///
    /// ```text
    /// a = scale * cos(angle), b = scale * sin(angle)
    /// | a   b   (1 - a) * cx - b * cy |
    /// | -b  a   b * cx + (1 - a) * cy |
    /// ```
    pub fn rotation(cx: f64, cy: f64, angle_degrees: f64, scale: f64) -> Self {
        let angle_rad = angle_degrees.to_radians();
        let a = scale * angle_rad.cos();
        let b = scale * angle_rad.sin();
        Self {
            m: [
                [a, b, (1.0 - a) * cx - b * cy],
                [-b, a, b * cx + (1.0 - a) * cy],
            ],
        }
    }

    /// Shift the output by `(dx, dy)`.
    pub fn translated(mut self, dx: f64, dy: f64) -> Self {
        self.m[0][2] += dx;
        self.m[1][2] += dy;
        self
    }

    #[inline]
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let m = &self.m;
        (
            m[0][0] * x + m[0][1] * y + m[0][2],
            m[1][0] * x + m[1][1] * y + m[1][2],
        )
    }

    /// Inverse transform, or `None` when the linear part is singular.
    pub fn invert(&self) -> Option<Self> {
        let [[a, b, tx], [c, d, ty]] = self.m;
        let det = a * d - b * c;
        if det.abs() < f64::EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;
        let (ia, ib, ic, id) = (d * inv_det, -b * inv_det, -c * inv_det, a * inv_det);
        Some(Self {
            m: [
                [ia, ib, -(ia * tx + ib * ty)],
                [ic, id, -(ic * tx + id * ty)],
            ],
        })
    }
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::identity()
    }
}
