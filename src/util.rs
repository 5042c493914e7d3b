use std::ops::MulAssign;

/// Magnetization vector `[Mx, My, Mz]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Magnetization(pub [f64; 3]);

impl Magnetization {
    /// Fully relaxed: all magnetization is longitudinal.
    pub fn relaxed(pd: f64) -> Self {
        Self([0.0, 0.0, pd])
    }

    /// Angle between the magnetization and the z-axis, `rad`
    pub fn angle(&self) -> f64 {
        let norm = self.norm();
        if norm == 0.0 {
            0.0
        } else {
            // Clamp because error can build up during rotations
            (self.0[2] / norm).clamp(-1.0, 1.0).acos()
        }
    }

    pub fn norm(&self) -> f64 {
        (self.0[0] * self.0[0] + self.0[1] * self.0[1] + self.0[2] * self.0[2]).sqrt()
    }
}

/// Rotation matrix, right-handed around the given axis.
pub struct Rotation([[f64; 3]; 3]);

impl Rotation {
    /// `axis` must be normalized.
    pub fn new(axis: [f64; 3], angle: f64) -> Self {
        let [x, y, z] = axis;
        let (s, c) = angle.sin_cos();
        let t = 1.0 - c;
        Self([
            [c + x * x * t, x * y * t - z * s, x * z * t + y * s],
            [y * x * t + z * s, c + y * y * t, y * z * t - x * s],
            [z * x * t - y * s, z * y * t + x * s, c + z * z * t],
        ])
    }

    /// Cheaper version of `Rotation::new([0, 0, 1], angle)`
    pub fn about_z(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self([[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]])
    }
}

impl MulAssign<&Rotation> for Magnetization {
    fn mul_assign(&mut self, rhs: &Rotation) {
        let m = &rhs.0;
        let x = m[0][0] * self.0[0] + m[0][1] * self.0[1] + m[0][2] * self.0[2];
        let y = m[1][0] * self.0[0] + m[1][1] * self.0[1] + m[1][2] * self.0[2];
        let z = m[2][0] * self.0[0] + m[2][1] * self.0[1] + m[2][2] * self.0[2];
        self.0 = [x, y, z];
    }
}
