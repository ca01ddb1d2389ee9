//! 3×3 matrices for color-space transforms.

/// Row-major 3×3 matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix3(pub [[f64; 3]; 3]);

/// Linear sRGB → XYZ (D65).
pub const SRGB_TO_XYZ: Matrix3 = Matrix3([
    [0.412_456_4, 0.357_576_1, 0.180_437_5],
    [0.212_672_9, 0.715_152_2, 0.072_175_0],
    [0.019_333_9, 0.119_192_0, 0.950_304_1],
]);

/// XYZ (D65) → linear sRGB.
pub const XYZ_TO_SRGB: Matrix3 = Matrix3([
    [3.240_454_2, -1.537_138_5, -0.498_531_4],
    [-0.969_266_0, 1.876_010_8, 0.041_556_0],
    [0.055_643_4, -0.204_025_9, 1.057_225_2],
]);

/// Bradford cone-response matrix (XYZ → LMS).
pub const BRADFORD: Matrix3 = Matrix3([
    [0.8951, 0.2664, -0.1614],
    [-0.7502, 1.7135, 0.0367],
    [0.0389, -0.0685, 1.0296],
]);

/// Inverse Bradford matrix (LMS → XYZ).
pub const BRADFORD_INV: Matrix3 = Matrix3([
    [0.986_992_9, -0.147_054_3, 0.159_962_7],
    [0.432_305_3, 0.518_360_3, 0.049_291_2],
    [-0.008_528_7, 0.040_042_8, 0.968_486_7],
]);

impl Matrix3 {
    /// The identity matrix.
    pub const IDENTITY: Self = Self([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);

    /// Diagonal matrix with the given entries.
    #[must_use]
    pub const fn diagonal(d: [f64; 3]) -> Self {
        Self([[d[0], 0.0, 0.0], [0.0, d[1], 0.0], [0.0, 0.0, d[2]]])
    }

    /// Matrix × column vector.
    #[must_use]
    pub fn mul_vec(&self, v: [f64; 3]) -> [f64; 3] {
        let m = &self.0;
        [
            m[0][0].mul_add(v[0], m[0][1].mul_add(v[1], m[0][2] * v[2])),
            m[1][0].mul_add(v[0], m[1][1].mul_add(v[1], m[1][2] * v[2])),
            m[2][0].mul_add(v[0], m[2][1].mul_add(v[1], m[2][2] * v[2])),
        ]
    }

    /// Matrix product `self × rhs`.
    #[must_use]
    pub fn mul(&self, rhs: &Self) -> Self {
        let mut out = [[0.0; 3]; 3];
        for (i, row) in out.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = (0..3).map(|k| self.0[i][k] * rhs.0[k][j]).sum();
            }
        }
        Self(out)
    }

    /// Transposed matrix.
    #[must_use]
    pub fn transpose(&self) -> Self {
        let m = &self.0;
        Self([
            [m[0][0], m[1][0], m[2][0]],
            [m[0][1], m[1][1], m[2][1]],
            [m[0][2], m[1][2], m[2][2]],
        ])
    }

    /// Determinant.
    #[must_use]
    pub fn determinant(&self) -> f64 {
        let m = &self.0;
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }

    /// Inverse via the adjugate, or `None` for a singular matrix.
    #[must_use]
    pub fn inverse(&self) -> Option<Self> {
        let det = self.determinant();
        if det.abs() < 1e-12 {
            return None;
        }
        let m = &self.0;
        let cofactor = |r0: usize, r1: usize, c0: usize, c1: usize| {
            m[r0][c0] * m[r1][c1] - m[r0][c1] * m[r1][c0]
        };
        let adj = [
            [cofactor(1, 2, 1, 2), -cofactor(0, 2, 1, 2), cofactor(0, 1, 1, 2)],
            [-cofactor(1, 2, 0, 2), cofactor(0, 2, 0, 2), -cofactor(0, 1, 0, 2)],
            [cofactor(1, 2, 0, 1), -cofactor(0, 2, 0, 1), cofactor(0, 1, 0, 1)],
        ];
        let mut out = [[0.0; 3]; 3];
        for (i, row) in out.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = adj[i][j] / det;
            }
        }
        Some(Self(out))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn assert_close(a: &Matrix3, b: &Matrix3, tol: f64) {
        for i in 0..3 {
            for j in 0..3 {
                assert!(
                    (a.0[i][j] - b.0[i][j]).abs() < tol,
                    "mismatch at ({i},{j}): {} vs {}",
                    a.0[i][j],
                    b.0[i][j]
                );
            }
        }
    }

    #[test]
    fn test_bradford_inverse_matches_constant() {
        let inv = BRADFORD.inverse().unwrap();
        assert_close(&inv, &BRADFORD_INV, 1e-5);
    }

    #[test]
    fn test_srgb_matrices_are_inverse() {
        let product = SRGB_TO_XYZ.mul(&XYZ_TO_SRGB);
        assert_close(&product, &Matrix3::IDENTITY, 1e-5);
    }

    #[test]
    fn test_singular_has_no_inverse() {
        let m = Matrix3([[1.0, 2.0, 3.0], [2.0, 4.0, 6.0], [0.0, 1.0, 1.0]]);
        assert!(m.inverse().is_none());
    }

    #[test]
    fn test_diagonal_mul_vec() {
        let v = Matrix3::diagonal([2.0, 3.0, 4.0]).mul_vec([1.0, 1.0, 0.5]);
        assert_eq!(v, [2.0, 3.0, 2.0]);
    }

    #[test]
    fn test_transpose_twice_is_identity() {
        assert_eq!(BRADFORD.transpose().transpose(), BRADFORD);
    }
}
