//! Frame-to-frame camera warp applied to predicted track states.

use nalgebra::{Matrix2, Matrix3, Vector3};

use crate::tracker::rect::Rect;

/// Smallest extent a warped box may collapse to.
const MIN_WARPED_EXTENT: f64 = 1e-3;

/// Planar warp mapping previous-frame pixel coordinates to current-frame ones.
///
/// Stored as a 3x3 homography; affine warps have a last row of `[0, 0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraWarp {
    matrix: Matrix3<f64>,
}

impl Default for CameraWarp {
    fn default() -> Self {
        Self::identity()
    }
}

impl CameraWarp {
    pub fn identity() -> Self {
        Self {
            matrix: Matrix3::identity(),
        }
    }

    pub fn translation(dx: f32, dy: f32) -> Self {
        let mut matrix = Matrix3::identity();
        matrix[(0, 2)] = dx as f64;
        matrix[(1, 2)] = dy as f64;
        Self { matrix }
    }

    /// Build from a 2x3 affine matrix `[[a, b, tx], [c, d, ty]]`.
    pub fn from_affine(m: [[f32; 3]; 2]) -> Self {
        let matrix = Matrix3::new(
            m[0][0] as f64,
            m[0][1] as f64,
            m[0][2] as f64,
            m[1][0] as f64,
            m[1][1] as f64,
            m[1][2] as f64,
            0.0,
            0.0,
            1.0,
        );
        Self { matrix }
    }

    /// Build from a full 3x3 homography. Returns `None` when the matrix is
    /// non-finite or its projective scale is zero.
    pub fn from_homography(m: [[f32; 3]; 3]) -> Option<Self> {
        let matrix = Matrix3::from_fn(|r, c| m[r][c] as f64);
        if matrix.iter().any(|v| !v.is_finite()) || matrix[(2, 2)].abs() < f64::EPSILON {
            return None;
        }
        Some(Self {
            matrix: matrix / matrix[(2, 2)],
        })
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.matrix
    }

    pub fn is_identity(&self) -> bool {
        self.matrix == Matrix3::identity()
    }

    /// Map a single point. Points on the line at infinity are returned unchanged.
    pub fn transform_point(&self, x: f64, y: f64) -> (f64, f64) {
        let p = self.matrix * Vector3::new(x, y, 1.0);
        if p.z.abs() < f64::EPSILON {
            return (x, y);
        }
        (p.x / p.z, p.y / p.z)
    }

    /// Linear part used to rotate/scale velocities and planar covariance.
    pub fn linear_part(&self) -> Matrix2<f64> {
        self.matrix.fixed_view::<2, 2>(0, 0).into_owned()
    }

    /// Warp a box by its four corners and return their axis-aligned bounds.
    pub fn warp_rect(&self, rect: &Rect) -> Rect {
        let [x1, y1, x2, y2] = rect.to_tlbr().map(|v| v as f64);
        let corners = [
            self.transform_point(x1, y1),
            self.transform_point(x2, y1),
            self.transform_point(x1, y2),
            self.transform_point(x2, y2),
        ];

        let min_x = corners.iter().map(|c| c.0).fold(f64::INFINITY, f64::min);
        let min_y = corners.iter().map(|c| c.1).fold(f64::INFINITY, f64::min);
        let max_x = corners.iter().map(|c| c.0).fold(f64::NEG_INFINITY, f64::max);
        let max_y = corners.iter().map(|c| c.1).fold(f64::NEG_INFINITY, f64::max);

        Rect::new(
            min_x as f32,
            min_y as f32,
            (max_x - min_x).max(MIN_WARPED_EXTENT) as f32,
            (max_y - min_y).max(MIN_WARPED_EXTENT) as f32,
        )
    }
}
