//! Kalman filter for bounding box tracking using ndarray and a manual/nalgebra-based inverse.
//!
//! The state is the 8-dimensional `[cx, cy, a, h, vx, vy, va, vh]`: box
//! center, aspect ratio (w/h), height and their per-frame velocities. Motion
//! is constant-velocity and the box is observed directly.

use ndarray::{Array1, Array2};
use tracing::warn;

use crate::tracker::camera_motion::CameraWarp;
use crate::tracker::config::MotionNoise;
use crate::tracker::rect::Rect;

/// Lower bound enforced on the aspect ratio term. Far below any real box,
/// a 1x2000 sliver has an aspect ratio of 5e-4.
const MIN_ASPECT: f64 = 1e-6;
/// Lower bound enforced on the height term, in pixels.
const MIN_HEIGHT: f64 = 1e-3;

#[derive(Debug, Clone)]
pub struct KalmanFilter {
    motion_mat: Array2<f64>,
    update_mat: Array2<f64>,
    std_weight_position: f64,
    std_weight_velocity: f64,
}

impl Default for KalmanFilter {
    fn default() -> Self {
        Self::new(MotionNoise::default())
    }
}

impl KalmanFilter {
    pub fn new(noise: MotionNoise) -> Self {
        let ndim = 4;
        let mut motion_mat = Array2::eye(2 * ndim);
        for i in 0..ndim {
            motion_mat[[i, ndim + i]] = 1.0;
        }

        let mut update_mat = Array2::zeros((ndim, 2 * ndim));
        for i in 0..ndim {
            update_mat[[i, i]] = 1.0;
        }

        Self {
            motion_mat,
            update_mat,
            std_weight_position: noise.std_weight_position,
            std_weight_velocity: noise.std_weight_velocity,
        }
    }

    /// Create a track state from an unassociated measurement in XYAH form.
    ///
    /// Velocities start at zero with a wide spread so the first few
    /// corrections dominate.
    pub fn initiate(&self, measurement: [f64; 4]) -> (Array1<f64>, Array2<f64>) {
        let mut mean = Array1::zeros(8);
        for i in 0..4 {
            mean[i] = measurement[i];
        }
        clamp_extent(&mut mean);

        let h = mean[3];
        let std = [
            2.0 * self.std_weight_position * h,
            2.0 * self.std_weight_position * h,
            1e-2,
            2.0 * self.std_weight_position * h,
            10.0 * self.std_weight_velocity * h,
            10.0 * self.std_weight_velocity * h,
            1e-5,
            10.0 * self.std_weight_velocity * h,
        ];

        (mean, diag(&std))
    }

    pub fn predict(
        &self,
        mean: &Array1<f64>,
        covariance: &Array2<f64>,
    ) -> (Array1<f64>, Array2<f64>) {
        let h = mean[3];
        let std = [
            self.std_weight_position * h,
            self.std_weight_position * h,
            1e-2,
            self.std_weight_position * h,
            self.std_weight_velocity * h,
            self.std_weight_velocity * h,
            1e-5,
            self.std_weight_velocity * h,
        ];
        let motion_cov = diag(&std);

        let mut new_mean = self.motion_mat.dot(mean);
        clamp_extent(&mut new_mean);
        let new_covariance = self.motion_mat.dot(covariance).dot(&self.motion_mat.t()) + motion_cov;

        (new_mean, new_covariance)
    }

    /// Project the state into measurement space.
    pub fn project(
        &self,
        mean: &Array1<f64>,
        covariance: &Array2<f64>,
    ) -> (Array1<f64>, Array2<f64>) {
        let h = mean[3];
        let std = [
            self.std_weight_position * h,
            self.std_weight_position * h,
            1e-1,
            self.std_weight_position * h,
        ];
        let innovation_cov = diag(&std);

        let mean_proj = self.update_mat.dot(mean);
        let covariance_proj =
            self.update_mat.dot(covariance).dot(&self.update_mat.t()) + innovation_cov;

        (mean_proj, covariance_proj)
    }

    /// Correct the state with an associated measurement in XYAH form.
    ///
    /// A singular innovation covariance leaves the state untouched.
    pub fn update(
        &self,
        mean: &Array1<f64>,
        covariance: &Array2<f64>,
        measurement: [f64; 4],
    ) -> (Array1<f64>, Array2<f64>) {
        let (projected_mean, projected_cov) = self.project(mean, covariance);

        let Some(s_inv) = invert_4x4(&projected_cov) else {
            warn!("singular innovation covariance, skipping correction");
            return (mean.clone(), covariance.clone());
        };

        let measurement_arr = Array1::from_vec(measurement.to_vec());
        let innovation = measurement_arr - projected_mean;

        // K = P * H^T * S^-1
        // Since H is [I 0], P * H^T is the first 4 columns of P (8x4).
        let pht = covariance.dot(&self.update_mat.t());
        let kalman_gain = pht.dot(&s_inv);

        let mut new_mean = mean + &kalman_gain.dot(&innovation);
        if new_mean[2] < MIN_ASPECT || new_mean[3] < MIN_HEIGHT {
            warn!(
                aspect = new_mean[2],
                height = new_mean[3],
                "correction drove box extent non-positive, clamping"
            );
        }
        clamp_extent(&mut new_mean);
        let new_covariance = covariance - &kalman_gain.dot(&projected_cov).dot(&kalman_gain.t());

        (new_mean, new_covariance)
    }

    /// Move a state into the current camera frame.
    ///
    /// The box is warped by its corners, the planar velocity and the planar
    /// blocks of the covariance are carried through the warp's linear part.
    pub fn apply_warp(
        &self,
        mean: &Array1<f64>,
        covariance: &Array2<f64>,
        warp: &CameraWarp,
    ) -> (Array1<f64>, Array2<f64>) {
        if warp.is_identity() {
            return (mean.clone(), covariance.clone());
        }

        let rect = state_to_rect(mean);
        let [cx, cy, a, h] = warp.warp_rect(&rect).to_xyah();
        let r = warp.linear_part();

        let mut new_mean = mean.clone();
        new_mean[0] = cx as f64;
        new_mean[1] = cy as f64;
        new_mean[2] = a as f64;
        new_mean[3] = h as f64;
        let (vx, vy) = (mean[4], mean[5]);
        new_mean[4] = r[(0, 0)] * vx + r[(0, 1)] * vy;
        new_mean[5] = r[(1, 0)] * vx + r[(1, 1)] * vy;
        new_mean[7] = mean[7] * r.determinant().abs().sqrt();
        clamp_extent(&mut new_mean);

        let mut transform = Array2::<f64>::eye(8);
        for offset in [0, 4] {
            for i in 0..2 {
                for j in 0..2 {
                    transform[[offset + i, offset + j]] = r[(i, j)];
                }
            }
        }
        let new_covariance = transform.dot(covariance).dot(&transform.t());

        (new_mean, new_covariance)
    }
}

/// Read the box encoded in the first four state terms.
pub fn state_to_rect(mean: &Array1<f64>) -> Rect {
    Rect::from_xyah(
        mean[0] as f32,
        mean[1] as f32,
        mean[2] as f32,
        mean[3] as f32,
    )
}

pub fn rect_to_measurement(rect: &Rect) -> [f64; 4] {
    rect.to_xyah().map(f64::from)
}

fn clamp_extent(mean: &mut Array1<f64>) {
    for (i, floor) in [(2, MIN_ASPECT), (3, MIN_HEIGHT)] {
        if !(mean[i] >= floor) {
            mean[i] = floor;
        }
    }
}

fn diag(std: &[f64]) -> Array2<f64> {
    let mut m = Array2::zeros((std.len(), std.len()));
    for (i, s) in std.iter().enumerate() {
        m[[i, i]] = s * s;
    }
    m
}

/// Invert a 4x4 matrix using nalgebra (pure Rust).
fn invert_4x4(m: &Array2<f64>) -> Option<Array2<f64>> {
    let nm = nalgebra::Matrix4::from_fn(|i, j| m[[i, j]]);
    let inv = nm.try_inverse()?;
    Some(Array2::from_shape_fn((4, 4), |(i, j)| inv[(i, j)]))
}
