//! Collaborator traits for the stages around the tracker.

use crate::integration::Frame;
use crate::tracker::{CameraWarp, Descriptor, Detection, Rect};

/// Trait for object detection inference backends.
///
/// Implement this trait to connect any detection model to the tracker.
///
/// # Example
///
/// ```ignore
/// use motrack_rs::{Detection, DetectionSource, Frame};
///
/// struct MyDetector {
///     // Your model here
/// }
///
/// impl DetectionSource for MyDetector {
///     type Error = std::io::Error;
///
///     fn detect(&mut self, frame: &Frame<'_>) -> Result<Vec<Detection>, Self::Error> {
///         // Run inference and return detections
///         Ok(vec![])
///     }
/// }
/// ```
pub trait DetectionSource {
    /// Error type for detection failures.
    type Error: std::error::Error + 'static;

    /// Run inference on one frame and return its detections in frame pixel
    /// coordinates.
    fn detect(&mut self, frame: &Frame<'_>) -> Result<Vec<Detection>, Self::Error>;
}

/// Produces a fixed-length appearance descriptor for one detection crop.
pub trait AppearanceExtractor {
    fn extract(&mut self, crop: &Frame<'_>) -> Descriptor;
}

/// Estimates the warp taking `previous` frame coordinates to `current` ones.
///
/// Implementations that cannot register the two frames should return
/// [`CameraWarp::identity`].
pub trait CameraMotionEstimator {
    fn estimate(&mut self, previous: &Frame<'_>, current: &Frame<'_>) -> CameraWarp;
}

/// Helper trait for converting model-specific outputs to `Detection`.
///
/// Implement this for your model's output format to enable easy conversion.
pub trait IntoDetections {
    /// Convert the output into a vector of detections.
    fn into_detections(self) -> Vec<Detection>;
}

impl IntoDetections for Vec<Detection> {
    fn into_detections(self) -> Vec<Detection> {
        self
    }
}

/// `(x, y, width, height, class_id, score)` rows, the detector contract's
/// plain tuple form.
impl IntoDetections for Vec<(f32, f32, f32, f32, u32, f32)> {
    fn into_detections(self) -> Vec<Detection> {
        self.into_iter()
            .map(|(x, y, w, h, class_id, score)| {
                Detection::from_rect(Rect::new(x, y, w, h), score).with_class(class_id)
            })
            .collect()
    }
}
