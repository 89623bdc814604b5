//! Integration module for connecting detection, appearance and camera-motion
//! backends with the tracker.
//!
//! The tracker itself never touches pixels. This module defines the
//! collaborator traits a video pipeline plugs in, and [`TrackerPipeline`],
//! which runs them in the right order for each frame.

mod builder;
mod detector;
mod frame;
mod pipeline;

pub use builder::DetectionBuilder;
pub use detector::{AppearanceExtractor, CameraMotionEstimator, DetectionSource, IntoDetections};
pub use frame::{Frame, OwnedFrame};
pub use pipeline::TrackerPipeline;
