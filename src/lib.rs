//! Online multi-object tracking over per-frame detection boxes.
//!
//! A [`Tracker`] owns a set of tracks, each carrying a constant-velocity
//! Kalman state. Once per frame it predicts every track forward, associates
//! predictions with the frame's detections through a pluggable
//! [`AssociationStrategy`], and advances each track through its
//! `Tentative → Confirmed → Lost → removed` lifecycle. Only confirmed tracks
//! are reported.
//!
//! ```
//! use motrack_rs::{Detection, Rect, Tracker, TrackerConfig};
//!
//! let config = TrackerConfig {
//!     min_hits: 1,
//!     ..TrackerConfig::default()
//! };
//! let mut tracker = Tracker::new(config).unwrap();
//! // x, y, width, height
//! let person = Detection::from_rect(Rect::new(10.0, 10.0, 40.0, 80.0), 0.9);
//! let tracks = tracker.update(&[person]).unwrap();
//! assert_eq!(tracks.len(), 1);
//! assert_eq!(tracks[0].rect.width.round(), 40.0);
//! ```

pub mod error;
pub mod integration;
pub mod tracker;

pub use error::{ConfigError, PipelineError, TrackError};
pub use integration::{
    AppearanceExtractor, CameraMotionEstimator, DetectionBuilder, DetectionSource, Frame,
    IntoDetections, TrackerPipeline,
};
pub use tracker::{
    AssociationKind, AssociationResult, AssociationStrategy, CameraWarp, Cascaded, Detection,
    IouOnly, MotionAppearanceFused, Rect, Track, TrackId, TrackState, TrackedObject, Tracker,
    TrackerConfig,
};
