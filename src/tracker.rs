mod appearance;
pub mod association;
mod camera_motion;
pub mod config;
mod kalman_filter;
pub mod lifecycle;
mod matching;
mod multi_tracker;
mod rect;
mod track;
mod track_state;

pub use appearance::{Descriptor, cosine_distance};
pub use association::{AssociationStrategy, Cascaded, IouOnly, MotionAppearanceFused};
pub use camera_motion::CameraWarp;
pub use config::{
    AppearanceConfig, AssociationKind, MotionNoise, TrackerConfig, classes_from_names,
};
pub use kalman_filter::KalmanFilter;
pub use matching::{AssociationResult, Detection, iou_distance, linear_assignment};
pub use multi_tracker::{TrackedObject, Tracker};
pub use rect::Rect;
pub use track::{Track, TrackId};
pub use track_state::TrackState;
