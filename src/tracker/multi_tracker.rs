//! Tracker facade: predict, associate and advance the lifecycle once per frame.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::TrackError;
use crate::tracker::association::{self, AssociationStrategy};
use crate::tracker::camera_motion::CameraWarp;
use crate::tracker::config::TrackerConfig;
use crate::tracker::kalman_filter::KalmanFilter;
use crate::tracker::lifecycle::{LifecyclePolicy, TrackManager};
use crate::tracker::matching::Detection;
use crate::tracker::rect::Rect;
use crate::tracker::track::{Track, TrackId};

/// One reported track for the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackedObject {
    pub track_id: TrackId,
    /// Filtered box in TLWH pixel coordinates
    pub rect: Rect,
    pub class_id: u32,
    /// Score of the detection matched this frame
    pub score: f32,
}

impl From<&Track> for TrackedObject {
    fn from(track: &Track) -> Self {
        Self {
            track_id: track.track_id(),
            rect: track.rect(),
            class_id: track.class_id(),
            score: track.score(),
        }
    }
}

/// Online multi-object tracker.
///
/// [`update`](Self::update) must be called once per frame, in frame order;
/// each call is one time step for every track's counters.
#[derive(Debug)]
pub struct Tracker {
    config: TrackerConfig,
    strategy: Box<dyn AssociationStrategy>,
    manager: TrackManager,
    frame_id: u64,
}

impl Tracker {
    /// Build a tracker with the strategy named by `config.tracker`.
    pub fn new(config: TrackerConfig) -> Result<Self, TrackError> {
        let strategy = association::from_config(&config);
        Self::with_strategy(config, strategy)
    }

    /// Build a tracker around a caller-supplied association strategy.
    pub fn with_strategy(
        config: TrackerConfig,
        strategy: Box<dyn AssociationStrategy>,
    ) -> Result<Self, TrackError> {
        config.validate()?;
        let manager = TrackManager::new(
            LifecyclePolicy::from(&config),
            KalmanFilter::new(config.motion),
        );
        Ok(Self {
            config,
            strategy,
            manager,
            frame_id: 0,
        })
    }

    /// Process one frame of detections and return the confirmed tracks.
    ///
    /// Detections with a non-positive or non-finite box, or a class outside
    /// `classes_to_track`, are dropped before association. An empty frame
    /// ages every track and is never an error. A frame that fails with
    /// [`TrackError::IdentityExhausted`] leaves the tracker as it was.
    pub fn update(&mut self, detections: &[Detection]) -> Result<Vec<TrackedObject>, TrackError> {
        self.step(detections, None)
    }

    /// Same as [`update`](Self::update), first moving predicted tracks by the
    /// camera's frame-to-frame warp when the strategy compensates camera
    /// motion.
    pub fn update_with_warp(
        &mut self,
        detections: &[Detection],
        warp: &CameraWarp,
    ) -> Result<Vec<TrackedObject>, TrackError> {
        self.step(detections, Some(warp))
    }

    fn step(
        &mut self,
        detections: &[Detection],
        warp: Option<&CameraWarp>,
    ) -> Result<Vec<TrackedObject>, TrackError> {
        let accepted: Vec<Detection> = detections
            .iter()
            .filter(|d| d.bbox.is_valid() && self.config.accepts_class(d.class_id))
            .cloned()
            .collect();

        let warp = match warp {
            Some(_) if !self.strategy.compensates_camera_motion() => {
                debug!(strategy = self.strategy.name(), "camera warp ignored");
                None
            }
            warp => warp,
        };

        let summary = self
            .manager
            .step(&accepted, warp, self.strategy.as_ref())?;
        self.frame_id += 1;

        debug!(
            frame = self.frame_id,
            detections = accepted.len(),
            dropped = detections.len() - accepted.len(),
            matched = summary.matched,
            spawned = summary.spawned,
            removed = summary.removed,
            live = self.manager.tracks().len(),
            "tracker update"
        );

        Ok(self.manager.confirmed().map(TrackedObject::from).collect())
    }

    /// Every live track, including tentative and lost ones, in identity order.
    pub fn tracks(&self) -> &[Track] {
        self.manager.tracks()
    }

    /// Number of frames processed so far.
    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn strategy(&self) -> &dyn AssociationStrategy {
        self.strategy.as_ref()
    }

    /// Drop all tracks and restart frame counting. Identities are not reused.
    pub fn reset(&mut self) {
        self.manager.clear();
        self.frame_id = 0;
    }
}
