//! Single object track and its lifecycle transitions.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::error::TrackError;
use crate::tracker::appearance::{self, Descriptor};
use crate::tracker::camera_motion::CameraWarp;
use crate::tracker::kalman_filter::{KalmanFilter, rect_to_measurement, state_to_rect};
use crate::tracker::matching::Detection;
use crate::tracker::rect::Rect;
use crate::tracker::track_state::TrackState;

/// Last identity handed out, shared by every tracker in the process.
pub(crate) static TRACK_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Process-unique track identity. Never reused, not even across trackers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TrackId(pub u64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Claim `count` consecutive identities from `counter` and return the first.
///
/// Either every identity is claimed or none is. The returned id is only
/// meaningful when `count > 0`.
pub(crate) fn reserve_track_ids(counter: &AtomicU64, count: u64) -> Result<u64, TrackError> {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| last.checked_add(count))
        .map(|last| last.wrapping_add(1))
        .map_err(|last| TrackError::IdentityExhausted { last })
}

/// Single object track.
///
/// Fields are only changed through the transition methods below, which the
/// lifecycle manager drives once per frame:
/// [`predict`](Self::predict) on every track, then exactly one of
/// [`mark_matched`](Self::mark_matched) or [`mark_missed`](Self::mark_missed).
#[derive(Debug, Clone)]
pub struct Track {
    track_id: TrackId,
    state: TrackState,
    class_id: u32,
    /// Score of the last matched detection
    score: f32,
    hits: u32,
    age: u32,
    time_since_update: u32,
    /// Kalman filter state mean (8-dim)
    mean: Array1<f64>,
    /// Kalman filter state covariance (8x8)
    covariance: Array2<f64>,
    /// Smoothed, L2-normalized appearance descriptor
    feature: Option<Descriptor>,
}

impl Track {
    /// Start a track from an unmatched detection.
    ///
    /// With `min_hits <= 1` the track is confirmed immediately.
    pub(crate) fn spawn(
        track_id: TrackId,
        detection: &Detection,
        kalman_filter: &KalmanFilter,
        min_hits: u32,
    ) -> Self {
        let (mean, covariance) = kalman_filter.initiate(rect_to_measurement(&detection.bbox));
        let feature = detection.feature.as_ref().map(|f| {
            let mut f = f.clone();
            appearance::normalize(&mut f);
            f
        });
        let state = if min_hits <= 1 {
            TrackState::Confirmed
        } else {
            TrackState::Tentative
        };

        Self {
            track_id,
            state,
            class_id: detection.class_id,
            score: detection.score,
            hits: 1,
            age: 0,
            time_since_update: 0,
            mean,
            covariance,
            feature,
        }
    }

    /// Advance the motion state one frame. Counters other than `age` are untouched.
    pub(crate) fn predict(&mut self, kalman_filter: &KalmanFilter) {
        let mut mean = self.mean.clone();
        if self.state == TrackState::Lost {
            mean[7] = 0.0;
        }
        let (mean, covariance) = kalman_filter.predict(&mean, &self.covariance);
        self.mean = mean;
        self.covariance = covariance;
        self.age += 1;
    }

    pub(crate) fn apply_warp(&mut self, kalman_filter: &KalmanFilter, warp: &CameraWarp) {
        let (mean, covariance) = kalman_filter.apply_warp(&self.mean, &self.covariance, warp);
        self.mean = mean;
        self.covariance = covariance;
    }

    /// Fuse a matched detection into the track.
    pub(crate) fn mark_matched(
        &mut self,
        detection: &Detection,
        kalman_filter: &KalmanFilter,
        min_hits: u32,
        feature_momentum: f32,
    ) {
        let (mean, covariance) = kalman_filter.update(
            &self.mean,
            &self.covariance,
            rect_to_measurement(&detection.bbox),
        );
        self.mean = mean;
        self.covariance = covariance;

        if let Some(observed) = &detection.feature {
            match &mut self.feature {
                Some(smoothed) => appearance::smooth(smoothed, observed, feature_momentum),
                None => {
                    let mut f = observed.clone();
                    appearance::normalize(&mut f);
                    self.feature = Some(f);
                }
            }
        }

        self.hits = self.hits.saturating_add(1);
        self.time_since_update = 0;
        self.score = detection.score;
        self.class_id = detection.class_id;
        self.state = match self.state {
            TrackState::Tentative if self.hits < min_hits => TrackState::Tentative,
            _ => TrackState::Confirmed,
        };
    }

    /// Record a frame without a match. A confirmed track becomes lost.
    pub(crate) fn mark_missed(&mut self) {
        self.time_since_update = self.time_since_update.saturating_add(1);
        if self.state == TrackState::Confirmed {
            self.state = TrackState::Lost;
        }
    }

    /// True once the track has gone unmatched for more than `max_age` frames.
    pub fn is_expired(&self, max_age: u32) -> bool {
        self.time_since_update > max_age
    }

    pub fn track_id(&self) -> TrackId {
        self.track_id
    }

    pub fn state(&self) -> TrackState {
        self.state
    }

    pub fn class_id(&self) -> u32 {
        self.class_id
    }

    pub fn score(&self) -> f32 {
        self.score
    }

    pub fn hits(&self) -> u32 {
        self.hits
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn time_since_update(&self) -> u32 {
        self.time_since_update
    }

    /// Current box estimate in TLWH form.
    pub fn rect(&self) -> Rect {
        state_to_rect(&self.mean)
    }

    pub fn feature(&self) -> Option<&[f32]> {
        self.feature.as_deref()
    }

    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    pub fn covariance(&self) -> &Array2<f64> {
        &self.covariance
    }
}
