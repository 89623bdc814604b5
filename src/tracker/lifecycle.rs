//! Track lifecycle manager: the only owner and mutator of the live track set.

use std::sync::atomic::AtomicU64;

use tracing::{trace, warn};

use crate::error::TrackError;
use crate::tracker::association::AssociationStrategy;
use crate::tracker::camera_motion::CameraWarp;
use crate::tracker::config::TrackerConfig;
use crate::tracker::kalman_filter::KalmanFilter;
use crate::tracker::matching::{AssociationResult, Detection};
use crate::tracker::track::{TRACK_ID_COUNTER, Track, TrackId, reserve_track_ids};

/// Thresholds driving track transitions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LifecyclePolicy {
    /// Matches required before a track is confirmed
    pub min_hits: u32,
    /// Unmatched frames tolerated before removal
    pub max_age: u32,
    /// Minimum score for an unmatched detection to start a track
    pub spawn_min_score: f32,
    pub feature_momentum: f32,
}

impl From<&TrackerConfig> for LifecyclePolicy {
    fn from(config: &TrackerConfig) -> Self {
        Self {
            min_hits: config.min_hits,
            max_age: config.effective_max_age(),
            spawn_min_score: config.spawn_min_score(),
            feature_momentum: config.appearance.momentum,
        }
    }
}

/// Per-frame bookkeeping returned by [`TrackManager::step`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameSummary {
    pub matched: usize,
    pub spawned: usize,
    pub removed: usize,
}

/// Arena of live tracks, kept in identity order.
///
/// Identities come from a counter shared by every manager in the process.
#[derive(Debug, Clone)]
pub struct TrackManager {
    tracks: Vec<Track>,
    ids: &'static AtomicU64,
    policy: LifecyclePolicy,
    kalman_filter: KalmanFilter,
}

impl TrackManager {
    pub fn new(policy: LifecyclePolicy, kalman_filter: KalmanFilter) -> Self {
        Self::with_id_source(policy, kalman_filter, &TRACK_ID_COUNTER)
    }

    pub(crate) fn with_id_source(
        policy: LifecyclePolicy,
        kalman_filter: KalmanFilter,
        ids: &'static AtomicU64,
    ) -> Self {
        Self {
            tracks: Vec::new(),
            ids,
            policy,
            kalman_filter,
        }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn policy(&self) -> &LifecyclePolicy {
        &self.policy
    }

    /// Confirmed tracks matched in the current frame, in identity order.
    pub fn confirmed(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter().filter(|t| t.state().is_confirmed())
    }

    /// Run one frame.
    ///
    /// Every live track is predicted (and moved by `warp`, when given) on a
    /// working copy, `strategy` associates the copy with `detections`, and
    /// only then is the result committed: matched tracks are corrected,
    /// every other track ages, eligible unmatched detections spawn tentative
    /// tracks and expired tracks are dropped. When the identity space cannot
    /// hold the frame's new tracks, nothing changes.
    pub fn step(
        &mut self,
        detections: &[Detection],
        warp: Option<&CameraWarp>,
        strategy: &dyn AssociationStrategy,
    ) -> Result<FrameSummary, TrackError> {
        let mut tracks = self.tracks.clone();
        let warp = warp.filter(|w| !w.is_identity());
        for track in tracks.iter_mut() {
            track.predict(&self.kalman_filter);
            if let Some(warp) = warp {
                track.apply_warp(&self.kalman_filter, warp);
            }
        }

        let association = strategy.associate(&tracks, detections);
        self.commit(tracks, &association, detections)
    }

    fn commit(
        &mut self,
        mut tracks: Vec<Track>,
        association: &AssociationResult,
        detections: &[Detection],
    ) -> Result<FrameSummary, TrackError> {
        let mut track_matched = vec![false; tracks.len()];
        let mut det_used = vec![false; detections.len()];
        let mut pairs = Vec::with_capacity(association.matches.len());
        for &(itrack, idet) in &association.matches {
            if itrack >= tracks.len() || idet >= detections.len() {
                warn!(itrack, idet, "association referenced a missing track or detection");
                continue;
            }
            if track_matched[itrack] || det_used[idet] {
                warn!(itrack, idet, "association matched a track or detection twice");
                continue;
            }
            track_matched[itrack] = true;
            det_used[idet] = true;
            pairs.push((itrack, idet));
        }

        let mut spawn = Vec::new();
        for &idet in &association.unmatched_detections {
            if idet < detections.len()
                && !det_used[idet]
                && detections[idet].score >= self.policy.spawn_min_score
            {
                det_used[idet] = true;
                spawn.push(idet);
            }
        }

        let first_id = if spawn.is_empty() {
            0
        } else {
            reserve_track_ids(self.ids, spawn.len() as u64)?
        };

        for &(itrack, idet) in &pairs {
            tracks[itrack].mark_matched(
                &detections[idet],
                &self.kalman_filter,
                self.policy.min_hits,
                self.policy.feature_momentum,
            );
        }
        for (track, _) in tracks
            .iter_mut()
            .zip(&track_matched)
            .filter(|(_, matched)| !**matched)
        {
            track.mark_missed();
        }

        for (offset, &idet) in spawn.iter().enumerate() {
            let track = Track::spawn(
                TrackId(first_id + offset as u64),
                &detections[idet],
                &self.kalman_filter,
                self.policy.min_hits,
            );
            trace!(track_id = %track.track_id(), idet, "spawned track");
            tracks.push(track);
        }

        let before = tracks.len();
        let max_age = self.policy.max_age;
        tracks.retain(|t| {
            let expired = t.is_expired(max_age);
            if expired {
                trace!(track_id = %t.track_id(), "removed track");
            }
            !expired
        });
        let removed = before - tracks.len();
        self.tracks = tracks;

        Ok(FrameSummary {
            matched: pairs.len(),
            spawned: spawn.len(),
            removed,
        })
    }

    /// Drop every live track. Identities keep counting up.
    pub fn clear(&mut self) {
        self.tracks.clear();
    }
}
