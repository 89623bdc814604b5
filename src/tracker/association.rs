//! Association strategies: how predicted tracks are matched to detections.
//!
//! All strategies share [`linear_assignment`] as the solver and differ in
//! how they build and stage the cost matrices.

use std::fmt;

use ndarray::Array2;
use tracing::trace;

use crate::tracker::config::{AppearanceConfig, AssociationKind, TrackerConfig};
use crate::tracker::matching::{
    self, AssociationResult, Detection, fused_distance, iou_distance, linear_assignment,
};
use crate::tracker::rect::Rect;
use crate::tracker::track::Track;

/// Matches predicted tracks (rows) to the current frame's detections (columns).
pub trait AssociationStrategy: fmt::Debug + Send {
    /// `tracks` have already been predicted (and camera-compensated, when
    /// supported) for this frame. Indices in the result refer to the given
    /// slices.
    fn associate(&self, tracks: &[Track], detections: &[Detection]) -> AssociationResult;

    /// Whether predicted states should be warped by the camera motion before
    /// [`associate`](Self::associate) is called.
    fn compensates_camera_motion(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str;
}

/// Build the strategy named by `config.tracker`.
pub fn from_config(config: &TrackerConfig) -> Box<dyn AssociationStrategy> {
    match config.tracker {
        AssociationKind::Sort => Box::new(IouOnly::new(config.iou_threshold)),
        AssociationKind::ByteTrack => Box::new(Cascaded::from_config(config)),
        AssociationKind::BotSort => Box::new(MotionAppearanceFused::from_config(config)),
    }
}

/// SORT association: one pass over `1 - IoU`, gated at `1 - iou_threshold`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IouOnly {
    iou_threshold: f32,
}

impl IouOnly {
    pub fn new(iou_threshold: f32) -> Self {
        Self { iou_threshold }
    }
}

impl AssociationStrategy for IouOnly {
    fn associate(&self, tracks: &[Track], detections: &[Detection]) -> AssociationResult {
        if tracks.is_empty() || detections.is_empty() {
            return AssociationResult::unmatched(tracks.len(), detections.len());
        }
        let track_rects: Vec<Rect> = tracks.iter().map(|t| t.rect()).collect();
        let det_rects: Vec<Rect> = detections.iter().map(|d| d.bbox).collect();
        let dists = iou_distance(&track_rects, &det_rects);
        linear_assignment(&dists, 1.0 - self.iou_threshold)
    }

    fn name(&self) -> &'static str {
        "SORT"
    }
}

/// ByteTrack association.
///
/// Detections scoring at least `track_thresh` are matched against every
/// track first; tracks left over then get a second IoU pass against the
/// detections between `low_thresh` and `track_thresh`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cascaded {
    pub track_thresh: f32,
    pub low_thresh: f32,
    pub match_thresh: f32,
    pub second_match_thresh: f32,
    pub fuse_score: bool,
}

impl Default for Cascaded {
    fn default() -> Self {
        Self::from_config(&TrackerConfig::bytetrack(30, 0.5, 0.6, 0.8))
    }
}

impl Cascaded {
    pub fn from_config(config: &TrackerConfig) -> Self {
        Self {
            track_thresh: config.track_thresh,
            low_thresh: config.low_thresh,
            match_thresh: config.match_thresh,
            second_match_thresh: config.second_match_thresh,
            fuse_score: config.fuse_score,
        }
    }

    /// Run both passes, `first_cost` producing the first-pass matrix for
    /// all tracks against the given high-confidence detection indices.
    fn two_stage<F>(
        &self,
        tracks: &[Track],
        detections: &[Detection],
        first_cost: F,
    ) -> AssociationResult
    where
        F: FnOnce(&[Rect], &[usize]) -> Array2<f32>,
    {
        if tracks.is_empty() || detections.is_empty() {
            return AssociationResult::unmatched(tracks.len(), detections.len());
        }

        let mut high = Vec::new();
        let mut low = Vec::new();
        for (i, det) in detections.iter().enumerate() {
            if det.score >= self.track_thresh {
                high.push(i);
            } else if det.score > self.low_thresh {
                low.push(i);
            }
        }

        let track_rects: Vec<Rect> = tracks.iter().map(|t| t.rect()).collect();

        // First association, with high score detections
        let mut dists = first_cost(&track_rects, &high);
        if self.fuse_score {
            let high_dets: Vec<Detection> = high.iter().map(|&i| detections[i].clone()).collect();
            matching::fuse_score(&mut dists, &high_dets);
        }
        let first = linear_assignment(&dists, self.match_thresh);

        // Second association, remaining tracks against low score detections
        let remaining_rects: Vec<Rect> = first
            .unmatched_tracks
            .iter()
            .map(|&i| track_rects[i])
            .collect();
        let low_rects: Vec<Rect> = low.iter().map(|&i| detections[i].bbox).collect();
        let second = linear_assignment(
            &iou_distance(&remaining_rects, &low_rects),
            self.second_match_thresh,
        );
        trace!(
            high = high.len(),
            low = low.len(),
            first = first.matches.len(),
            second = second.matches.len(),
            "cascaded association"
        );

        let mut matches: Vec<(usize, usize)> = first
            .matches
            .iter()
            .map(|&(t, d)| (t, high[d]))
            .chain(
                second
                    .matches
                    .iter()
                    .map(|&(t, d)| (first.unmatched_tracks[t], low[d])),
            )
            .collect();
        matches.sort_unstable();

        let mut track_matched = vec![false; tracks.len()];
        let mut det_matched = vec![false; detections.len()];
        for &(t, d) in &matches {
            track_matched[t] = true;
            det_matched[d] = true;
        }

        AssociationResult {
            matches,
            unmatched_tracks: (0..tracks.len()).filter(|&i| !track_matched[i]).collect(),
            unmatched_detections: (0..detections.len())
                .filter(|&i| !det_matched[i])
                .collect(),
        }
    }
}

impl AssociationStrategy for Cascaded {
    fn associate(&self, tracks: &[Track], detections: &[Detection]) -> AssociationResult {
        self.two_stage(tracks, detections, |track_rects, high| {
            let high_rects: Vec<Rect> = high.iter().map(|&i| detections[i].bbox).collect();
            iou_distance(track_rects, &high_rects)
        })
    }

    fn name(&self) -> &'static str {
        "ByteTrack"
    }
}

/// BoT-SORT association.
///
/// Same two passes as [`Cascaded`], but the first pass costs each pair by a
/// weighted blend of IoU distance and the cosine distance between the
/// track's smoothed descriptor and the detection's descriptor, after the
/// predicted states have been moved by the camera warp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionAppearanceFused {
    pub cascade: Cascaded,
    pub appearance: AppearanceConfig,
}

impl MotionAppearanceFused {
    pub fn from_config(config: &TrackerConfig) -> Self {
        Self {
            cascade: Cascaded::from_config(config),
            appearance: config.appearance,
        }
    }
}

impl AssociationStrategy for MotionAppearanceFused {
    fn associate(&self, tracks: &[Track], detections: &[Detection]) -> AssociationResult {
        self.cascade.two_stage(tracks, detections, |track_rects, high| {
            let high_rects: Vec<Rect> = high.iter().map(|&i| detections[i].bbox).collect();
            let iou_cost = iou_distance(track_rects, &high_rects);
            let track_features: Vec<Option<&[f32]>> = tracks.iter().map(|t| t.feature()).collect();
            let det_features: Vec<Option<&[f32]>> = high
                .iter()
                .map(|&i| detections[i].feature.as_deref())
                .collect();
            fused_distance(&iou_cost, &track_features, &det_features, &self.appearance)
        })
    }

    fn compensates_camera_motion(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "BoTSORT"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::kalman_filter::KalmanFilter;
    use crate::tracker::track::TrackId;

    fn tracks_at(rects: &[Rect]) -> Vec<Track> {
        let kf = KalmanFilter::default();
        rects
            .iter()
            .enumerate()
            .map(|(i, r)| Track::spawn(TrackId(i as u64 + 1), &Detection::from_rect(*r, 0.9), &kf, 1))
            .collect()
    }

    fn tracks_with_features(rects: &[Rect], features: &[Vec<f32>]) -> Vec<Track> {
        let kf = KalmanFilter::default();
        rects
            .iter()
            .zip(features)
            .enumerate()
            .map(|(i, (r, f))| {
                let det = Detection::from_rect(*r, 0.9).with_feature(f.clone());
                Track::spawn(TrackId(i as u64 + 1), &det, &kf, 1)
            })
            .collect()
    }

    #[test]
    fn test_iou_only_matches_overlapping() {
        let tracks = tracks_at(&[Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(100.0, 0.0, 10.0, 10.0)]);
        let dets = vec![
            Detection::from_rect(Rect::new(101.0, 1.0, 10.0, 10.0), 0.9),
            Detection::from_rect(Rect::new(1.0, 1.0, 10.0, 10.0), 0.9),
            Detection::from_rect(Rect::new(300.0, 300.0, 10.0, 10.0), 0.9),
        ];
        let result = IouOnly::new(0.3).associate(&tracks, &dets);
        assert_eq!(result.matches, vec![(0, 1), (1, 0)]);
        assert!(result.unmatched_tracks.is_empty());
        assert_eq!(result.unmatched_detections, vec![2]);
    }

    #[test]
    fn test_iou_only_gate() {
        // IoU 25/175 ≈ 0.14 is below the 0.3 threshold.
        let tracks = tracks_at(&[Rect::new(0.0, 0.0, 10.0, 10.0)]);
        let dets = vec![Detection::from_rect(Rect::new(5.0, 5.0, 10.0, 10.0), 0.9)];
        let result = IouOnly::new(0.3).associate(&tracks, &dets);
        assert!(result.matches.is_empty());
        assert_eq!(result.unmatched_tracks, vec![0]);
        assert_eq!(result.unmatched_detections, vec![0]);
    }

    #[test]
    fn test_degenerate_inputs() {
        let tracks = tracks_at(&[Rect::new(0.0, 0.0, 10.0, 10.0)]);
        let result = IouOnly::new(0.3).associate(&tracks, &[]);
        assert_eq!(result, AssociationResult::unmatched(1, 0));

        let dets = vec![Detection::from_rect(Rect::new(0.0, 0.0, 10.0, 10.0), 0.9)];
        let result = Cascaded::default().associate(&[], &dets);
        assert_eq!(result, AssociationResult::unmatched(0, 1));
    }

    #[test]
    fn test_cascaded_recovers_with_low_score() {
        let tracks = tracks_at(&[Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(100.0, 0.0, 10.0, 10.0)]);
        let dets = vec![
            Detection::from_rect(Rect::new(1.0, 0.0, 10.0, 10.0), 0.9),
            Detection::from_rect(Rect::new(101.0, 0.0, 10.0, 10.0), 0.3),
            Detection::from_rect(Rect::new(200.0, 0.0, 10.0, 10.0), 0.05),
        ];
        let result = Cascaded::default().associate(&tracks, &dets);
        assert_eq!(result.matches, vec![(0, 0), (1, 1)]);
        assert!(result.unmatched_tracks.is_empty());
        assert_eq!(result.unmatched_detections, vec![2]);
    }

    #[test]
    fn test_cascaded_low_score_cannot_steal_matched_track() {
        let tracks = tracks_at(&[Rect::new(0.0, 0.0, 10.0, 10.0)]);
        let dets = vec![
            // Exact overlap but low confidence.
            Detection::from_rect(Rect::new(0.0, 0.0, 10.0, 10.0), 0.3),
            Detection::from_rect(Rect::new(2.0, 0.0, 10.0, 10.0), 0.9),
        ];
        let result = Cascaded::default().associate(&tracks, &dets);
        assert_eq!(result.matches, vec![(0, 1)]);
        assert_eq!(result.unmatched_detections, vec![0]);
    }

    #[test]
    fn test_fused_uses_appearance_to_break_ambiguity() {
        // Two tracks at the same place, told apart only by appearance.
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        let tracks = tracks_with_features(&[rect, rect], &[vec![1.0, 0.0], vec![0.0, 1.0]]);
        let dets = vec![
            Detection::from_rect(rect, 0.9).with_feature(vec![0.0, 1.0]),
            Detection::from_rect(rect, 0.9).with_feature(vec![1.0, 0.0]),
        ];
        let strategy = MotionAppearanceFused::from_config(&TrackerConfig::botsort());
        let result = strategy.associate(&tracks, &dets);
        assert_eq!(result.matches, vec![(0, 1), (1, 0)]);
        assert!(strategy.compensates_camera_motion());
    }

    #[test]
    fn test_fused_rejects_appearance_mismatch() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        let tracks = tracks_with_features(&[rect], &[vec![1.0, 0.0]]);
        let dets = vec![Detection::from_rect(rect, 0.9).with_feature(vec![0.0, 1.0])];
        let strategy = MotionAppearanceFused::from_config(&TrackerConfig::botsort());
        let result = strategy.associate(&tracks, &dets);
        assert!(result.matches.is_empty());
    }

    #[test]
    fn test_from_config_names() {
        assert_eq!(from_config(&TrackerConfig::default()).name(), "SORT");
        assert_eq!(
            from_config(&TrackerConfig::bytetrack(30, 0.5, 0.6, 0.8)).name(),
            "ByteTrack"
        );
        assert_eq!(from_config(&TrackerConfig::botsort()).name(), "BoTSORT");
    }
}
