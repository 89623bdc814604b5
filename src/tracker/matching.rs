//! Matching utilities for multi-object tracking.

use ndarray::{Array2, Zip};
use tracing::warn;

use crate::tracker::appearance::{Descriptor, cosine_distance};
use crate::tracker::config::AppearanceConfig;
use crate::tracker::rect::Rect;

/// Cost given to forbidden pairs and padding cells inside the solver.
const GATED_COST: f64 = 1e6;

/// Detection input for the tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Bounding box (stored as TLWH)
    pub bbox: Rect,
    /// Detection confidence score
    pub score: f32,
    pub class_id: u32,
    /// Appearance descriptor, when an extractor ran on this detection
    pub feature: Option<Descriptor>,
}

impl Detection {
    /// Create a detection from TLBR corners (x1, y1, x2, y2), the layout
    /// most detector heads emit. Use [`Detection::from_rect`] for a TLWH box.
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32, score: f32) -> Self {
        Self::from_rect(Rect::from_tlbr(x1, y1, x2, y2), score)
    }

    /// Create a detection from a TLWH box.
    pub fn from_rect(bbox: Rect, score: f32) -> Self {
        Self {
            bbox,
            score,
            class_id: 0,
            feature: None,
        }
    }

    pub fn with_class(mut self, class_id: u32) -> Self {
        self.class_id = class_id;
        self
    }

    pub fn with_feature(mut self, feature: Descriptor) -> Self {
        self.feature = Some(feature);
        self
    }
}

/// Outcome of associating tracks (rows) with detections (columns).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssociationResult {
    /// `(track index, detection index)` pairs, ordered by track index
    pub matches: Vec<(usize, usize)>,
    pub unmatched_tracks: Vec<usize>,
    pub unmatched_detections: Vec<usize>,
}

impl AssociationResult {
    /// Everything unmatched, without consulting a solver.
    pub fn unmatched(num_tracks: usize, num_detections: usize) -> Self {
        Self {
            matches: vec![],
            unmatched_tracks: (0..num_tracks).collect(),
            unmatched_detections: (0..num_detections).collect(),
        }
    }
}

/// Compute the IoU distance matrix `1 - IoU` between tracks and detections.
///
/// Rows are filled in parallel.
pub fn iou_distance(track_boxes: &[Rect], det_boxes: &[Rect]) -> Array2<f32> {
    let mut dists = Array2::zeros((track_boxes.len(), det_boxes.len()));
    Zip::indexed(&mut dists).par_for_each(|(i, j), d| {
        *d = 1.0 - track_boxes[i].iou(&det_boxes[j]);
    });
    dists
}

/// Blend IoU similarity with detection confidence: `1 - IoU * score`.
pub fn fuse_score(cost_matrix: &mut Array2<f32>, detections: &[Detection]) {
    Zip::indexed(cost_matrix).for_each(|(_, j), cost| {
        let iou_sim = 1.0 - *cost;
        *cost = 1.0 - iou_sim * detections[j].score;
    });
}

/// Weighted IoU/appearance cost with per-component gating.
///
/// A pair is forbidden (infinite cost) when its IoU cost exceeds
/// `proximity_thresh` or its cosine distance exceeds `appearance_thresh`.
/// Pairs where either side lacks a descriptor fall back to the IoU cost.
pub fn fused_distance(
    iou_cost: &Array2<f32>,
    track_features: &[Option<&[f32]>],
    det_features: &[Option<&[f32]>],
    params: &AppearanceConfig,
) -> Array2<f32> {
    let mut fused = Array2::zeros(iou_cost.dim());
    Zip::indexed(&mut fused)
        .and(iou_cost)
        .par_for_each(|(i, j), out, &iou_c| {
            if iou_c > params.proximity_thresh {
                *out = f32::INFINITY;
                return;
            }
            let appearance = match (track_features[i], det_features[j]) {
                (Some(t), Some(d)) => cosine_distance(t, d),
                _ => None,
            };
            *out = match appearance {
                Some(d) if d > params.appearance_thresh => f32::INFINITY,
                Some(d) => (1.0 - params.weight) * iou_c + params.weight * d,
                None => iou_c,
            };
        });
    fused
}

/// Solve the gated assignment problem optimally.
///
/// Entries above `thresh` (or non-finite) are forbidden before solving, so a
/// forbidden pair is never chosen to lower the total cost. Rows and columns
/// without any allowed entry are reported unmatched without entering the
/// solver; an empty problem never reaches it at all.
pub fn linear_assignment(cost_matrix: &Array2<f32>, thresh: f32) -> AssociationResult {
    let (num_rows, num_cols) = cost_matrix.dim();
    if num_rows == 0 || num_cols == 0 {
        return AssociationResult::unmatched(num_rows, num_cols);
    }

    let allowed = |c: f32| c.is_finite() && c <= thresh;
    let rows: Vec<usize> = (0..num_rows)
        .filter(|&i| (0..num_cols).any(|j| allowed(cost_matrix[[i, j]])))
        .collect();
    let cols: Vec<usize> = (0..num_cols)
        .filter(|&j| rows.iter().any(|&i| allowed(cost_matrix[[i, j]])))
        .collect();
    if rows.is_empty() {
        return AssociationResult::unmatched(num_rows, num_cols);
    }

    let size = rows.len().max(cols.len());
    let mut padded = Array2::<f64>::from_elem((size, size), GATED_COST);
    for (r, &i) in rows.iter().enumerate() {
        for (c, &j) in cols.iter().enumerate() {
            let cost = cost_matrix[[i, j]];
            if allowed(cost) {
                padded[[r, c]] = cost as f64;
            }
        }
    }

    let mut matches = vec![];
    match lapjv::lapjv(&padded) {
        Ok((row_to_col, _)) => {
            for (r, &c) in row_to_col.iter().enumerate().take(rows.len()) {
                if c < cols.len() && padded[[r, c]] < GATED_COST {
                    matches.push((rows[r], cols[c]));
                }
            }
        }
        Err(err) => {
            warn!(?err, size, "assignment solver failed, leaving frame unmatched");
        }
    }

    let mut track_matched = vec![false; num_rows];
    let mut det_matched = vec![false; num_cols];
    for &(i, j) in &matches {
        track_matched[i] = true;
        det_matched[j] = true;
    }

    AssociationResult {
        matches,
        unmatched_tracks: unmatched_indices(&track_matched),
        unmatched_detections: unmatched_indices(&det_matched),
    }
}

fn unmatched_indices(matched: &[bool]) -> Vec<usize> {
    matched
        .iter()
        .enumerate()
        .filter_map(|(i, &m)| if m { None } else { Some(i) })
        .collect()
}
