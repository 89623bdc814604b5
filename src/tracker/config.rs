//! Tracker configuration.
//!
//! [`TrackerConfig`] carries every knob the tracking core recognizes, plus the
//! resource paths handed to external collaborators. It round-trips through
//! JSON so a tracker setup can live next to the detector's.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Which association strategy a [`crate::Tracker`] is built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssociationKind {
    /// SORT: single IoU-gated pass.
    #[default]
    #[serde(alias = "iou", alias = "SORT")]
    Sort,
    /// ByteTrack: high-confidence pass, then low-confidence recovery pass.
    #[serde(alias = "cascaded", alias = "ByteTrack")]
    ByteTrack,
    /// BoT-SORT: camera-compensated motion fused with appearance.
    #[serde(alias = "fused", alias = "BoTSORT")]
    BotSort,
}

impl FromStr for AssociationKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sort" | "iou" => Ok(Self::Sort),
            "bytetrack" | "cascaded" => Ok(Self::ByteTrack),
            "botsort" | "fused" => Ok(Self::BotSort),
            _ => Err(ConfigError::UnknownTracker(s.to_string())),
        }
    }
}

impl fmt::Display for AssociationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sort => write!(f, "SORT"),
            Self::ByteTrack => write!(f, "ByteTrack"),
            Self::BotSort => write!(f, "BoTSORT"),
        }
    }
}

/// Noise weights of the constant-velocity motion model, relative to box height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionNoise {
    pub std_weight_position: f64,
    pub std_weight_velocity: f64,
}

impl Default for MotionNoise {
    fn default() -> Self {
        Self {
            std_weight_position: 1.0 / 20.0,
            std_weight_velocity: 1.0 / 160.0,
        }
    }
}

/// Appearance fusion parameters for the BoT-SORT style strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppearanceConfig {
    /// Weight of the cosine distance in the fused cost; IoU cost gets the rest.
    pub weight: f32,
    /// Pairs with IoU cost above this never match.
    pub proximity_thresh: f32,
    /// Pairs with cosine distance above this never match.
    pub appearance_thresh: f32,
    /// Share of the previous smoothed descriptor kept on each update.
    pub momentum: f32,
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        Self {
            weight: 0.5,
            proximity_thresh: 0.5,
            appearance_thresh: 0.25,
            momentum: 0.9,
        }
    }
}

/// Configuration for the [`crate::Tracker`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub tracker: AssociationKind,
    /// Class ids to track; `None` accepts every class.
    pub classes_to_track: Option<BTreeSet<u32>>,

    // SORT
    pub max_age: u32,
    pub min_hits: u32,
    pub iou_threshold: f32,

    // ByteTrack / BoT-SORT
    pub track_buffer: u32,
    pub frame_rate: f32,
    pub track_thresh: f32,
    pub low_thresh: f32,
    pub high_thresh: f32,
    pub match_thresh: f32,
    pub second_match_thresh: f32,
    pub fuse_score: bool,

    pub motion: MotionNoise,
    pub appearance: AppearanceConfig,

    // Resources for the external collaborators, never opened by the core.
    pub tracker_config_path: Option<PathBuf>,
    pub gmc_config_path: Option<PathBuf>,
    pub reid_config_path: Option<PathBuf>,
    pub reid_onnx_path: Option<PathBuf>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            tracker: AssociationKind::default(),
            classes_to_track: None,
            max_age: 1,
            min_hits: 3,
            iou_threshold: 0.3,
            track_buffer: 30,
            frame_rate: 30.0,
            track_thresh: 0.5,
            low_thresh: 0.1,
            high_thresh: 0.6,
            match_thresh: 0.8,
            second_match_thresh: 0.5,
            fuse_score: false,
            motion: MotionNoise::default(),
            appearance: AppearanceConfig::default(),
            tracker_config_path: None,
            gmc_config_path: None,
            reid_config_path: None,
            reid_onnx_path: None,
        }
    }
}

impl TrackerConfig {
    pub fn sort(max_age: u32, min_hits: u32, iou_threshold: f32) -> Self {
        Self {
            tracker: AssociationKind::Sort,
            max_age,
            min_hits,
            iou_threshold,
            ..Self::default()
        }
    }

    pub fn bytetrack(track_buffer: u32, track_thresh: f32, high_thresh: f32, match_thresh: f32) -> Self {
        Self {
            tracker: AssociationKind::ByteTrack,
            track_buffer,
            track_thresh,
            high_thresh,
            match_thresh,
            ..Self::default()
        }
    }

    pub fn botsort() -> Self {
        Self {
            tracker: AssociationKind::BotSort,
            ..Self::default()
        }
    }

    pub fn with_classes<I: IntoIterator<Item = u32>>(mut self, classes: I) -> Self {
        self.classes_to_track = Some(classes.into_iter().collect());
        self
    }

    /// Frames a track may go unmatched before removal.
    pub fn effective_max_age(&self) -> u32 {
        match self.tracker {
            AssociationKind::Sort => self.max_age,
            AssociationKind::ByteTrack | AssociationKind::BotSort => {
                (self.frame_rate / 30.0 * self.track_buffer as f32) as u32
            }
        }
    }

    /// Minimum detection score for an unmatched detection to start a track.
    pub fn spawn_min_score(&self) -> f32 {
        match self.tracker {
            AssociationKind::Sort => 0.0,
            AssociationKind::ByteTrack | AssociationKind::BotSort => self.high_thresh,
        }
    }

    pub fn accepts_class(&self, class_id: u32) -> bool {
        self.classes_to_track
            .as_ref()
            .is_none_or(|classes| classes.contains(&class_id))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit = [
            ("iou_threshold", self.iou_threshold),
            ("track_thresh", self.track_thresh),
            ("low_thresh", self.low_thresh),
            ("high_thresh", self.high_thresh),
            ("match_thresh", self.match_thresh),
            ("second_match_thresh", self.second_match_thresh),
            ("appearance.weight", self.appearance.weight),
            ("appearance.proximity_thresh", self.appearance.proximity_thresh),
        ];
        for (field, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: format!("{value} is outside [0, 1]"),
                });
            }
        }
        if !(0.0..=2.0).contains(&self.appearance.appearance_thresh) {
            return Err(ConfigError::InvalidValue {
                field: "appearance.appearance_thresh",
                reason: format!("{} is outside [0, 2]", self.appearance.appearance_thresh),
            });
        }
        if !(0.0..1.0).contains(&self.appearance.momentum) {
            return Err(ConfigError::InvalidValue {
                field: "appearance.momentum",
                reason: format!("{} is outside [0, 1)", self.appearance.momentum),
            });
        }
        if self.min_hits == 0 {
            return Err(ConfigError::InvalidValue {
                field: "min_hits",
                reason: "must be at least 1".to_string(),
            });
        }
        if !(self.frame_rate > 0.0 && self.frame_rate.is_finite()) {
            return Err(ConfigError::InvalidValue {
                field: "frame_rate",
                reason: format!("{} is not a positive frame rate", self.frame_rate),
            });
        }
        if self.low_thresh > self.track_thresh {
            return Err(ConfigError::InvalidValue {
                field: "low_thresh",
                reason: format!(
                    "{} exceeds track_thresh {}",
                    self.low_thresh, self.track_thresh
                ),
            });
        }
        let noise = [
            ("motion.std_weight_position", self.motion.std_weight_position),
            ("motion.std_weight_velocity", self.motion.std_weight_velocity),
        ];
        for (field, value) in noise {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: format!("{value} is not a positive weight"),
                });
            }
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Map class names to their ids, the id being the name's index in `labels`.
pub fn classes_from_names<S: AsRef<str>>(
    names: &[S],
    labels: &[S],
) -> Result<BTreeSet<u32>, ConfigError> {
    names
        .iter()
        .map(|name| {
            let name = name.as_ref().trim();
            labels
                .iter()
                .position(|label| label.as_ref().trim() == name)
                .map(|idx| idx as u32)
                .ok_or_else(|| ConfigError::UnknownClass(name.to_string()))
        })
        .collect()
}
