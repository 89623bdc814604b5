//! TrackerPipeline for combining detection with tracking.

use tracing::debug;

use crate::error::{PipelineError, TrackError};
use crate::integration::{
    AppearanceExtractor, CameraMotionEstimator, DetectionSource, Frame, OwnedFrame,
};
use crate::tracker::{CameraWarp, TrackedObject, Tracker, TrackerConfig};

/// A combined tracker that bundles detection inference with tracking.
///
/// Per frame it runs the detector, optionally extracts an appearance
/// descriptor from each detection's crop, optionally estimates camera
/// motion against the previous frame, and then updates the tracker.
pub struct TrackerPipeline<D: DetectionSource> {
    detector: D,
    tracker: Tracker,
    appearance: Option<Box<dyn AppearanceExtractor + Send>>,
    camera_motion: Option<Box<dyn CameraMotionEstimator + Send>>,
    previous_frame: Option<OwnedFrame>,
}

impl<D: DetectionSource> TrackerPipeline<D> {
    /// Create a new tracking pipeline with the given detector and tracker config.
    pub fn new(detector: D, config: TrackerConfig) -> Result<Self, TrackError> {
        Ok(Self {
            detector,
            tracker: Tracker::new(config)?,
            appearance: None,
            camera_motion: None,
            previous_frame: None,
        })
    }

    /// Create a new tracking pipeline with default tracker configuration.
    pub fn with_default_config(detector: D) -> Result<Self, TrackError> {
        Self::new(detector, TrackerConfig::default())
    }

    pub fn with_appearance_extractor<A>(mut self, extractor: A) -> Self
    where
        A: AppearanceExtractor + Send + 'static,
    {
        self.appearance = Some(Box::new(extractor));
        self
    }

    pub fn with_camera_motion<C>(mut self, estimator: C) -> Self
    where
        C: CameraMotionEstimator + Send + 'static,
    {
        self.camera_motion = Some(Box::new(estimator));
        self
    }

    /// Process a single frame and return the confirmed tracks.
    pub fn process_frame(
        &mut self,
        frame: &Frame<'_>,
    ) -> Result<Vec<TrackedObject>, PipelineError<D::Error>> {
        let mut detections = self
            .detector
            .detect(frame)
            .map_err(PipelineError::Detection)?;

        if let Some(extractor) = self.appearance.as_mut() {
            let config = self.tracker.config();
            for det in detections.iter_mut() {
                if det.feature.is_some()
                    || !det.bbox.is_valid()
                    || !config.accepts_class(det.class_id)
                {
                    continue;
                }
                if let Some(crop) = frame.crop(&det.bbox) {
                    det.feature = Some(extractor.extract(&crop.view()));
                }
            }
        }

        let warp = match self.camera_motion.as_mut() {
            Some(estimator) => {
                let warp = match &self.previous_frame {
                    Some(previous) if previous.view().same_shape(frame) => {
                        estimator.estimate(&previous.view(), frame)
                    }
                    Some(_) => {
                        debug!("frame shape changed, skipping camera motion estimate");
                        CameraWarp::identity()
                    }
                    None => CameraWarp::identity(),
                };
                self.previous_frame = Some(OwnedFrame::from(frame));
                warp
            }
            None => CameraWarp::identity(),
        };

        Ok(self.tracker.update_with_warp(&detections, &warp)?)
    }

    /// Get a reference to the underlying detector.
    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Get a mutable reference to the underlying detector.
    pub fn detector_mut(&mut self) -> &mut D {
        &mut self.detector
    }

    /// Get a reference to the underlying tracker.
    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    /// Get a mutable reference to the underlying tracker.
    pub fn tracker_mut(&mut self) -> &mut Tracker {
        &mut self.tracker
    }
}
