//! Temporal filtering of per-frame pattern detections.
//!
//! The tracker collapses the detector's ranked candidates into at most one
//! authoritative marker estimate per frame. Small centroid drift is smoothed
//! exponentially; a large jump is taken at face value since it most likely
//! means a different physical marker entered the view.

use crate::constants::{
    DEFAULT_DISTANCE_SCALE, DEFAULT_JUMP_THRESHOLD_PX, DEFAULT_MAX_CANDIDATE_AGE_MS,
    DEFAULT_MIN_TRACK_CONFIDENCE, DEFAULT_SMOOTHING_ALPHA, EPSILON,
};
use crate::pattern_detection::PatternCandidate;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// One smoothed marker estimate.
///
/// `position.x`/`position.y` are frame coordinates in pixels; `position.z` is
/// the estimated standoff distance in millimeters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerObservation {
    pub position: Point3<f64>,
    /// Pitch/yaw/roll in degrees when a pose estimate is available
    pub orientation: Option<Vector3<f64>>,
    /// Apparent side length in pixels
    pub size_px: f64,
    /// Detection confidence in [0, 1]
    pub confidence: f64,
    pub timestamp_ms: f64,
}

/// Single-marker tracker with exponential position smoothing
#[derive(Debug, Clone)]
pub struct MarkerTracker {
    min_confidence: f64,
    max_candidate_age_ms: f64,
    jump_threshold_px: f64,
    smoothing_alpha: f64,
    /// Standoff calibration, mm·px: standoff = scale / apparent size
    distance_scale: f64,
    last: Option<MarkerObservation>,
}

impl Default for MarkerTracker {
    fn default() -> Self {
        Self::new(
            DEFAULT_MIN_TRACK_CONFIDENCE,
            DEFAULT_MAX_CANDIDATE_AGE_MS,
            DEFAULT_JUMP_THRESHOLD_PX,
            DEFAULT_SMOOTHING_ALPHA,
            DEFAULT_DISTANCE_SCALE,
        )
    }
}

impl MarkerTracker {
    /// Create a tracker with explicit gating and smoothing parameters
    ///
    /// # Panics
    ///
    /// Panics if `smoothing_alpha` is not in (0, 1]
    #[must_use]
    pub fn new(
        min_confidence: f64,
        max_candidate_age_ms: f64,
        jump_threshold_px: f64,
        smoothing_alpha: f64,
        distance_scale: f64,
    ) -> Self {
        assert!(
            smoothing_alpha > 0.0 && smoothing_alpha <= 1.0,
            "Alpha must be in (0, 1]"
        );
        Self {
            min_confidence,
            max_candidate_age_ms,
            jump_threshold_px,
            smoothing_alpha,
            distance_scale,
            last: None,
        }
    }

    /// Fold one frame's candidates into the tracked estimate.
    ///
    /// Candidates below the confidence floor or older than the staleness
    /// window (relative to `now_ms`) are discarded; of the survivors only the
    /// highest-confidence one is considered. Returns the updated estimate, or
    /// `None` when nothing usable was seen and no estimate is retained.
    pub fn track(
        &mut self,
        candidates: &[PatternCandidate],
        timestamp_ms: f64,
        now_ms: f64,
    ) -> Option<MarkerObservation> {
        // Frames are timestamped by the capture collaborator and may arrive
        // late; anything past the staleness window is worthless.
        if now_ms - timestamp_ms > self.max_candidate_age_ms {
            return self.last.clone();
        }

        let best = candidates
            .iter()
            .filter(|c| c.confidence >= self.min_confidence)
            .max_by(|a, b| a.confidence.total_cmp(&b.confidence));

        let Some(candidate) = best else {
            return self.last.clone();
        };

        let observation = self.observe(candidate, timestamp_ms);

        let merged = match &self.last {
            Some(prev) => {
                let dx = observation.position.x - prev.position.x;
                let dy = observation.position.y - prev.position.y;
                let displacement = (dx * dx + dy * dy).sqrt();

                if displacement < self.jump_threshold_px {
                    // Drift: blend position toward the candidate. Size,
                    // confidence and orientation are never smoothed.
                    let alpha = self.smoothing_alpha;
                    let smoothed = prev.position + alpha * (observation.position - prev.position);
                    MarkerObservation {
                        position: smoothed,
                        ..observation
                    }
                } else {
                    log::debug!("marker jumped {displacement:.1}px, snapping to new estimate");
                    observation
                }
            }
            None => observation,
        };

        self.last = Some(merged.clone());
        Some(merged)
    }

    /// Currently retained estimate, if any
    #[must_use]
    pub fn current(&self) -> Option<&MarkerObservation> {
        self.last.as_ref()
    }

    /// Clear the retained estimate
    pub fn reset(&mut self) {
        self.last = None;
    }

    /// Convert a raw pattern candidate into an unsmoothed observation,
    /// estimating standoff from apparent size via the pinhole relation.
    fn observe(&self, candidate: &PatternCandidate, timestamp_ms: f64) -> MarkerObservation {
        let standoff_mm = if candidate.size > EPSILON {
            self.distance_scale / candidate.size
        } else {
            0.0
        };

        MarkerObservation {
            position: Point3::new(candidate.center.x, candidate.center.y, standoff_mm),
            orientation: None,
            size_px: candidate.size,
            confidence: candidate.confidence,
            timestamp_ms,
        }
    }
}
