//! Pipeline façade wiring detection, tracking and session aggregation.
//!
//! A host event loop drives the engine through two entry points:
//! [`TrainerEngine::process_frame`] for each camera frame and
//! [`TrainerEngine::push_sample`] for each device-motion event. The engine
//! performs no I/O and no threading of its own; calls must not overlap
//! (single-writer model, see the session aggregator).

use crate::{
    config::EngineConfig,
    marker_tracking::{MarkerObservation, MarkerTracker},
    metrics::{InstantMetrics, MotionSample},
    pattern_detection::PatternDetector,
    session::{Session, SessionAggregator, SessionPhase},
    technique::Technique,
    Result,
};

/// Complete evaluation pipeline behind a single handle
pub struct TrainerEngine {
    detector: PatternDetector,
    tracker: MarkerTracker,
    aggregator: SessionAggregator,
}

impl Default for TrainerEngine {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl TrainerEngine {
    /// Build the pipeline from one configuration
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        log::info!("initializing trainer engine");
        Self {
            detector: config.build_detector(),
            tracker: config.build_tracker(),
            aggregator: SessionAggregator::with_window(config.scoring.stability_window),
        }
    }

    /// Run detection and tracking over one RGBA frame.
    ///
    /// Returns the tracked marker estimate after this frame, if any. The
    /// estimate is retained and paired with subsequent motion samples.
    pub fn process_frame(
        &mut self,
        rgba: &[u8],
        width: usize,
        height: usize,
        timestamp_ms: f64,
    ) -> Option<MarkerObservation> {
        let candidates = self.detector.detect(rgba, width, height);
        log::trace!("frame at {timestamp_ms}ms: {} candidates", candidates.len());
        self.tracker.track(&candidates, timestamp_ms, timestamp_ms)
    }

    /// Score one motion sample against the current marker estimate.
    ///
    /// Only valid while a session is recording.
    pub fn push_sample(&mut self, sample: MotionSample) -> Result<InstantMetrics> {
        let observation = self.tracker.current().cloned();
        self.aggregator.update(sample, observation)
    }

    /// Begin a session for the given technique
    pub fn start_session(&mut self, technique: Technique, now_ms: f64) -> Result<&Session> {
        self.tracker.reset();
        self.aggregator.start(technique, now_ms)
    }

    /// Stop the active session and return the frozen record
    pub fn stop_session(&mut self, now_ms: f64) -> Result<&Session> {
        self.aggregator.stop(now_ms)
    }

    /// Current session lifecycle phase
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.aggregator.phase()
    }

    /// In-flight or most recently completed session
    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.aggregator.session()
    }

    /// Marker estimate currently retained by the tracker
    #[must_use]
    pub fn current_marker(&self) -> Option<&MarkerObservation> {
        self.tracker.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    fn sample(timestamp_ms: f64, beta: f64) -> MotionSample {
        MotionSample {
            timestamp_ms,
            acceleration: Vector3::new(0.0, 0.0, 9.8),
            rotation_rate: Some(Vector3::new(0.0, beta, 0.0)),
            magnetic_field: None,
        }
    }

    #[test]
    fn test_push_sample_requires_recording() {
        let mut engine = TrainerEngine::default();
        assert!(engine.push_sample(sample(0.0, 75.0)).is_err());
    }

    #[test]
    fn test_sample_without_marker_still_scores() {
        let mut engine = TrainerEngine::default();
        engine.start_session(Technique::Stringer, 0.0).unwrap();

        let metrics = engine.push_sample(sample(10.0, 75.0)).unwrap();
        assert_eq!(metrics.distance, 0.0);
        assert_eq!(metrics.scores.angle, 100.0);
    }

    #[test]
    fn test_start_resets_tracker() {
        let mut engine = TrainerEngine::default();
        engine.start_session(Technique::Stringer, 0.0).unwrap();
        assert!(engine.current_marker().is_none());
    }
}
