//! Session lifecycle and score aggregation.
//!
//! A session walks an explicit `Idle -> Recording -> Completed` state machine
//! owned by the [`SessionAggregator`]. While recording, the aggregator is the
//! sole owner and writer of the session record: samples, observations and
//! computed metrics grow append-only. Stopping freezes the record, computes
//! the final weighted score from per-metric averages and assigns the letter
//! grade. The frozen record is what persistence, sync and certificate
//! collaborators consume.

use crate::{
    constants::{GRADE_A_CUTOFF, GRADE_B_CUTOFF, GRADE_C_CUTOFF, GRADE_D_CUTOFF},
    marker_tracking::MarkerObservation,
    metrics::{InstantMetrics, MetricCalculator, MotionSample},
    technique::{profile, Technique},
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle phase of the session aggregator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    Idle,
    Recording,
    Completed,
}

/// Letter grade derived from the final score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// Map a final score to its letter grade
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= GRADE_A_CUTOFF {
            Grade::A
        } else if score >= GRADE_B_CUTOFF {
            Grade::B
        } else if score >= GRADE_C_CUTOFF {
            Grade::C
        } else if score >= GRADE_D_CUTOFF {
            Grade::D
        } else {
            Grade::F
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mean of each metric's instantaneous score across a session.
///
/// This is the view the external sync formatter flattens into its per-metric
/// accuracy fields.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MetricAverages {
    pub angle: f64,
    pub distance: f64,
    pub speed: f64,
    pub smoothness: f64,
    pub sample_count: usize,
}

/// One complete recording from start to stop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub technique: Technique,
    pub started_at_ms: f64,
    pub ended_at_ms: Option<f64>,
    pub duration_ms: f64,
    /// Every motion sample received, in arrival order
    pub samples: Vec<MotionSample>,
    /// Every marker observation received, in arrival order
    pub observations: Vec<MarkerObservation>,
    /// One entry per processed sample
    pub metrics: Vec<InstantMetrics>,
    pub final_score: f64,
    pub grade: Option<Grade>,
}

impl Session {
    fn new(technique: Technique, now_ms: f64) -> Self {
        Self {
            id: format!("session-{}", now_ms as u64),
            technique,
            started_at_ms: now_ms,
            ended_at_ms: None,
            duration_ms: 0.0,
            samples: Vec::new(),
            observations: Vec::new(),
            metrics: Vec::new(),
            final_score: 0.0,
            grade: None,
        }
    }

    /// Average each metric's instantaneous score across the session.
    ///
    /// An empty session yields all-zero averages.
    #[must_use]
    pub fn metric_averages(&self) -> MetricAverages {
        let count = self.metrics.len();
        if count == 0 {
            return MetricAverages {
                angle: 0.0,
                distance: 0.0,
                speed: 0.0,
                smoothness: 0.0,
                sample_count: 0,
            };
        }

        let n = count as f64;
        MetricAverages {
            angle: self.metrics.iter().map(|m| m.scores.angle).sum::<f64>() / n,
            distance: self.metrics.iter().map(|m| m.scores.distance).sum::<f64>() / n,
            speed: self.metrics.iter().map(|m| m.scores.speed).sum::<f64>() / n,
            smoothness: self.metrics.iter().map(|m| m.scores.smoothness).sum::<f64>() / n,
            sample_count: count,
        }
    }
}

/// Owner of the session state machine
#[derive(Debug)]
pub struct SessionAggregator {
    recording: Option<(Session, MetricCalculator)>,
    completed: Option<Session>,
    stability_window: usize,
}

impl Default for SessionAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::with_window(crate::constants::DEFAULT_STABILITY_WINDOW)
    }

    /// Aggregator whose calculators use an explicit rolling-window length
    #[must_use]
    pub fn with_window(stability_window: usize) -> Self {
        Self {
            recording: None,
            completed: None,
            stability_window: stability_window.max(1),
        }
    }

    /// Current lifecycle phase
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        if self.recording.is_some() {
            SessionPhase::Recording
        } else if self.completed.is_some() {
            SessionPhase::Completed
        } else {
            SessionPhase::Idle
        }
    }

    /// View of the in-flight or most recently completed session
    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.recording.as_ref().map(|(s, _)| s).or(self.completed.as_ref())
    }

    /// Begin a new recording.
    ///
    /// Valid from Idle or Completed (a completed record is replaced; export
    /// it first). Starting while already recording is rejected and leaves the
    /// in-flight session untouched.
    pub fn start(&mut self, technique: Technique, now_ms: f64) -> Result<&Session> {
        if self.recording.is_some() {
            return Err(Error::SessionState(
                "cannot start: a session is already recording".to_string(),
            ));
        }

        let session = Session::new(technique, now_ms);
        log::info!("session {} started ({technique})", session.id);

        self.completed = None;
        let calculator = MetricCalculator::with_window(*profile(technique), self.stability_window);
        let (session, _) = self.recording.insert((session, calculator));
        Ok(session)
    }

    /// Process one sample pair and append it to the session record.
    ///
    /// Only valid while recording.
    pub fn update(
        &mut self,
        sample: MotionSample,
        observation: Option<MarkerObservation>,
    ) -> Result<InstantMetrics> {
        let Some((session, calculator)) = self.recording.as_mut() else {
            return Err(Error::SessionState(
                "cannot update: no session is recording".to_string(),
            ));
        };

        let metrics = calculator.update(&sample, observation.as_ref());

        session.samples.push(sample);
        if let Some(obs) = observation {
            session.observations.push(obs);
        }
        session.metrics.push(metrics.clone());

        Ok(metrics)
    }

    /// Finish the recording and freeze the session.
    ///
    /// The final score averages each metric's per-sample score across the
    /// whole session and combines the averages with the profile weights,
    /// mirroring the per-sample quality formula. A session with no samples
    /// scores 0 (grade F). Calling `stop` on an already completed session is
    /// an idempotent no-op returning the frozen record; stopping from Idle is
    /// an error.
    pub fn stop(&mut self, now_ms: f64) -> Result<&Session> {
        if let Some((mut session, calculator)) = self.recording.take() {
            session.ended_at_ms = Some(now_ms);
            session.duration_ms = (now_ms - session.started_at_ms).max(0.0);

            let averages = session.metric_averages();
            let weights = calculator.profile().weights;
            session.final_score = if averages.sample_count == 0 {
                0.0
            } else {
                (averages.angle * weights.angle
                    + averages.distance * weights.distance
                    + averages.speed * weights.speed
                    + averages.smoothness * weights.smoothness)
                    / 100.0
            };
            let grade = Grade::from_score(session.final_score);
            session.grade = Some(grade);

            log::info!(
                "session {} completed: score {:.1}, grade {grade}, {} samples over {:.0}ms",
                session.id,
                session.final_score,
                averages.sample_count,
                session.duration_ms
            );

            return Ok(self.completed.insert(session));
        }

        match &self.completed {
            Some(session) => {
                log::debug!("stop on completed session {} is a no-op", session.id);
                Ok(session)
            }
            None => Err(Error::SessionState(
                "cannot stop: no session is recording".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Point3, Vector3};

    fn sample(timestamp_ms: f64, beta: f64) -> MotionSample {
        MotionSample {
            timestamp_ms,
            acceleration: Vector3::new(0.0, 0.0, 9.8),
            rotation_rate: Some(Vector3::new(0.0, beta, 0.0)),
            magnetic_field: None,
        }
    }

    fn marker(x: f64, z: f64, timestamp_ms: f64) -> MarkerObservation {
        MarkerObservation {
            position: Point3::new(x, 240.0, z),
            orientation: None,
            size_px: 64.0,
            confidence: 0.9,
            timestamp_ms,
        }
    }

    #[test]
    fn test_grade_breakpoints() {
        assert_eq!(Grade::from_score(100.0), Grade::A);
        assert_eq!(Grade::from_score(90.0), Grade::A);
        assert_eq!(Grade::from_score(89.999), Grade::B);
        assert_eq!(Grade::from_score(80.0), Grade::B);
        assert_eq!(Grade::from_score(70.0), Grade::C);
        assert_eq!(Grade::from_score(60.0), Grade::D);
        assert_eq!(Grade::from_score(59.999), Grade::F);
        assert_eq!(Grade::from_score(0.0), Grade::F);
    }

    #[test]
    fn test_lifecycle_phases() {
        let mut agg = SessionAggregator::new();
        assert_eq!(agg.phase(), SessionPhase::Idle);

        agg.start(Technique::Stringer, 1000.0).unwrap();
        assert_eq!(agg.phase(), SessionPhase::Recording);

        agg.stop(2000.0).unwrap();
        assert_eq!(agg.phase(), SessionPhase::Completed);
    }

    #[test]
    fn test_start_while_recording_rejected() {
        let mut agg = SessionAggregator::new();
        agg.start(Technique::Stringer, 1000.0).unwrap();
        agg.update(sample(1000.0, 75.0), Some(marker(100.0, 12.0, 1000.0)))
            .unwrap();

        let err = agg.start(Technique::Weave, 1500.0).unwrap_err();
        assert!(matches!(err, Error::SessionState(_)));

        // The in-flight session is untouched
        let session = agg.session().unwrap();
        assert_eq!(session.technique, Technique::Stringer);
        assert_eq!(session.samples.len(), 1);
    }

    #[test]
    fn test_update_outside_recording_rejected() {
        let mut agg = SessionAggregator::new();
        let err = agg.update(sample(0.0, 75.0), None).unwrap_err();
        assert!(matches!(err, Error::SessionState(_)));

        agg.start(Technique::Stringer, 0.0).unwrap();
        agg.stop(1000.0).unwrap();
        let err = agg.update(sample(2000.0, 75.0), None).unwrap_err();
        assert!(matches!(err, Error::SessionState(_)));
    }

    #[test]
    fn test_stop_from_idle_rejected() {
        let mut agg = SessionAggregator::new();
        assert!(matches!(agg.stop(0.0), Err(Error::SessionState(_))));
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut agg = SessionAggregator::new();
        agg.start(Technique::Stringer, 0.0).unwrap();
        for i in 0..5 {
            let t = f64::from(i) * 100.0;
            agg.update(sample(t, 75.0), Some(marker(100.0 + f64::from(i), 12.0, t)))
                .unwrap();
        }

        let (first_score, first_grade) = {
            let s = agg.stop(500.0).unwrap();
            (s.final_score, s.grade)
        };
        let second = agg.stop(9999.0).unwrap();
        assert_eq!(second.final_score, first_score);
        assert_eq!(second.grade, first_grade);
        assert_eq!(second.duration_ms, 500.0);
    }

    #[test]
    fn test_empty_session_scores_zero() {
        let mut agg = SessionAggregator::new();
        agg.start(Technique::Stringer, 0.0).unwrap();
        let session = agg.stop(1000.0).unwrap();

        assert_eq!(session.final_score, 0.0);
        assert_eq!(session.grade, Some(Grade::F));
        assert_eq!(session.duration_ms, 1000.0);
        assert!(session.metrics.is_empty());
    }

    #[test]
    fn test_sequences_grow_append_only() {
        let mut agg = SessionAggregator::new();
        agg.start(Technique::Stringer, 0.0).unwrap();

        agg.update(sample(0.0, 75.0), Some(marker(100.0, 12.0, 0.0))).unwrap();
        agg.update(sample(100.0, 75.0), None).unwrap();
        agg.update(sample(200.0, 75.0), Some(marker(102.0, 12.0, 200.0))).unwrap();

        let session = agg.session().unwrap();
        assert_eq!(session.samples.len(), 3);
        assert_eq!(session.observations.len(), 2);
        assert_eq!(session.metrics.len(), 3);
    }

    #[test]
    fn test_final_score_recomputes_from_per_metric_averages() {
        let mut agg = SessionAggregator::new();
        agg.start(Technique::Stringer, 0.0).unwrap();

        // Constant 15-degrees-over angle, perfect everything else
        for i in 0..20 {
            let t = f64::from(i) * 100.0;
            agg.update(sample(t, 95.0), Some(marker(100.0 + f64::from(i), 12.0, t)))
                .unwrap();
        }

        let session = agg.stop(2000.0).unwrap();
        let averages = session.metric_averages();
        assert!((averages.angle - 70.0).abs() < 1e-9);
        assert!((averages.distance - 100.0).abs() < 1e-9);
        assert!((averages.speed - 100.0).abs() < 1e-9);
        assert!((averages.smoothness - 100.0).abs() < 1e-9);

        // 70*0.4 + 100*0.3 + 100*0.2 + 100*0.1 = 88 -> B
        assert!((session.final_score - 88.0).abs() < 1e-9);
        assert_eq!(session.grade, Some(Grade::B));
    }

    #[test]
    fn test_restart_after_completion() {
        let mut agg = SessionAggregator::new();
        agg.start(Technique::Stringer, 0.0).unwrap();
        agg.stop(1000.0).unwrap();

        let session = agg.start(Technique::Whip, 2000.0).unwrap();
        assert_eq!(session.technique, Technique::Whip);
        assert_eq!(agg.phase(), SessionPhase::Recording);
    }

    #[test]
    fn test_session_id_is_time_derived() {
        let mut agg = SessionAggregator::new();
        let session = agg.start(Technique::Stringer, 1723456789000.0).unwrap();
        assert_eq!(session.id, "session-1723456789000");
    }
}
