//! Per-sample motion metric computation and scoring.
//!
//! Converts one (motion sample, marker estimate) pair into instantaneous
//! angle/distance/speed/smoothness readings and their scores against the
//! active technique profile. The calculator is stateful over a session: it
//! owns the rolling distance/speed windows and the previous sample used for
//! jerk and speed derivation. Missing inputs never raise errors; they degrade
//! to the zero-valued defaults the scoring model expects.

use crate::{
    constants::{
        ANGLE_PENALTY_PER_DEGREE, DEFAULT_STABILITY_WINDOW, DISTANCE_PENALTY_PER_MM_STDDEV,
        EPSILON, IN_RANGE_SCORE_THRESHOLD, JERK_PENALTY_FACTOR, SPEED_PENALTY_PER_UNIT_STDDEV,
    },
    marker_tracking::MarkerObservation,
    technique::{Envelope, TechniqueProfile},
};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One device-motion sample as delivered by the host's sensor collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionSample {
    /// Monotonic timestamp in milliseconds
    pub timestamp_ms: f64,
    /// 3-axis acceleration; gravity handling is the caller's responsibility
    pub acceleration: Vector3<f64>,
    /// 3-axis angular rate, absent when the device reports no gyroscope
    pub rotation_rate: Option<Vector3<f64>>,
    /// Optional 3-axis magnetic field
    pub magnetic_field: Option<Vector3<f64>>,
}

/// Per-metric instantaneous scores, each in [0, 100]
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MetricScores {
    pub angle: f64,
    pub distance: f64,
    pub speed: f64,
    pub smoothness: f64,
}

/// Instantaneous metric readout for one processed sample pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstantMetrics {
    pub timestamp_ms: f64,
    /// Work angle in degrees
    pub angle: f64,
    /// Standoff distance in millimeters
    pub distance: f64,
    /// Traversal speed in units per second
    pub speed: f64,
    pub scores: MetricScores,
    /// Unweighted mean of the angle/distance/speed scores
    pub stability: f64,
    /// Weighted composite over all four metric scores
    pub quality: f64,
    /// True when both angle and distance scores clear the in-range threshold
    pub in_range: bool,
}

/// Statistical summary of a rolling data window
#[derive(Debug, Clone, Copy)]
pub struct WindowStats {
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub range: f64,
}

impl WindowStats {
    /// Compute statistics over a window; `None` for an empty window
    #[must_use]
    pub fn from_window(data: &VecDeque<f64>) -> Option<Self> {
        if data.is_empty() {
            return None;
        }

        let n = data.len() as f64;
        let mean = data.iter().sum::<f64>() / n;
        let variance = data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        let std_dev = variance.sqrt();

        let min = data.iter().copied().fold(f64::INFINITY, f64::min);
        let max = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Some(Self {
            mean,
            std_dev,
            min,
            max,
            range: max - min,
        })
    }
}

/// Stateful per-session metric calculator
#[derive(Debug, Clone)]
pub struct MetricCalculator {
    profile: TechniqueProfile,
    window_size: usize,
    distance_history: VecDeque<f64>,
    speed_history: VecDeque<f64>,
    last_accel_magnitude: Option<f64>,
    last_position: Option<(Point3<f64>, f64)>,
}

impl MetricCalculator {
    /// Create a calculator scoring against the given profile
    #[must_use]
    pub fn new(profile: TechniqueProfile) -> Self {
        Self::with_window(profile, DEFAULT_STABILITY_WINDOW)
    }

    /// Create a calculator with an explicit rolling-window length
    #[must_use]
    pub fn with_window(profile: TechniqueProfile, window_size: usize) -> Self {
        let window_size = window_size.max(1);
        Self {
            profile,
            window_size,
            distance_history: VecDeque::with_capacity(window_size),
            speed_history: VecDeque::with_capacity(window_size),
            last_accel_magnitude: None,
            last_position: None,
        }
    }

    /// Profile the calculator scores against
    #[must_use]
    pub fn profile(&self) -> &TechniqueProfile {
        &self.profile
    }

    /// Compute instantaneous metrics for one sample pair.
    ///
    /// Never fails: a missing marker zeroes distance and speed, a missing
    /// gyroscope zeroes the angle, and the first sample of a session scores
    /// full smoothness by convention.
    pub fn update(&mut self, sample: &MotionSample, marker: Option<&MarkerObservation>) -> InstantMetrics {
        let angle = extract_angle(sample);
        let distance = marker.map_or(0.0, |m| m.position.z.abs());

        // Speed is undefined until a previous position exists; an undefined
        // reading scores full marks (same first-sample convention as
        // smoothness) and never enters the rolling window.
        let speed_reading = self.compute_speed(sample, marker);
        let speed = speed_reading.unwrap_or(0.0);

        push_window(&mut self.distance_history, distance, self.window_size);
        if speed_reading.is_some() {
            push_window(&mut self.speed_history, speed, self.window_size);
        }

        let accel_magnitude = sample.acceleration.norm();
        let jerk = self.last_accel_magnitude.map(|prev| (accel_magnitude - prev).abs());

        let scores = MetricScores {
            angle: score_angle(angle, &self.profile.angle),
            distance: score_stability(
                distance,
                &self.distance_history,
                &self.profile.distance,
                DISTANCE_PENALTY_PER_MM_STDDEV,
            ),
            speed: match speed_reading {
                Some(v) => score_stability(
                    v,
                    &self.speed_history,
                    &self.profile.speed,
                    SPEED_PENALTY_PER_UNIT_STDDEV,
                ),
                None => 100.0,
            },
            smoothness: score_smoothness(jerk),
        };

        self.last_accel_magnitude = Some(accel_magnitude);
        if let Some(m) = marker {
            self.last_position = Some((m.position, sample.timestamp_ms));
        }

        let weights = &self.profile.weights;
        let quality = (scores.angle * weights.angle
            + scores.distance * weights.distance
            + scores.speed * weights.speed
            + scores.smoothness * weights.smoothness)
            / 100.0;
        let stability = (scores.angle + scores.distance + scores.speed) / 3.0;
        let in_range =
            scores.angle > IN_RANGE_SCORE_THRESHOLD && scores.distance > IN_RANGE_SCORE_THRESHOLD;

        InstantMetrics {
            timestamp_ms: sample.timestamp_ms,
            angle,
            distance,
            speed,
            scores,
            stability,
            quality,
            in_range,
        }
    }

    /// Clear all rolling state for a fresh session
    pub fn reset(&mut self) {
        self.distance_history.clear();
        self.speed_history.clear();
        self.last_accel_magnitude = None;
        self.last_position = None;
    }

    /// Traversal speed from consecutive marker positions, units per second.
    ///
    /// `None` while no previous position exists. Once one does, a missing
    /// marker reads as an explicit zero, scored against the envelope like any
    /// other value.
    fn compute_speed(&self, sample: &MotionSample, marker: Option<&MarkerObservation>) -> Option<f64> {
        let (prev_position, prev_timestamp) = self.last_position?;
        let Some(marker) = marker else {
            return Some(0.0);
        };

        let dt_ms = sample.timestamp_ms - prev_timestamp;
        if dt_ms < EPSILON {
            return Some(0.0);
        }

        Some((marker.position - prev_position).norm() / dt_ms * 1000.0)
    }
}

/// Derive the work angle from the forward-tilt angular-rate channel.
///
/// Absolute value, fold anything above 180 back via `360 - v`, absolute value
/// again. No rotation-rate data reads as zero.
#[must_use]
pub fn extract_angle(sample: &MotionSample) -> f64 {
    let Some(rate) = sample.rotation_rate else {
        return 0.0;
    };

    let mut angle = rate.y.abs();
    if angle > 180.0 {
        angle = 360.0 - angle;
    }
    angle.abs()
}

/// Linear-penalty angle score: 100 inside the envelope, 2 points per degree
/// outside, clamped to [0, 100]
#[must_use]
pub fn score_angle(angle: f64, envelope: &Envelope) -> f64 {
    (100.0 - ANGLE_PENALTY_PER_DEGREE * envelope.deviation(angle)).clamp(0.0, 100.0)
}

/// Stability score for distance/speed: hard zero when the current value is
/// outside the envelope, otherwise a rolling-standard-deviation penalty.
///
/// The asymmetry against the angle score's linear penalty is intentional.
#[must_use]
pub fn score_stability(
    current: f64,
    window: &VecDeque<f64>,
    envelope: &Envelope,
    penalty_per_unit: f64,
) -> f64 {
    if !envelope.contains(current) {
        return 0.0;
    }

    let std_dev = WindowStats::from_window(window).map_or(0.0, |s| s.std_dev);
    (100.0 - penalty_per_unit * std_dev).clamp(0.0, 100.0)
}

/// Jerk-based smoothness score; a sample with no predecessor scores 100
#[must_use]
pub fn score_smoothness(jerk: Option<f64>) -> f64 {
    match jerk {
        Some(j) => (100.0 - JERK_PENALTY_FACTOR * j).max(0.0),
        None => 100.0,
    }
}

fn push_window(window: &mut VecDeque<f64>, value: f64, capacity: usize) {
    if window.len() >= capacity {
        window.pop_front();
    }
    window.push_back(value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::technique::{profile, Technique};

    fn sample(timestamp_ms: f64, beta: f64, accel: f64) -> MotionSample {
        MotionSample {
            timestamp_ms,
            acceleration: Vector3::new(0.0, 0.0, accel),
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
    fn test_angle_extraction_and_normalization() {
        assert_eq!(extract_angle(&sample(0.0, 75.0, 0.0)), 75.0);
        assert_eq!(extract_angle(&sample(0.0, -75.0, 0.0)), 75.0);
        // Values past 180 fold back
        assert_eq!(extract_angle(&sample(0.0, 280.0, 0.0)), 80.0);
        assert_eq!(extract_angle(&sample(0.0, -280.0, 0.0)), 80.0);
    }

    #[test]
    fn test_missing_gyro_reads_zero_angle() {
        let no_gyro = MotionSample {
            timestamp_ms: 0.0,
            acceleration: Vector3::zeros(),
            rotation_rate: None,
            magnetic_field: None,
        };
        assert_eq!(extract_angle(&no_gyro), 0.0);
    }

    #[test]
    fn test_angle_score_inside_and_outside() {
        let envelope = Envelope::new(70.0, 80.0);
        assert_eq!(score_angle(75.0, &envelope), 100.0);
        assert_eq!(score_angle(70.0, &envelope), 100.0);
        // 15 degrees over: 100 - 15*2
        assert_eq!(score_angle(95.0, &envelope), 70.0);
        // Far out clamps at zero
        assert_eq!(score_angle(200.0, &envelope), 0.0);
    }

    #[test]
    fn test_angle_score_monotonic_outside() {
        let envelope = Envelope::new(70.0, 80.0);
        let mut prev = 100.0;
        for deviation in 0..60 {
            let score = score_angle(80.0 + f64::from(deviation), &envelope);
            assert!(score <= prev);
            assert!((0.0..=100.0).contains(&score));
            prev = score;
        }
    }

    #[test]
    fn test_stability_score_zero_outside_range() {
        let envelope = Envelope::new(10.0, 15.0);
        let window = VecDeque::from(vec![12.0, 12.0, 20.0]);
        assert_eq!(score_stability(20.0, &window, &envelope, 20.0), 0.0);
    }

    #[test]
    fn test_stability_score_penalizes_std_dev() {
        let envelope = Envelope::new(10.0, 15.0);
        // Steady window scores full marks
        let steady = VecDeque::from(vec![12.0; 5]);
        assert_eq!(score_stability(12.0, &steady, &envelope, 20.0), 100.0);

        // Wobbly window: std dev of [11, 13] = 1.0 -> 100 - 20
        let wobbly = VecDeque::from(vec![11.0, 13.0]);
        assert_eq!(score_stability(13.0, &wobbly, &envelope, 20.0), 80.0);
    }

    #[test]
    fn test_smoothness_score() {
        assert_eq!(score_smoothness(None), 100.0);
        assert_eq!(score_smoothness(Some(0.0)), 100.0);
        assert_eq!(score_smoothness(Some(2.0)), 60.0);
        assert_eq!(score_smoothness(Some(50.0)), 0.0);
    }

    #[test]
    fn test_update_without_marker_degrades_gracefully() {
        let mut calc = MetricCalculator::new(*profile(Technique::Stringer));
        let m = calc.update(&sample(0.0, 75.0, 9.8), None);
        assert_eq!(m.distance, 0.0);
        assert_eq!(m.speed, 0.0);
        // Distance 0 is outside the stringer envelope
        assert_eq!(m.scores.distance, 0.0);
        // First sample: speed undefined, smoothness has no predecessor
        assert_eq!(m.scores.speed, 100.0);
        assert_eq!(m.scores.smoothness, 100.0);
    }

    #[test]
    fn test_marker_loss_after_lock_zeroes_speed() {
        let mut calc = MetricCalculator::new(*profile(Technique::Stringer));
        calc.update(&sample(0.0, 75.0, 9.8), Some(&marker(100.0, 12.0, 0.0)));
        calc.update(&sample(100.0, 75.0, 9.8), Some(&marker(101.0, 12.0, 100.0)));

        // Marker dropped: speed reads an explicit zero, outside 5-15
        let m = calc.update(&sample(200.0, 75.0, 9.8), None);
        assert_eq!(m.speed, 0.0);
        assert_eq!(m.scores.speed, 0.0);
    }

    #[test]
    fn test_speed_from_consecutive_positions() {
        let mut calc = MetricCalculator::new(*profile(Technique::Stringer));

        let m0 = calc.update(&sample(0.0, 75.0, 9.8), Some(&marker(100.0, 12.0, 0.0)));
        assert_eq!(m0.speed, 0.0);

        // 1 unit of travel over 100ms = 10 units/s
        let m1 = calc.update(&sample(100.0, 75.0, 9.8), Some(&marker(101.0, 12.0, 100.0)));
        assert!((m1.speed - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_perfect_sample_scores_100() {
        let mut calc = MetricCalculator::new(*profile(Technique::Stringer));

        calc.update(&sample(0.0, 75.0, 9.8), Some(&marker(100.0, 12.0, 0.0)));
        let m = calc.update(&sample(100.0, 75.0, 9.8), Some(&marker(101.0, 12.0, 100.0)));

        assert_eq!(m.scores.angle, 100.0);
        assert_eq!(m.scores.distance, 100.0);
        assert_eq!(m.scores.speed, 100.0);
        assert_eq!(m.scores.smoothness, 100.0);
        assert_eq!(m.quality, 100.0);
        assert_eq!(m.stability, 100.0);
        assert!(m.in_range);
    }

    #[test]
    fn test_weighted_quality_composite() {
        // Angle 15 degrees over on stringer (weights 40/30/20/10):
        // 70*0.4 + 100*0.3 + 100*0.2 + 100*0.1 = 88
        let mut calc = MetricCalculator::new(*profile(Technique::Stringer));

        calc.update(&sample(0.0, 95.0, 9.8), Some(&marker(100.0, 12.0, 0.0)));
        let m = calc.update(&sample(100.0, 95.0, 9.8), Some(&marker(101.0, 12.0, 100.0)));

        assert_eq!(m.scores.angle, 70.0);
        assert!((m.quality - 88.0).abs() < 1e-9);
        assert!((m.stability - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_in_range_flag_requires_angle_and_distance() {
        let mut calc = MetricCalculator::new(*profile(Technique::Stringer));
        // Angle fine, distance absent -> distance score 0 -> out of range
        let m = calc.update(&sample(0.0, 75.0, 9.8), None);
        assert!(!m.in_range);
    }

    #[test]
    fn test_jerk_penalty_applied() {
        let mut calc = MetricCalculator::new(*profile(Technique::Stringer));
        calc.update(&sample(0.0, 75.0, 9.8), Some(&marker(100.0, 12.0, 0.0)));
        // Acceleration magnitude jumps by 3: 100 - 3*20 = 40
        let m = calc.update(&sample(100.0, 75.0, 12.8), Some(&marker(101.0, 12.0, 100.0)));
        assert!((m.scores.smoothness - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_rolling_window_is_bounded() {
        let mut calc = MetricCalculator::with_window(*profile(Technique::Stringer), 3);
        for i in 0..10 {
            let t = f64::from(i) * 100.0;
            calc.update(&sample(t, 75.0, 9.8), Some(&marker(100.0 + f64::from(i), 12.0, t)));
        }
        assert!(calc.distance_history.len() <= 3);
        assert!(calc.speed_history.len() <= 3);
    }

    #[test]
    fn test_window_stats_match_known_values() {
        let data = VecDeque::from(vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        let stats = WindowStats::from_window(&data).unwrap();
        assert_eq!(stats.mean, 3.0);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 5.0);
        assert_eq!(stats.range, 4.0);
        assert!((stats.std_dev - 1.4142135623730951).abs() < 1e-10);

        assert!(WindowStats::from_window(&VecDeque::new()).is_none());
    }

    #[test]
    fn test_reset_clears_history() {
        let mut calc = MetricCalculator::new(*profile(Technique::Stringer));
        calc.update(&sample(0.0, 75.0, 9.8), Some(&marker(100.0, 12.0, 0.0)));
        calc.reset();

        // After reset the next sample is treated as the first again
        let m = calc.update(&sample(200.0, 75.0, 15.0), Some(&marker(120.0, 12.0, 200.0)));
        assert_eq!(m.speed, 0.0);
        assert_eq!(m.scores.smoothness, 100.0);
    }
}
