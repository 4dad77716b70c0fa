//! Configuration management for the evaluation engine

use crate::constants::{
    DEFAULT_DISTANCE_SCALE, DEFAULT_GRADIENT_THRESHOLD, DEFAULT_JUMP_THRESHOLD_PX,
    DEFAULT_MAX_CANDIDATE_AGE_MS, DEFAULT_MAX_CORNER_CANDIDATES, DEFAULT_MIN_PATTERN_SIZE,
    DEFAULT_MIN_TRACK_CONFIDENCE, DEFAULT_SMOOTHING_ALPHA, DEFAULT_STABILITY_WINDOW,
};
use crate::marker_tracking::MarkerTracker;
use crate::pattern_detection::PatternDetector;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Pattern detector configuration
    pub detector: DetectorConfig,

    /// Marker tracker configuration
    pub tracker: TrackerConfig,

    /// Metric scoring configuration
    pub scoring: ScoringConfig,
}

/// Pattern detector parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Mean-gradient threshold for corner candidates (0-255 scale)
    pub gradient_threshold: f32,

    /// Minimum mean side length for a valid pattern (pixels)
    pub min_pattern_size: f64,

    /// Cap on corner candidates kept before the combination search
    pub max_corner_candidates: usize,
}

/// Marker tracker parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Minimum candidate confidence (0.0-1.0)
    pub min_confidence: f64,

    /// Staleness window for candidates (milliseconds)
    pub max_candidate_age_ms: f64,

    /// Centroid displacement treated as a jump rather than drift (pixels)
    pub jump_threshold_px: f64,

    /// Exponential smoothing factor for position (0.0-1.0)
    pub smoothing_alpha: f64,

    /// Standoff calibration, mm·px: standoff = scale / apparent marker size
    pub distance_scale: f64,
}

/// Metric scoring parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Rolling window length for distance/speed stability scoring
    pub stability_window: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            detector: DetectorConfig::default(),
            tracker: TrackerConfig::default(),
            scoring: ScoringConfig::default(),
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            gradient_threshold: DEFAULT_GRADIENT_THRESHOLD,
            min_pattern_size: DEFAULT_MIN_PATTERN_SIZE,
            max_corner_candidates: DEFAULT_MAX_CORNER_CANDIDATES,
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_TRACK_CONFIDENCE,
            max_candidate_age_ms: DEFAULT_MAX_CANDIDATE_AGE_MS,
            jump_threshold_px: DEFAULT_JUMP_THRESHOLD_PX,
            smoothing_alpha: DEFAULT_SMOOTHING_ALPHA,
            distance_scale: DEFAULT_DISTANCE_SCALE,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            stability_window: DEFAULT_STABILITY_WINDOW,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content)
            .map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Build a pattern detector from this configuration
    #[must_use]
    pub fn build_detector(&self) -> PatternDetector {
        PatternDetector::new(
            self.detector.gradient_threshold,
            self.detector.min_pattern_size,
            self.detector.max_corner_candidates,
        )
    }

    /// Build a marker tracker from this configuration
    #[must_use]
    pub fn build_tracker(&self) -> MarkerTracker {
        MarkerTracker::new(
            self.tracker.min_confidence,
            self.tracker.max_candidate_age_ms,
            self.tracker.jump_threshold_px,
            self.tracker.smoothing_alpha,
            self.tracker.distance_scale,
        )
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.detector.gradient_threshold <= 0.0 || self.detector.gradient_threshold > 255.0 {
            return Err(Error::ConfigError(
                "Gradient threshold must be between 0 and 255".to_string(),
            ));
        }
        if self.detector.min_pattern_size <= 0.0 {
            return Err(Error::ConfigError(
                "Minimum pattern size must be greater than 0".to_string(),
            ));
        }
        if self.detector.max_corner_candidates < 4 {
            return Err(Error::ConfigError(
                "Corner candidate cap must be at least 4".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.tracker.min_confidence) {
            return Err(Error::ConfigError(
                "Tracker confidence must be between 0.0 and 1.0".to_string(),
            ));
        }
        if self.tracker.smoothing_alpha <= 0.0 || self.tracker.smoothing_alpha > 1.0 {
            return Err(Error::ConfigError(
                "Smoothing alpha must be in (0, 1]".to_string(),
            ));
        }
        if self.tracker.max_candidate_age_ms <= 0.0 {
            return Err(Error::ConfigError(
                "Candidate staleness window must be greater than 0".to_string(),
            ));
        }
        if self.tracker.jump_threshold_px <= 0.0 {
            return Err(Error::ConfigError(
                "Jump threshold must be greater than 0".to_string(),
            ));
        }
        if self.tracker.distance_scale <= 0.0 {
            return Err(Error::ConfigError(
                "Distance scale must be greater than 0".to_string(),
            ));
        }

        if self.scoring.stability_window == 0 {
            return Err(Error::ConfigError(
                "Stability window must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Welding technique evaluation engine configuration

# Pattern detector
detector:
  gradient_threshold: 100.0
  min_pattern_size: 20.0
  max_corner_candidates: 24

# Marker tracker
tracker:
  min_confidence: 0.5
  max_candidate_age_ms: 5000.0
  jump_threshold_px: 50.0
  smoothing_alpha: 0.3
  distance_scale: 720.0

# Metric scoring
scoring:
  stability_window: 10
"#;
