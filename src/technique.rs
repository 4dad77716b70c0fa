//! Technique profile registry.
//!
//! Static lookup of target envelopes and scoring weights for the three
//! supported bead techniques, plus a best-effort classifier that guesses the
//! technique from a window of recent sensor data.

use crate::{
    constants::{CLASSIFIER_CLOSE_DISTANCE_MM, CLASSIFIER_HIGH_ACCEL},
    marker_tracking::MarkerObservation,
    metrics::MotionSample,
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of bead techniques the engine can score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Technique {
    /// Straight bead at steady travel speed
    Stringer,
    /// Side-to-side oscillation, wider envelope, slower travel
    Weave,
    /// Rapid in-and-out motion close to the work
    Whip,
}

impl Technique {
    /// All techniques in registry order
    pub const ALL: [Technique; 3] = [Technique::Stringer, Technique::Weave, Technique::Whip];

    /// Stable lowercase identifier
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Technique::Stringer => "stringer",
            Technique::Weave => "weave",
            Technique::Whip => "whip",
        }
    }

    /// Three-letter tag used in completion codes
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Technique::Stringer => "STR",
            Technique::Weave => "WEA",
            Technique::Whip => "WHP",
        }
    }

    /// Resolve a completion-code tag back to a technique
    pub fn from_tag(tag: &str) -> Result<Self> {
        match tag {
            "STR" => Ok(Technique::Stringer),
            "WEA" => Ok(Technique::Weave),
            "WHP" => Ok(Technique::Whip),
            other => Err(Error::UnknownTechnique(other.to_string())),
        }
    }
}

impl fmt::Display for Technique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Technique {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "stringer" => Ok(Technique::Stringer),
            "weave" => Ok(Technique::Weave),
            "whip" => Ok(Technique::Whip),
            other => Err(Error::UnknownTechnique(other.to_string())),
        }
    }
}

/// Ideal [min, max] range for one metric
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Envelope {
    pub min: f64,
    pub max: f64,
}

impl Envelope {
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Whether the value lies inside the envelope (inclusive)
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Distance to the nearest bound, zero inside the envelope
    #[must_use]
    pub fn deviation(&self, value: f64) -> f64 {
        if value < self.min {
            self.min - value
        } else if value > self.max {
            value - self.max
        } else {
            0.0
        }
    }
}

/// Scoring weight distribution over the four metrics.
///
/// Invariant: all weights non-negative and summing to exactly 100.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MetricWeights {
    pub angle: f64,
    pub distance: f64,
    pub speed: f64,
    pub smoothness: f64,
}

impl MetricWeights {
    #[must_use]
    pub fn sum(&self) -> f64 {
        self.angle + self.distance + self.speed + self.smoothness
    }
}

/// Target envelopes and weights for one technique
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TechniqueProfile {
    pub technique: Technique,
    /// Ideal work angle range (degrees)
    pub angle: Envelope,
    /// Ideal standoff distance range (millimeters)
    pub distance: Envelope,
    /// Ideal traversal speed range (units per second)
    pub speed: Envelope,
    pub weights: MetricWeights,
}

static PROFILES: [TechniqueProfile; 3] = [
    TechniqueProfile {
        technique: Technique::Stringer,
        angle: Envelope { min: 70.0, max: 80.0 },
        distance: Envelope { min: 10.0, max: 15.0 },
        speed: Envelope { min: 5.0, max: 15.0 },
        weights: MetricWeights {
            angle: 40.0,
            distance: 30.0,
            speed: 20.0,
            smoothness: 10.0,
        },
    },
    TechniqueProfile {
        technique: Technique::Weave,
        angle: Envelope { min: 75.0, max: 85.0 },
        distance: Envelope { min: 10.0, max: 20.0 },
        speed: Envelope { min: 3.0, max: 10.0 },
        weights: MetricWeights {
            angle: 30.0,
            distance: 30.0,
            speed: 25.0,
            smoothness: 15.0,
        },
    },
    TechniqueProfile {
        technique: Technique::Whip,
        angle: Envelope { min: 60.0, max: 75.0 },
        distance: Envelope { min: 3.0, max: 8.0 },
        speed: Envelope { min: 10.0, max: 25.0 },
        weights: MetricWeights {
            angle: 35.0,
            distance: 25.0,
            speed: 25.0,
            smoothness: 15.0,
        },
    },
];

/// Look up the static profile for a technique
#[must_use]
pub fn profile(technique: Technique) -> &'static TechniqueProfile {
    match technique {
        Technique::Stringer => &PROFILES[0],
        Technique::Weave => &PROFILES[1],
        Technique::Whip => &PROFILES[2],
    }
}

/// Guess the technique being performed from a window of recent data.
///
/// Heuristic only: close-in marker work reads as whip, energetic motion as
/// weave, anything else as stringer. Never fails, never blocks the pipeline.
#[must_use]
pub fn classify(samples: &[MotionSample], observations: &[MarkerObservation]) -> Technique {
    if !observations.is_empty() {
        let mean_distance = observations
            .iter()
            .map(|o| o.position.z.abs())
            .sum::<f64>()
            / observations.len() as f64;
        if mean_distance < CLASSIFIER_CLOSE_DISTANCE_MM {
            return Technique::Whip;
        }
    }

    if !samples.is_empty() {
        let mean_accel = samples
            .iter()
            .map(|s| s.acceleration.norm())
            .sum::<f64>()
            / samples.len() as f64;
        if mean_accel > CLASSIFIER_HIGH_ACCEL {
            return Technique::Weave;
        }
    }

    Technique::Stringer
}
