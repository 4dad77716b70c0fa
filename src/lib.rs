//! Real-time welding-technique evaluation engine.
//!
//! This library scores an operator's in-progress bead technique from two live
//! input streams:
//! - device-motion samples (acceleration, angular rate) from the host's
//!   sensor collaborator, and
//! - raw RGBA camera frames carrying a square fiducial marker on the work.
//!
//! The evaluation pipeline consists of:
//! 1. Pattern detection to extract candidate square markers from a frame
//! 2. Marker tracking to smooth detections into one stable estimate
//! 3. Metric computation (angle, standoff distance, speed, smoothness) with
//!    per-metric scoring against the active technique profile
//! 4. Session aggregation producing a final weighted score and letter grade
//!
//! The engine performs no I/O and no threading; the host's event loop feeds
//! it frames and samples and consumes the completed session record.
//!
//! # Examples
//!
//! ## Scoring a session
//!
//! ```
//! use nalgebra::Vector3;
//! use weldtrack::metrics::MotionSample;
//! use weldtrack::session::SessionAggregator;
//! use weldtrack::technique::Technique;
//!
//! # fn main() -> weldtrack::Result<()> {
//! let mut sessions = SessionAggregator::new();
//! sessions.start(Technique::Stringer, 0.0)?;
//!
//! // One device-motion event from the host
//! let sample = MotionSample {
//!     timestamp_ms: 16.0,
//!     acceleration: Vector3::new(0.0, 0.0, 9.8),
//!     rotation_rate: Some(Vector3::new(0.0, 75.0, 0.0)),
//!     magnetic_field: None,
//! };
//! let metrics = sessions.update(sample, None)?;
//! assert_eq!(metrics.scores.angle, 100.0);
//!
//! let session = sessions.stop(1000.0)?;
//! println!("final score {:.1}", session.final_score);
//! # Ok(())
//! # }
//! ```
//!
//! ## Driving the full pipeline
//!
//! ```
//! use weldtrack::config::EngineConfig;
//! use weldtrack::engine::TrainerEngine;
//! use weldtrack::technique::Technique;
//!
//! # fn main() -> weldtrack::Result<()> {
//! let mut engine = TrainerEngine::new(&EngineConfig::default());
//! engine.start_session(Technique::Weave, 0.0)?;
//!
//! // Per camera frame: detection + tracking (black frame here, no marker)
//! let frame = vec![0u8; 64 * 64 * 4];
//! let marker = engine.process_frame(&frame, 64, 64, 16.0);
//! assert!(marker.is_none());
//!
//! let session = engine.stop_session(5000.0)?;
//! assert_eq!(session.technique, Technique::Weave);
//! # Ok(())
//! # }
//! ```

/// Square marker pattern detection from raw pixel buffers
pub mod pattern_detection;

/// Temporal filtering of detections into one stable marker estimate
pub mod marker_tracking;

/// Per-sample metric computation and scoring
pub mod metrics;

/// Session lifecycle, aggregation and grading
pub mod session;

/// Technique profile registry and classifier
pub mod technique;

/// Pipeline façade wiring all stages together
pub mod engine;

/// Completion codes for session certificates
pub mod certificate;

/// Error types and result handling
pub mod error;

/// Constants used throughout the engine
pub mod constants;

/// Configuration management
pub mod config;

pub use error::{Error, Result};
