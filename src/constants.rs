//! Constants used throughout the engine

/// Luminance weights for grayscale conversion (ITU-R BT.601)
pub const LUMA_WEIGHT_R: f32 = 0.299;
pub const LUMA_WEIGHT_G: f32 = 0.587;
pub const LUMA_WEIGHT_B: f32 = 0.114;

/// Default mean-gradient threshold for corner candidates (0-255 scale)
pub const DEFAULT_GRADIENT_THRESHOLD: f32 = 100.0;

/// Default minimum mean side length for a valid square pattern (pixels)
pub const DEFAULT_MIN_PATTERN_SIZE: f64 = 20.0;

/// Default cap on corner candidates kept before 4-combination search
pub const DEFAULT_MAX_CORNER_CANDIDATES: usize = 24;

/// Maximum coefficient of variation for the four side lengths
pub const MAX_SIDE_LENGTH_CV: f64 = 0.20;

/// Maximum relative spread between the two diagonals
pub const MAX_DIAGONAL_SPREAD: f64 = 0.20;

/// Accepted multiplicative band around sqrt(2) for diagonal/side ratio
pub const DIAGONAL_RATIO_BAND_MIN: f64 = 0.8;
pub const DIAGONAL_RATIO_BAND_MAX: f64 = 1.6;

/// Reference frame dimensions for center-proximity scoring
pub const REFERENCE_FRAME_WIDTH: f64 = 640.0;
pub const REFERENCE_FRAME_HEIGHT: f64 = 480.0;

/// Pattern confidence component weights
pub const CONFIDENCE_SIZE_WEIGHT: f64 = 0.3;
pub const CONFIDENCE_CENTER_WEIGHT: f64 = 0.3;
pub const CONFIDENCE_REGULARITY_WEIGHT: f64 = 0.4;

/// Pattern size that maps to a full size-score
pub const SIZE_SCORE_FULL_SCALE: f64 = 100.0;

/// Minimum candidate confidence retained by the tracker
pub const DEFAULT_MIN_TRACK_CONFIDENCE: f64 = 0.5;

/// Candidates older than this are discarded by the tracker (milliseconds)
pub const DEFAULT_MAX_CANDIDATE_AGE_MS: f64 = 5000.0;

/// Centroid displacement treated as a marker jump rather than drift (pixels)
pub const DEFAULT_JUMP_THRESHOLD_PX: f64 = 50.0;

/// Exponential smoothing factor for tracked marker position
pub const DEFAULT_SMOOTHING_ALPHA: f64 = 0.3;

/// Default standoff calibration: product of physical marker side and focal
/// length (mm·px); standoff = scale / apparent size. 720 puts a 60px marker
/// at 12mm
pub const DEFAULT_DISTANCE_SCALE: f64 = 720.0;

/// Angle score penalty per degree outside the envelope
pub const ANGLE_PENALTY_PER_DEGREE: f64 = 2.0;

/// Distance score penalty per millimeter of rolling standard deviation
pub const DISTANCE_PENALTY_PER_MM_STDDEV: f64 = 20.0;

/// Speed score penalty per unit of rolling standard deviation
pub const SPEED_PENALTY_PER_UNIT_STDDEV: f64 = 30.0;

/// Smoothness score penalty per unit of jerk
pub const JERK_PENALTY_FACTOR: f64 = 20.0;

/// Default rolling window length for distance/speed stability scoring
pub const DEFAULT_STABILITY_WINDOW: usize = 10;

/// Per-metric score above which angle and distance count as in range
pub const IN_RANGE_SCORE_THRESHOLD: f64 = 70.0;

/// Letter grade breakpoints
pub const GRADE_A_CUTOFF: f64 = 90.0;
pub const GRADE_B_CUTOFF: f64 = 80.0;
pub const GRADE_C_CUTOFF: f64 = 70.0;
pub const GRADE_D_CUTOFF: f64 = 60.0;

/// Technique classifier thresholds
pub const CLASSIFIER_CLOSE_DISTANCE_MM: f64 = 5.0;
pub const CLASSIFIER_HIGH_ACCEL: f64 = 15.0;

/// Statistical constants
pub const SQRT_2: f64 = 1.414_213_562_373_095_1;

/// Numeric precision epsilon
pub const EPSILON: f64 = 1e-10;
