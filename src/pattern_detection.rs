//! Square marker pattern detection from raw pixel buffers.
//!
//! The detector consumes one RGBA frame at a time, reduces it to a grayscale
//! intensity grid, extracts high-gradient corner candidates, and assembles
//! candidate square patterns ranked by confidence. It performs no camera
//! calibration and holds no state between frames; temporal reasoning belongs
//! to the marker tracker.

use crate::constants::{
    CONFIDENCE_CENTER_WEIGHT, CONFIDENCE_REGULARITY_WEIGHT, CONFIDENCE_SIZE_WEIGHT,
    DEFAULT_GRADIENT_THRESHOLD, DEFAULT_MAX_CORNER_CANDIDATES, DEFAULT_MIN_PATTERN_SIZE,
    DIAGONAL_RATIO_BAND_MAX, DIAGONAL_RATIO_BAND_MIN, EPSILON, LUMA_WEIGHT_B, LUMA_WEIGHT_G,
    LUMA_WEIGHT_R, MAX_DIAGONAL_SPREAD, MAX_SIDE_LENGTH_CV, REFERENCE_FRAME_HEIGHT,
    REFERENCE_FRAME_WIDTH, SIZE_SCORE_FULL_SCALE, SQRT_2,
};
use nalgebra::Point2;
use ndarray::Array2;

/// One candidate square pattern extracted from a frame
#[derive(Debug, Clone)]
pub struct PatternCandidate {
    /// Corner coordinates ordered counter-clockwise around the centroid
    pub corners: [Point2<f64>; 4],
    /// Centroid of the four corners
    pub center: Point2<f64>,
    /// Characteristic size: mean side length in pixels
    pub size: f64,
    /// Detection confidence in [0, 1]
    pub confidence: f64,
}

/// Corner candidate with its gradient strength
#[derive(Debug, Clone, Copy)]
struct Corner {
    x: usize,
    y: usize,
    strength: f32,
}

/// Square pattern detector operating on raw RGBA buffers
#[derive(Debug, Clone)]
pub struct PatternDetector {
    gradient_threshold: f32,
    min_pattern_size: f64,
    max_corner_candidates: usize,
}

impl Default for PatternDetector {
    fn default() -> Self {
        Self::new(
            DEFAULT_GRADIENT_THRESHOLD,
            DEFAULT_MIN_PATTERN_SIZE,
            DEFAULT_MAX_CORNER_CANDIDATES,
        )
    }
}

impl PatternDetector {
    /// Create a detector with explicit thresholds.
    ///
    /// `max_corner_candidates` bounds the 4-combination search; candidates
    /// beyond the cap are dropped weakest-first.
    #[must_use]
    pub fn new(gradient_threshold: f32, min_pattern_size: f64, max_corner_candidates: usize) -> Self {
        Self {
            gradient_threshold,
            min_pattern_size,
            max_corner_candidates: max_corner_candidates.max(4),
        }
    }

    /// Detect candidate square patterns in one RGBA frame.
    ///
    /// Returns candidates ordered by descending confidence. Malformed input
    /// (truncated buffer, degenerate dimensions) yields an empty vector.
    #[must_use]
    pub fn detect(&self, rgba: &[u8], width: usize, height: usize) -> Vec<PatternCandidate> {
        let Some(gray) = to_grayscale(rgba, width, height) else {
            log::debug!(
                "rejecting malformed frame: {} bytes for {}x{}",
                rgba.len(),
                width,
                height
            );
            return Vec::new();
        };

        let corners = self.corner_candidates(&gray);
        if corners.len() < 4 {
            return Vec::new();
        }

        let mut patterns = self.form_squares(&corners);
        patterns.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        patterns
    }

    /// Extract interior pixels whose mean absolute gradient against their
    /// 8-neighborhood exceeds the threshold, capped to the strongest N.
    fn corner_candidates(&self, gray: &Array2<f32>) -> Vec<Corner> {
        let (rows, cols) = gray.dim();
        let mut corners = Vec::new();

        for y in 1..rows - 1 {
            for x in 1..cols - 1 {
                let center = gray[(y, x)];
                let mut gradient_sum = 0.0f32;
                for dy in -1isize..=1 {
                    for dx in -1isize..=1 {
                        if dy == 0 && dx == 0 {
                            continue;
                        }
                        let ny = (y as isize + dy) as usize;
                        let nx = (x as isize + dx) as usize;
                        gradient_sum += (center - gray[(ny, nx)]).abs();
                    }
                }
                let mean_gradient = gradient_sum / 8.0;
                if mean_gradient > self.gradient_threshold {
                    corners.push(Corner {
                        x,
                        y,
                        strength: mean_gradient,
                    });
                }
            }
        }

        // Bound the combination search: keep only the strongest candidates.
        if corners.len() > self.max_corner_candidates {
            corners.sort_by(|a, b| b.strength.total_cmp(&a.strength));
            corners.truncate(self.max_corner_candidates);
        }

        corners
    }

    /// Enumerate 4-combinations of corner candidates and keep valid squares
    fn form_squares(&self, corners: &[Corner]) -> Vec<PatternCandidate> {
        let mut patterns = Vec::new();
        let n = corners.len();

        for i in 0..n {
            for j in i + 1..n {
                for k in j + 1..n {
                    for l in k + 1..n {
                        let quad = [corners[i], corners[j], corners[k], corners[l]];
                        if let Some(pattern) = self.evaluate_quad(&quad) {
                            patterns.push(pattern);
                        }
                    }
                }
            }
        }

        patterns
    }

    /// Test one 4-point combination for square validity
    fn evaluate_quad(&self, quad: &[Corner; 4]) -> Option<PatternCandidate> {
        let points: [Point2<f64>; 4] = [
            Point2::new(quad[0].x as f64, quad[0].y as f64),
            Point2::new(quad[1].x as f64, quad[1].y as f64),
            Point2::new(quad[2].x as f64, quad[2].y as f64),
            Point2::new(quad[3].x as f64, quad[3].y as f64),
        ];

        // Six pairwise distances: the four smallest are candidate sides,
        // the two largest candidate diagonals.
        let mut distances = Vec::with_capacity(6);
        for a in 0..4 {
            for b in a + 1..4 {
                distances.push((points[a] - points[b]).norm());
            }
        }
        distances.sort_by(f64::total_cmp);

        let sides = &distances[..4];
        let diagonals = &distances[4..];

        let mean_side = sides.iter().sum::<f64>() / 4.0;
        if mean_side < self.min_pattern_size || mean_side < EPSILON {
            return None;
        }

        let side_variance = sides.iter().map(|s| (s - mean_side).powi(2)).sum::<f64>() / 4.0;
        let side_cv = side_variance.sqrt() / mean_side;
        if side_cv > MAX_SIDE_LENGTH_CV {
            return None;
        }

        let mean_diagonal = (diagonals[0] + diagonals[1]) / 2.0;
        if (diagonals[1] - diagonals[0]).abs() > MAX_DIAGONAL_SPREAD * mean_diagonal {
            return None;
        }

        let ratio = mean_diagonal / mean_side;
        if ratio < DIAGONAL_RATIO_BAND_MIN * SQRT_2 || ratio > DIAGONAL_RATIO_BAND_MAX * SQRT_2 {
            return None;
        }

        let center = Point2::new(
            points.iter().map(|p| p.x).sum::<f64>() / 4.0,
            points.iter().map(|p| p.y).sum::<f64>() / 4.0,
        );

        let confidence = confidence_score(mean_side, side_variance, center);

        Some(PatternCandidate {
            corners: order_corners(points, center),
            center,
            size: mean_side,
            confidence,
        })
    }
}

/// Reduce an RGBA buffer to a grayscale intensity grid.
///
/// Returns `None` when the buffer does not match the stated dimensions or the
/// frame is too small to contain interior pixels.
fn to_grayscale(rgba: &[u8], width: usize, height: usize) -> Option<Array2<f32>> {
    if width < 3 || height < 3 || rgba.len() != width * height * 4 {
        return None;
    }

    let mut gray = Array2::zeros((height, width));
    for y in 0..height {
        for x in 0..width {
            let idx = (y * width + x) * 4;
            gray[(y, x)] = LUMA_WEIGHT_R * f32::from(rgba[idx])
                + LUMA_WEIGHT_G * f32::from(rgba[idx + 1])
                + LUMA_WEIGHT_B * f32::from(rgba[idx + 2]);
        }
    }
    Some(gray)
}

/// Composite confidence: size, proximity to the reference frame center, and
/// side-length regularity.
fn confidence_score(mean_side: f64, side_variance: f64, center: Point2<f64>) -> f64 {
    let size_score = (mean_side / SIZE_SCORE_FULL_SCALE).min(1.0);

    let half_w = REFERENCE_FRAME_WIDTH / 2.0;
    let half_h = REFERENCE_FRAME_HEIGHT / 2.0;
    let manhattan = (center.x - half_w).abs() / half_w + (center.y - half_h).abs() / half_h;
    let center_score = (1.0 - manhattan / 2.0).clamp(0.0, 1.0);

    let normalized_variance = (side_variance / (mean_side * mean_side)).min(1.0);
    let regularity_score = 1.0 - normalized_variance;

    CONFIDENCE_SIZE_WEIGHT * size_score
        + CONFIDENCE_CENTER_WEIGHT * center_score
        + CONFIDENCE_REGULARITY_WEIGHT * regularity_score
}

/// Order four corners counter-clockwise around their centroid
fn order_corners(points: [Point2<f64>; 4], center: Point2<f64>) -> [Point2<f64>; 4] {
    let mut ordered = points;
    ordered.sort_by(|a, b| {
        let angle_a = (a.y - center.y).atan2(a.x - center.x);
        let angle_b = (b.y - center.y).atan2(b.x - center.x);
        angle_a.total_cmp(&angle_b)
    });
    ordered
}
