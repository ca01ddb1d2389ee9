//! Sharpness via Laplacian variance.

use serde::{Deserialize, Serialize};

use crate::domain::GrayscaleImageData;
use crate::error::ConfigError;

/// Variance thresholds separating the sharpness bands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SharpnessConfig {
    /// Below this the photo is rejected as blurry.
    pub rejected_below: f64,
    /// Below this the photo passes with a warning.
    pub warning_below: f64,
    /// From this variance on, the photo is optimally sharp.
    pub optimal_from: f64,
    /// Variance at which the score reaches 100.
    pub optimal_saturation: f64,
}

impl Default for SharpnessConfig {
    fn default() -> Self {
        Self {
            rejected_below: 80.0,
            warning_below: 120.0,
            optimal_from: 500.0,
            optimal_saturation: 1000.0,
        }
    }
}

impl SharpnessConfig {
    /// Checks the bands are ordered.
    ///
    /// # Errors
    ///
    /// Returns an error when a band edge exceeds the next one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_range("quality.sharpness.rejected_below", self.rejected_below, 0.0, f64::MAX)?;
        ConfigError::check_order(
            "quality.sharpness.rejected_below",
            self.rejected_below,
            "quality.sharpness.warning_below",
            self.warning_below,
        )?;
        ConfigError::check_order(
            "quality.sharpness.warning_below",
            self.warning_below,
            "quality.sharpness.optimal_from",
            self.optimal_from,
        )?;
        ConfigError::check_order(
            "quality.sharpness.optimal_from",
            self.optimal_from,
            "quality.sharpness.optimal_saturation",
            self.optimal_saturation,
        )
    }
}

/// Sharpness band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SharpnessVerdict {
    /// Too blurry to use.
    Rejected,
    /// Usable but soft.
    Warning,
    /// Sharp enough.
    Acceptable,
    /// Crisp.
    Optimal,
}

impl SharpnessVerdict {
    /// User-facing message for this band.
    #[must_use]
    pub const fn feedback(self) -> &'static str {
        match self {
            Self::Rejected => "The photo is too blurry. Hold the camera steady and retake it.",
            Self::Warning => "The photo is slightly soft. Try holding the camera steadier.",
            Self::Acceptable => "The photo is sharp enough.",
            Self::Optimal => "The photo is sharp.",
        }
    }
}

/// Sharpness measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharpnessResult {
    /// Variance of the Laplacian response.
    pub laplacian_variance: f64,
    /// Score, 0–100.
    pub score: f64,
    /// Band.
    pub verdict: SharpnessVerdict,
    /// User-facing message.
    pub feedback: String,
}

impl SharpnessResult {
    /// Builds the result for a measured variance.
    #[must_use]
    pub fn from_variance(variance: f64, config: &SharpnessConfig) -> Self {
        let (score, verdict) = score_variance(variance, config);
        Self {
            laplacian_variance: variance,
            score,
            verdict,
            feedback: verdict.feedback().to_string(),
        }
    }
}

/// Measures sharpness of a grayscale image.
#[must_use]
pub fn analyze_sharpness(gray: &GrayscaleImageData, config: &SharpnessConfig) -> SharpnessResult {
    SharpnessResult::from_variance(laplacian_variance(gray), config)
}

/// Variance of the 4-neighbour Laplacian over interior pixels.
///
/// Images narrower or shorter than 3 pixels have no interior and yield 0.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn laplacian_variance(gray: &GrayscaleImageData) -> f64 {
    let (w, h) = (gray.width() as usize, gray.height() as usize);
    if w < 3 || h < 3 {
        return 0.0;
    }
    let px = gray.as_bytes();
    let at = |x: usize, y: usize| i32::from(px[y * w + x]);

    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let response = at(x, y - 1) + at(x - 1, y) + at(x + 1, y) + at(x, y + 1) - 4 * at(x, y);
            let v = f64::from(response);
            sum += v;
            sum_sq += v * v;
        }
    }
    let n = ((w - 2) * (h - 2)) as f64;
    let mean = sum / n;
    (sum_sq / n - mean * mean).max(0.0)
}

/// Maps a variance onto the four linear score bands.
#[must_use]
pub fn score_variance(variance: f64, config: &SharpnessConfig) -> (f64, SharpnessVerdict) {
    let v = if variance.is_finite() { variance.max(0.0) } else { 0.0 };
    let lerp = |from: f64, to: f64, lo: f64, hi: f64| {
        let t = if hi > lo { ((v - lo) / (hi - lo)).clamp(0.0, 1.0) } else { 1.0 };
        (to - from).mul_add(t, from)
    };

    if v < config.rejected_below {
        (lerp(0.0, 30.0, 0.0, config.rejected_below), SharpnessVerdict::Rejected)
    } else if v < config.warning_below {
        (
            lerp(30.0, 50.0, config.rejected_below, config.warning_below),
            SharpnessVerdict::Warning,
        )
    } else if v < config.optimal_from {
        (
            lerp(50.0, 90.0, config.warning_below, config.optimal_from),
            SharpnessVerdict::Acceptable,
        )
    } else {
        (
            lerp(90.0, 100.0, config.optimal_from, config.optimal_saturation),
            SharpnessVerdict::Optimal,
        )
    }
}
