//! Exposure analysis.
//!
//! Brightness is judged from the luma histogram: its mean against a normal
//! band, optionally with clipped shadow/highlight ratios and dynamic range.

use serde::{Deserialize, Serialize};

use crate::domain::GrayscaleImageData;
use crate::error::ConfigError;

/// Configuration for exposure analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExposureConfig {
    /// Lower edge of the normal brightness band.
    pub min_brightness: f64,
    /// Upper edge of the normal brightness band.
    pub max_brightness: f64,
    /// Mean brightness below this rejects the photo outright.
    pub hard_min_brightness: f64,
    /// Mean brightness above this rejects the photo outright.
    pub hard_max_brightness: f64,
    /// Pixels at or below this level count as clipped shadows.
    pub shadow_clip_level: u8,
    /// Pixels at or above this level count as clipped highlights.
    pub highlight_clip_level: u8,
    /// Include the histogram and clipping statistics in the result.
    pub detailed: bool,
}

impl Default for ExposureConfig {
    fn default() -> Self {
        Self {
            min_brightness: 80.0,
            max_brightness: 190.0,
            hard_min_brightness: 50.0,
            hard_max_brightness: 220.0,
            shadow_clip_level: 10,
            highlight_clip_level: 245,
            detailed: false,
        }
    }
}

impl ExposureConfig {
    /// Checks the brightness bands are ordered and inside 0–255.
    ///
    /// # Errors
    ///
    /// Returns an error for out-of-range or misordered bands.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_range("quality.exposure.hard_min_brightness", self.hard_min_brightness, 0.0, 255.0)?;
        ConfigError::check_range("quality.exposure.hard_max_brightness", self.hard_max_brightness, 0.0, 255.0)?;
        ConfigError::check_order(
            "quality.exposure.hard_min_brightness",
            self.hard_min_brightness,
            "quality.exposure.min_brightness",
            self.min_brightness,
        )?;
        ConfigError::check_order(
            "quality.exposure.min_brightness",
            self.min_brightness,
            "quality.exposure.max_brightness",
            self.max_brightness,
        )?;
        ConfigError::check_order(
            "quality.exposure.max_brightness",
            self.max_brightness,
            "quality.exposure.hard_max_brightness",
            self.hard_max_brightness,
        )
    }
}

/// 256-bin histogram of luminance values.
#[derive(Debug, Clone)]
pub struct Histogram {
    bins: [u64; 256],
    total: u64,
}

impl Histogram {
    /// Compute histogram from grayscale image.
    #[must_use]
    pub fn from_luma(image: &GrayscaleImageData) -> Self {
        let mut bins = [0u64; 256];
        for &v in image.as_bytes() {
            bins[usize::from(v)] += 1;
        }
        let total = bins.iter().sum();
        Self { bins, total }
    }

    /// Bin counts.
    #[must_use]
    pub const fn bins(&self) -> &[u64; 256] {
        &self.bins
    }

    /// Returns the total pixel count.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// Calculate percentile value (0.0-1.0 → luminance 0-255).
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    #[must_use]
    pub fn percentile(&self, p: f64) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let target = (self.total as f64 * p.clamp(0.0, 1.0)).round().max(1.0) as u64;
        let mut cumulative = 0u64;
        for (i, &count) in self.bins.iter().enumerate() {
            cumulative += count;
            if cumulative >= target {
                return i as u8;
            }
        }
        255
    }

    /// Calculate mean luminance.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn mean(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let sum: u64 = self
            .bins
            .iter()
            .enumerate()
            .map(|(i, &count)| (i as u64) * count)
            .sum();
        sum as f64 / self.total as f64
    }

    /// Calculate standard deviation of luminance.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn std_dev(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let mean = self.mean();
        let variance: f64 = self
            .bins
            .iter()
            .enumerate()
            .map(|(i, &count)| {
                let diff = (i as f64) - mean;
                diff * diff * (count as f64)
            })
            .sum::<f64>()
            / (self.total as f64);
        variance.sqrt()
    }

    /// Fraction of pixels at or below `threshold`.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn fraction_below(&self, threshold: u8) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.bins[..=usize::from(threshold)].iter().sum::<u64>() as f64 / self.total as f64
    }

    /// Fraction of pixels at or above `threshold`.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn fraction_above(&self, threshold: u8) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.bins[usize::from(threshold)..].iter().sum::<u64>() as f64 / self.total as f64
    }
}

/// Brightness band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExposureVerdict {
    /// Too dark.
    Underexposed,
    /// Inside the normal band.
    Normal,
    /// Too bright.
    Overexposed,
}

impl ExposureVerdict {
    /// User-facing message for this band.
    #[must_use]
    pub const fn feedback(self) -> &'static str {
        match self {
            Self::Underexposed => "The photo is too dark. Move to a brighter spot.",
            Self::Normal => "The exposure is good.",
            Self::Overexposed => "The photo is too bright. Avoid direct light on the face.",
        }
    }
}

/// Histogram statistics reported in detailed mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposureDetails {
    /// 256 luma bin counts.
    pub histogram: Vec<u64>,
    /// Fraction of pixels at or below the shadow clip level.
    pub shadow_clip_ratio: f64,
    /// Fraction of pixels at or above the highlight clip level.
    pub highlight_clip_ratio: f64,
    /// 1st percentile luma.
    pub p1: u8,
    /// 99th percentile luma.
    pub p99: u8,
    /// `p99 - p1`.
    pub dynamic_range: u8,
    /// Luma standard deviation.
    pub std_dev: f64,
}

/// Exposure measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposureResult {
    /// Mean luma, 0–255.
    pub mean_brightness: f64,
    /// Band.
    pub verdict: ExposureVerdict,
    /// Confidence the exposure is right, 0–1.
    pub confidence: f64,
    /// Score, 0–100.
    pub score: f64,
    /// User-facing message.
    pub feedback: String,
    /// Histogram statistics, in detailed mode only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<ExposureDetails>,
}

impl ExposureResult {
    /// Builds a result for a mean brightness without histogram details.
    #[must_use]
    pub fn from_mean(mean: f64, config: &ExposureConfig) -> Self {
        let verdict = if mean < config.min_brightness {
            ExposureVerdict::Underexposed
        } else if mean > config.max_brightness {
            ExposureVerdict::Overexposed
        } else {
            ExposureVerdict::Normal
        };
        let confidence = exposure_confidence(mean, config);
        Self {
            mean_brightness: mean,
            verdict,
            confidence,
            score: confidence * 100.0,
            feedback: verdict.feedback().to_string(),
            details: None,
        }
    }

    /// True when the mean lies outside the hard limits.
    #[must_use]
    pub fn violates_hard_limits(&self, config: &ExposureConfig) -> bool {
        self.mean_brightness < config.hard_min_brightness
            || self.mean_brightness > config.hard_max_brightness
    }
}

/// Analyzes exposure of a grayscale image.
#[must_use]
pub fn analyze_exposure(gray: &GrayscaleImageData, config: &ExposureConfig) -> ExposureResult {
    let histogram = Histogram::from_luma(gray);
    let mut result = ExposureResult::from_mean(histogram.mean(), config);
    if config.detailed {
        let p1 = histogram.percentile(0.01);
        let p99 = histogram.percentile(0.99);
        result.details = Some(ExposureDetails {
            histogram: histogram.bins().to_vec(),
            shadow_clip_ratio: histogram.fraction_below(config.shadow_clip_level),
            highlight_clip_ratio: histogram.fraction_above(config.highlight_clip_level),
            p1,
            p99,
            dynamic_range: p99.saturating_sub(p1),
            std_dev: histogram.std_dev(),
        });
    }
    result
}

/// 1.0 at the middle of the normal band, 0.5 at its edges, falling to 0 one
/// half-band beyond them.
#[must_use]
pub fn exposure_confidence(mean: f64, config: &ExposureConfig) -> f64 {
    let mid = (config.min_brightness + config.max_brightness) / 2.0;
    let half = ((config.max_brightness - config.min_brightness) / 2.0).max(f64::EPSILON);
    let distance = (mean - mid).abs();
    let confidence = if distance <= half {
        1.0 - 0.5 * distance / half
    } else {
        0.5 * (1.0 - (distance - half) / half)
    };
    confidence.clamp(0.0, 1.0)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::cast_possible_truncation)]
mod tests {
    use super::*;
    use crate::domain::RgbImageData;

    fn gray(width: u32, height: u32, f: impl Fn(u32, u32) -> u8) -> GrayscaleImageData {
        RgbImageData::from_fn(width, height, |x, y| [f(x, y); 3])
            .expect("valid image")
            .to_grayscale()
    }

    #[test]
    fn test_default_config() {
        let config = ExposureConfig::default();
        assert!((config.min_brightness - 80.0).abs() < f64::EPSILON);
        assert!((config.max_brightness - 190.0).abs() < f64::EPSILON);
        assert_eq!(config.shadow_clip_level, 10);
        assert_eq!(config.highlight_clip_level, 245);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_histogram_from_uniform() {
        let hist = Histogram::from_luma(&gray(256, 1, |x, _| x as u8));
        assert_eq!(hist.total(), 256);
        assert!(hist.bins().iter().all(|&count| count == 1));
    }

    #[test]
    fn test_histogram_percentiles() {
        let hist = Histogram::from_luma(&gray(256, 100, |x, _| x as u8));

        let p50 = hist.percentile(0.5);
        assert!(p50 > 120 && p50 < 136, "p50 should be ~128, got {p50}");

        let p1 = hist.percentile(0.01);
        assert!(p1 < 5, "p1 should be ~2, got {p1}");

        let p99 = hist.percentile(0.99);
        assert!(p99 > 250, "p99 should be ~253, got {p99}");
    }

    #[test]
    fn test_histogram_std_dev_uniform() {
        let hist = Histogram::from_luma(&gray(50, 50, |_, _| 100));
        assert!(hist.std_dev().abs() < 0.001);
        assert!((hist.mean() - 100.0).abs() < 0.001);
    }

    #[test]
    fn test_very_dark_image() {
        let result = analyze_exposure(&gray(40, 40, |_, _| 0), &ExposureConfig::default());
        assert_eq!(result.verdict, ExposureVerdict::Underexposed);
        assert!(result.confidence.abs() < f64::EPSILON);
        assert!(result.violates_hard_limits(&ExposureConfig::default()));
    }

    #[test]
    fn test_very_bright_image() {
        let result = analyze_exposure(&gray(40, 40, |_, _| 255), &ExposureConfig::default());
        assert_eq!(result.verdict, ExposureVerdict::Overexposed);
        assert!(result.violates_hard_limits(&ExposureConfig::default()));
    }

    #[test]
    fn test_confidence_shape() {
        let config = ExposureConfig::default();
        assert!((exposure_confidence(135.0, &config) - 1.0).abs() < 1e-9);
        assert!((exposure_confidence(80.0, &config) - 0.5).abs() < 1e-9);
        assert!((exposure_confidence(190.0, &config) - 0.5).abs() < 1e-9);
        assert!(exposure_confidence(25.0, &config).abs() < 1e-9);
        assert!(exposure_confidence(60.0, &config) < 0.5);
    }

    #[test]
    fn test_mid_gray_is_normal() {
        let result = analyze_exposure(&gray(40, 40, |_, _| 128), &ExposureConfig::default());
        assert_eq!(result.verdict, ExposureVerdict::Normal);
        assert!(result.score > 90.0);
        assert!(result.details.is_none());
    }

    #[test]
    fn test_detailed_mode_reports_clipping() {
        let config = ExposureConfig {
            detailed: true,
            ..ExposureConfig::default()
        };
        let result = analyze_exposure(&gray(100, 10, |x, _| if x < 50 { 0 } else { 255 }), &config);
        let details = result.details.expect("detailed mode");
        assert_eq!(details.histogram.len(), 256);
        assert!((details.shadow_clip_ratio - 0.5).abs() < 1e-9);
        assert!((details.highlight_clip_ratio - 0.5).abs() < 1e-9);
        assert_eq!(details.dynamic_range, 255);
    }
}
