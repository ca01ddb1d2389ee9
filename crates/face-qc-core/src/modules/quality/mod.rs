//! Stage 1: capture quality validation.
//!
//! Checks sharpness, exposure, lighting color and resolution of the raw
//! capture and folds them into one [`QualityReport`].

mod color_temperature;
mod exposure;
pub mod fallback;
mod resolution;
mod sharpness;

pub use color_temperature::{analyze_color_temperature, CctResult, CctVerdict, ColorTemperatureConfig};
pub use exposure::{
    analyze_exposure, exposure_confidence, ExposureConfig, ExposureDetails, ExposureResult,
    ExposureVerdict, Histogram,
};
pub use resolution::{analyze_resolution, ResolutionConfig, ResolutionResult, ResolutionVerdict};
pub use sharpness::{
    analyze_sharpness, laplacian_variance, score_variance, SharpnessConfig, SharpnessResult,
    SharpnessVerdict,
};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{QaStage, RgbImageData};
use crate::error::ConfigError;

/// Relative weight of each check in the overall score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityWeights {
    /// Sharpness weight.
    pub sharpness: f64,
    /// Resolution weight.
    pub resolution: f64,
    /// Exposure weight.
    pub exposure: f64,
    /// Color temperature weight.
    pub color_temperature: f64,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            sharpness: 0.30,
            resolution: 0.20,
            exposure: 0.25,
            color_temperature: 0.25,
        }
    }
}

/// Configuration for the quality stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Resolution limits.
    pub resolution: ResolutionConfig,
    /// Sharpness bands.
    pub sharpness: SharpnessConfig,
    /// Brightness bands.
    pub exposure: ExposureConfig,
    /// CCT bands.
    pub color_temperature: ColorTemperatureConfig,
    /// Score weights.
    pub weights: QualityWeights,
}

impl QualityConfig {
    /// Validates every sub-configuration.
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.resolution.validate()?;
        self.sharpness.validate()?;
        self.exposure.validate()?;
        self.color_temperature.validate()?;
        let w = &self.weights;
        ConfigError::check_weights(
            "quality",
            &[w.sharpness, w.resolution, w.exposure, w.color_temperature],
        )
    }
}

/// The check that most needs attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityIssue {
    /// Too small.
    Resolution,
    /// Blurry or soft.
    Sharpness,
    /// Too dark or too bright.
    Exposure,
    /// Lighting color outside the acceptable range.
    ColorTemperature,
}

/// Combined output of the quality stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    /// Sharpness check.
    pub sharpness: SharpnessResult,
    /// Exposure check.
    pub exposure: ExposureResult,
    /// Lighting color check.
    pub color_temperature: CctResult,
    /// Resolution check.
    pub resolution: ResolutionResult,
    /// Weighted score, 0–100.
    pub overall_score: f64,
    /// Mean of the exposure and CCT confidences.
    pub confidence: f64,
    /// Whether the capture passes the hard quality bar.
    pub is_acceptable: bool,
    /// Highest-priority problem, if any.
    pub primary_issue: Option<QualityIssue>,
    /// Message for the primary issue, or a success message.
    pub feedback: String,
    /// Produced by the fallback path rather than measured.
    #[serde(default)]
    pub is_fallback: bool,
}

const SUCCESS_FEEDBACK: &str = "The photo quality is good.";

impl QualityReport {
    /// Combines individual checks.
    #[must_use]
    pub fn combine(
        sharpness: SharpnessResult,
        exposure: ExposureResult,
        color_temperature: CctResult,
        resolution: ResolutionResult,
        config: &QualityConfig,
    ) -> Self {
        let w = &config.weights;
        let weight_sum = w.sharpness + w.resolution + w.exposure + w.color_temperature;
        let weighted = w.sharpness * sharpness.score
            + w.resolution * resolution.score
            + w.exposure * exposure.score
            + w.color_temperature * color_temperature.score;
        let overall_score = if weight_sum > 0.0 {
            (weighted / weight_sum).clamp(0.0, 100.0)
        } else {
            0.0
        };
        let confidence = ((exposure.confidence + color_temperature.confidence) / 2.0).clamp(0.0, 1.0);

        let is_acceptable = sharpness.verdict != SharpnessVerdict::Rejected
            && resolution.is_valid
            && !exposure.violates_hard_limits(&config.exposure);

        let primary_issue = if !resolution.is_valid {
            Some(QualityIssue::Resolution)
        } else if matches!(
            sharpness.verdict,
            SharpnessVerdict::Rejected | SharpnessVerdict::Warning
        ) {
            Some(QualityIssue::Sharpness)
        } else if exposure.verdict != ExposureVerdict::Normal {
            Some(QualityIssue::Exposure)
        } else if !color_temperature.is_acceptable(&config.color_temperature) {
            Some(QualityIssue::ColorTemperature)
        } else {
            None
        };

        let feedback = match primary_issue {
            Some(QualityIssue::Resolution) => resolution.feedback.clone(),
            Some(QualityIssue::Sharpness) => sharpness.feedback.clone(),
            Some(QualityIssue::Exposure) => exposure.feedback.clone(),
            Some(QualityIssue::ColorTemperature) => color_temperature.feedback.clone(),
            None => SUCCESS_FEEDBACK.to_string(),
        };

        Self {
            sharpness,
            exposure,
            color_temperature,
            resolution,
            overall_score,
            confidence,
            is_acceptable,
            primary_issue,
            feedback,
            is_fallback: false,
        }
    }
}

/// Quality validation stage.
#[derive(Debug, Clone, Default)]
pub struct QualityValidator {
    config: QualityConfig,
}

impl QualityValidator {
    /// Creates a validator with the given configuration.
    #[must_use]
    pub const fn new(config: QualityConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &QualityConfig {
        &self.config
    }

    /// Runs every check on `image`.
    #[must_use]
    pub fn validate(&self, image: &RgbImageData) -> QualityReport {
        let gray = image.to_grayscale();
        let sharpness = analyze_sharpness(&gray, &self.config.sharpness);
        let exposure = analyze_exposure(&gray, &self.config.exposure);
        let color_temperature = analyze_color_temperature(image, &self.config.color_temperature);
        let resolution = analyze_resolution(image.width(), image.height(), &self.config.resolution);

        debug!(
            laplacian_variance = sharpness.laplacian_variance,
            brightness = exposure.mean_brightness,
            cct = color_temperature.cct_kelvin,
            width = resolution.width,
            height = resolution.height,
            "Quality metrics"
        );

        QualityReport::combine(sharpness, exposure, color_temperature, resolution, &self.config)
    }
}

impl QaStage for QualityValidator {
    type Input = RgbImageData;
    type Output = QualityReport;

    fn name(&self) -> &'static str {
        "quality"
    }

    fn run(&self, input: &RgbImageData) -> anyhow::Result<QualityReport> {
        Ok(self.validate(input))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn checkerboard(size: u32) -> RgbImageData {
        RgbImageData::from_fn(size, size, |x, y| if (x + y) % 2 == 0 { [156; 3] } else { [100; 3] })
            .unwrap()
    }

    #[test]
    fn test_stage_name() {
        assert_eq!(QualityValidator::default().name(), "quality");
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(QualityConfig::default().validate().is_ok());
    }

    #[test]
    fn test_sharp_neutral_photo_is_acceptable() {
        let report = QualityValidator::default().validate(&checkerboard(1024));
        assert!(report.is_acceptable);
        assert_eq!(report.primary_issue, None);
        assert_eq!(report.feedback, SUCCESS_FEEDBACK);
        assert!(report.overall_score > 90.0, "score = {}", report.overall_score);
        assert!((0.0..=1.0).contains(&report.confidence));
    }

    #[test]
    fn test_black_image_is_rejected() {
        let image = RgbImageData::filled(600, 600, [0, 0, 0]).unwrap();
        let report = QualityValidator::default().validate(&image);
        assert!(!report.is_acceptable);
        assert_eq!(report.exposure.verdict, ExposureVerdict::Underexposed);
    }

    #[test]
    fn test_white_image_is_rejected() {
        let image = RgbImageData::filled(600, 600, [255, 255, 255]).unwrap();
        let report = QualityValidator::default().validate(&image);
        assert!(!report.is_acceptable);
        assert_eq!(report.exposure.verdict, ExposureVerdict::Overexposed);
    }

    #[test]
    fn test_resolution_takes_priority() {
        let image = RgbImageData::filled(100, 100, [0, 0, 0]).unwrap();
        let report = QualityValidator::default().validate(&image);
        assert_eq!(report.primary_issue, Some(QualityIssue::Resolution));
        assert_eq!(report.feedback, ResolutionVerdict::TooSmall.feedback());
    }

    #[test]
    fn test_flat_gray_is_blurry() {
        let image = RgbImageData::filled(600, 600, [128, 128, 128]).unwrap();
        let report = QualityValidator::default().validate(&image);
        assert!(!report.is_acceptable);
        assert_eq!(report.primary_issue, Some(QualityIssue::Sharpness));
    }

    #[test]
    fn test_cct_is_last_priority() {
        let image = RgbImageData::from_fn(600, 600, |x, y| {
            if (x + y) % 2 == 0 {
                [200, 150, 100]
            } else {
                [160, 110, 60]
            }
        })
        .unwrap();
        let report = QualityValidator::default().validate(&image);
        assert!(report.is_acceptable);
        assert_eq!(report.primary_issue, Some(QualityIssue::ColorTemperature));
    }
}
