//! Stage 3: automatic white balance.
//!
//! Measures the lighting color of the capture and, when it is far enough from
//! daylight, neutralizes it. Skin is excluded from the reference where
//! possible so that a face filling the frame does not pull the correction
//! towards blue. The methods are tried in order (skin-aware, Von-Kries,
//! Gray-World) and the first one whose gains pass the safety limits wins.

mod confidence;
pub mod fallback;
mod gains;
mod skin;

pub use confidence::{confidence, AwbConfidenceConfig, ConfidenceInputs};
pub use gains::{
    apply_linear_matrix, image_average, von_kries_matrix, AwbGains, GainAssessment, GainLimits,
};
pub use skin::{SkinConfig, SkinMask};

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::color::{self, Rgb};
use crate::domain::{BoundingBox, QaStage, RgbImageData};
use crate::error::ConfigError;

/// Configuration for the white-balance stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AwbConfig {
    /// Daylight reference.
    pub target_kelvin: f64,
    /// Deviations up to this need no correction.
    pub tolerance_kelvin: f64,
    /// Deviations above this go to Von-Kries when skin coverage is low.
    pub large_deviation_kelvin: f64,
    /// Skin chroma box.
    pub skin: SkinConfig,
    /// Minimum skin fraction of the face area for the skin-aware method.
    pub min_skin_ratio: f64,
    /// Minimum non-skin fraction of the image for the skin-aware method.
    pub min_non_skin_ratio: f64,
    /// Minimum luma of the non-skin reference.
    pub min_non_skin_brightness: f64,
    /// Per-channel level Gray-World pulls the reference to.
    pub gray_world_target: f64,
    /// Gain safety limits.
    pub gains: GainLimits,
    /// Confidence blend.
    pub confidence: AwbConfidenceConfig,
}

impl Default for AwbConfig {
    fn default() -> Self {
        Self {
            target_kelvin: 6500.0,
            tolerance_kelvin: 500.0,
            large_deviation_kelvin: 1500.0,
            skin: SkinConfig::default(),
            min_skin_ratio: 0.30,
            min_non_skin_ratio: 0.10,
            min_non_skin_brightness: 30.0,
            gray_world_target: 128.0,
            gains: GainLimits::default(),
            confidence: AwbConfidenceConfig::default(),
        }
    }
}

impl AwbConfig {
    /// Validates thresholds and sub-configurations.
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_range("awb.target_kelvin", self.target_kelvin, 1000.0, 40000.0)?;
        ConfigError::check_range("awb.tolerance_kelvin", self.tolerance_kelvin, 0.0, f64::MAX)?;
        ConfigError::check_order(
            "awb.tolerance_kelvin",
            self.tolerance_kelvin,
            "awb.large_deviation_kelvin",
            self.large_deviation_kelvin,
        )?;
        ConfigError::check_range("awb.min_skin_ratio", self.min_skin_ratio, 0.0, 1.0)?;
        ConfigError::check_range("awb.min_non_skin_ratio", self.min_non_skin_ratio, 0.0, 1.0)?;
        ConfigError::check_range(
            "awb.min_non_skin_brightness",
            self.min_non_skin_brightness,
            0.0,
            255.0,
        )?;
        ConfigError::check_range("awb.gray_world_target", self.gray_world_target, 1.0, 255.0)?;
        self.skin.validate()?;
        self.gains.validate()?;
        self.confidence.validate()
    }
}

/// Correction method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AwbMethod {
    /// Nothing applied.
    None,
    /// Gray-World on the non-skin pixels.
    SkinAware,
    /// Bradford chromatic adaptation to D65.
    VonKries,
    /// Gray-World on the whole image.
    GrayWorld,
}

impl AwbMethod {
    /// Human-readable name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::SkinAware => "skin-aware gray world",
            Self::VonKries => "Von-Kries adaptation",
            Self::GrayWorld => "gray world",
        }
    }
}

/// Outcome of the stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AwbStatus {
    /// Lighting color already close to daylight.
    NotNeeded,
    /// A correction was applied.
    Applied,
    /// Correction needed but every method was rejected.
    Rejected,
    /// Lighting color could not be measured.
    Undetermined,
}

impl AwbStatus {
    /// Feedback sentence.
    #[must_use]
    pub const fn feedback(self) -> &'static str {
        match self {
            Self::NotNeeded => "White balance is already neutral.",
            Self::Applied => "White balance was corrected.",
            Self::Rejected => {
                "The lighting color is too strong to correct safely. Use neutral white light."
            }
            Self::Undetermined => "White balance could not be measured.",
        }
    }
}

/// Why a method was not used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AwbRejection {
    /// Too little non-skin area to use as a reference.
    InsufficientNonSkin,
    /// The non-skin reference is too dark.
    NonSkinTooDark,
    /// Gains outside the safe band.
    MarginalGains,
    /// Gains outside the hard band.
    ExtremeGains,
    /// The reference average is black or otherwise unusable.
    Degenerate,
}

impl AwbRejection {
    /// Feedback sentence.
    #[must_use]
    pub const fn feedback(self) -> &'static str {
        match self {
            Self::InsufficientNonSkin => "Too little background is visible to judge the light color.",
            Self::NonSkinTooDark => "The background is too dark to judge the light color.",
            Self::MarginalGains => "The required color correction is larger than allowed.",
            Self::ExtremeGains => "The lighting color is far from daylight.",
            Self::Degenerate => "The light color could not be measured.",
        }
    }
}

/// One method that was tried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwbAttempt {
    /// Method tried.
    pub method: AwbMethod,
    /// Gains it produced, if it got that far.
    pub gains: Option<AwbGains>,
    /// Why it was dropped; `None` for the accepted attempt.
    pub rejection: Option<AwbRejection>,
}

/// Output of the white-balance stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwbResult {
    /// Whether a correction was applied.
    pub applied: bool,
    /// Outcome.
    pub status: AwbStatus,
    /// Method used.
    pub method: AwbMethod,
    /// Applied gains (unity when nothing was applied).
    pub gains: AwbGains,
    /// CCT before correction.
    pub original_cct: Option<f64>,
    /// CCT after correction (the original when nothing was applied).
    pub corrected_cct: Option<f64>,
    /// Skin fraction of the face area.
    pub skin_ratio: f64,
    /// Non-skin fraction of the image.
    pub non_skin_ratio: f64,
    /// Decision confidence, 0–1.
    pub confidence: f64,
    /// Why the last method was dropped when nothing was applied.
    pub rejection: Option<AwbRejection>,
    /// Methods tried, in order.
    pub attempts: Vec<AwbAttempt>,
    /// Feedback sentence.
    pub feedback: String,
    /// Produced by the fallback path rather than measured.
    #[serde(default)]
    pub is_fallback: bool,
    /// Corrected buffer when a correction was applied.
    #[serde(skip)]
    pub corrected_image: Option<Arc<RgbImageData>>,
}

impl AwbResult {
    /// Stage score, 0–100.
    #[must_use]
    pub fn score(&self) -> f64 {
        match self.status {
            AwbStatus::NotNeeded => 100.0,
            AwbStatus::Applied => (self.confidence * 100.0).clamp(0.0, 100.0),
            AwbStatus::Rejected | AwbStatus::Undetermined => 50.0,
        }
    }

    fn unchanged(status: AwbStatus, cct: Option<f64>, confidence: f64) -> Self {
        Self {
            applied: false,
            status,
            method: AwbMethod::None,
            gains: AwbGains::UNITY,
            original_cct: cct,
            corrected_cct: cct,
            skin_ratio: 0.0,
            non_skin_ratio: 1.0,
            confidence,
            rejection: None,
            attempts: Vec::new(),
            feedback: status.feedback().to_string(),
            is_fallback: false,
            corrected_image: None,
        }
    }
}

/// Input of the white-balance stage.
#[derive(Debug, Clone)]
pub struct AwbInput {
    /// Raw capture.
    pub image: Arc<RgbImageData>,
    /// Face box from stage 2, if any.
    pub face_box: Option<BoundingBox>,
}

impl AwbInput {
    /// Input without a face box.
    #[must_use]
    pub const fn new(image: Arc<RgbImageData>) -> Self {
        Self {
            image,
            face_box: None,
        }
    }

    /// Restricts skin detection to `face_box`.
    #[must_use]
    pub const fn with_face_box(mut self, face_box: Option<BoundingBox>) -> Self {
        self.face_box = face_box;
        self
    }
}

struct Candidate {
    method: AwbMethod,
    gains: AwbGains,
    image: RgbImageData,
}

/// White-balance stage.
#[derive(Debug, Clone, Default)]
pub struct AwbCorrector {
    config: AwbConfig,
}

impl AwbCorrector {
    /// Creates a corrector with the given configuration.
    #[must_use]
    pub const fn new(config: AwbConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &AwbConfig {
        &self.config
    }

    /// Measures and, if needed, corrects the lighting color.
    #[must_use]
    pub fn correct(&self, image: &RgbImageData, face_box: Option<BoundingBox>) -> AwbResult {
        let config = &self.config;
        let Some(average) = image_average(image) else {
            return AwbResult::unchanged(AwbStatus::Undetermined, None, 0.0);
        };
        let Some(original_cct) = color::estimate_cct(average) else {
            debug!("AWB: degenerate chromaticity, skipping");
            return AwbResult::unchanged(AwbStatus::Undetermined, None, 0.0);
        };
        let deviation = (original_cct - config.target_kelvin).abs();
        if deviation <= config.tolerance_kelvin {
            debug!(cct = original_cct, "AWB: no correction needed");
            return AwbResult::unchanged(AwbStatus::NotNeeded, Some(original_cct), 1.0);
        }

        let mask = SkinMask::detect(image, face_box, &config.skin);
        let skin_ratio = mask.skin_ratio();
        let non_skin_ratio = mask.non_skin_ratio();
        let mut attempts = Vec::new();
        let mut accepted = None;

        let enough_skin = skin_ratio >= config.min_skin_ratio;
        if enough_skin {
            accepted = self.try_skin_aware(image, &mask, &mut attempts);
        }
        if accepted.is_none() && (enough_skin || deviation > config.large_deviation_kelvin) {
            accepted = self.try_von_kries(image, average, &mut attempts);
        }
        if accepted.is_none() {
            accepted = self.try_gray_world(image, average, &mut attempts);
        }

        let confidence_gains = accepted
            .as_ref()
            .map(|c| c.gains)
            .or_else(|| attempts.iter().rev().find_map(|a| a.gains))
            .unwrap_or(AwbGains::UNITY);
        let confidence = confidence::confidence(
            &ConfidenceInputs {
                gains: confidence_gains,
                cct_deviation: deviation,
                non_skin_ratio,
            },
            &config.gains,
            config.tolerance_kelvin,
            config.large_deviation_kelvin,
            &config.confidence,
        );

        debug!(
            cct = original_cct,
            skin_ratio,
            non_skin_ratio,
            attempts = attempts.len(),
            "AWB metrics"
        );

        match accepted {
            Some(candidate) => {
                let corrected_cct = image_average(&candidate.image).and_then(color::estimate_cct);
                AwbResult {
                    applied: true,
                    status: AwbStatus::Applied,
                    method: candidate.method,
                    gains: candidate.gains,
                    original_cct: Some(original_cct),
                    corrected_cct,
                    skin_ratio,
                    non_skin_ratio,
                    confidence,
                    rejection: None,
                    attempts,
                    feedback: format!(
                        "{} Method: {}.",
                        AwbStatus::Applied.feedback(),
                        candidate.method.label()
                    ),
                    is_fallback: false,
                    corrected_image: Some(Arc::new(candidate.image)),
                }
            }
            None => {
                let rejection = attempts.last().and_then(|a| a.rejection);
                AwbResult {
                    skin_ratio,
                    non_skin_ratio,
                    rejection,
                    attempts,
                    ..AwbResult::unchanged(AwbStatus::Rejected, Some(original_cct), confidence)
                }
            }
        }
    }

    fn try_skin_aware(
        &self,
        image: &RgbImageData,
        mask: &SkinMask,
        attempts: &mut Vec<AwbAttempt>,
    ) -> Option<Candidate> {
        let config = &self.config;
        let method = AwbMethod::SkinAware;
        let reject = |attempts: &mut Vec<AwbAttempt>, gains, rejection| {
            attempts.push(AwbAttempt {
                method,
                gains,
                rejection: Some(rejection),
            });
            None
        };

        if mask.non_skin_ratio() < config.min_non_skin_ratio {
            return reject(attempts, None, AwbRejection::InsufficientNonSkin);
        }
        let Some(reference) = mask.non_skin_average() else {
            return reject(attempts, None, AwbRejection::InsufficientNonSkin);
        };
        if reference.luma() < config.min_non_skin_brightness {
            return reject(attempts, None, AwbRejection::NonSkinTooDark);
        }
        let Some(gains) = AwbGains::gray_world(reference, config.gray_world_target) else {
            return reject(attempts, None, AwbRejection::Degenerate);
        };
        self.accept_or_reject(method, gains, || gains.apply(image), attempts)
    }

    fn try_von_kries(
        &self,
        image: &RgbImageData,
        average: Rgb,
        attempts: &mut Vec<AwbAttempt>,
    ) -> Option<Candidate> {
        let method = AwbMethod::VonKries;
        let Some(matrix) = von_kries_matrix(average) else {
            attempts.push(AwbAttempt {
                method,
                gains: None,
                rejection: Some(AwbRejection::Degenerate),
            });
            return None;
        };
        let corrected = apply_linear_matrix(image, &matrix);
        let gains = image_average(&corrected)
            .map_or(AwbGains::UNITY, |after| AwbGains::effective(after, average));
        self.accept_or_reject(method, gains, || corrected, attempts)
    }

    fn try_gray_world(
        &self,
        image: &RgbImageData,
        average: Rgb,
        attempts: &mut Vec<AwbAttempt>,
    ) -> Option<Candidate> {
        let method = AwbMethod::GrayWorld;
        let Some(gains) = AwbGains::gray_world(average, self.config.gray_world_target) else {
            attempts.push(AwbAttempt {
                method,
                gains: None,
                rejection: Some(AwbRejection::Degenerate),
            });
            return None;
        };
        self.accept_or_reject(method, gains, || gains.apply(image), attempts)
    }

    fn accept_or_reject(
        &self,
        method: AwbMethod,
        gains: AwbGains,
        corrected: impl FnOnce() -> RgbImageData,
        attempts: &mut Vec<AwbAttempt>,
    ) -> Option<Candidate> {
        let rejection = match self.config.gains.assess(&gains) {
            GainAssessment::Safe => None,
            GainAssessment::Marginal => Some(AwbRejection::MarginalGains),
            GainAssessment::Extreme => Some(AwbRejection::ExtremeGains),
        };
        debug!(method = method.label(), r = gains.r, g = gains.g, b = gains.b, ?rejection, "AWB attempt");
        attempts.push(AwbAttempt {
            method,
            gains: Some(gains),
            rejection,
        });
        rejection.is_none().then(|| Candidate {
            method,
            gains,
            image: corrected(),
        })
    }
}

impl QaStage for AwbCorrector {
    type Input = AwbInput;
    type Output = AwbResult;

    fn name(&self) -> &'static str {
        "awb"
    }

    fn run(&self, input: &AwbInput) -> anyhow::Result<AwbResult> {
        Ok(self.correct(&input.image, input.face_box))
    }
}
