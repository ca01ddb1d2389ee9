//! Stage 4: lighting on the face.
//!
//! Works on the white-balanced image when stage 3 produced one. Combines the
//! lighting color on the face, the evenness of a six-zone brightness grid
//! and the strength of any directional shadow into one score.

mod cct;
pub mod fallback;
mod shadow;
mod zones;

pub use cct::{measure as measure_cct, sample_region, CctSource, FaceCct, LightingType};
pub use shadow::{detect_shadow, ShadowAnalysis, ShadowDirection, ShadowSeverity};
pub use zones::{analyze_zones, FaceZone, LightingZoneAnalysis, ZoneBrightness};

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{BoundingBox, NormalizedRect, QaStage, RgbImageData};
use crate::error::ConfigError;

/// Weights and band edges of the shadow severity index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowSeverityConfig {
    /// Weight of the zone intensity spread.
    pub intensity_weight: f64,
    /// Weight of the dark-zone fraction.
    pub dark_weight: f64,
    /// Weight of the bright-zone fraction.
    pub bright_weight: f64,
    /// Lower edge of the mild band.
    pub mild: f64,
    /// Lower edge of the moderate band.
    pub moderate: f64,
    /// Lower edge of the severe band.
    pub severe: f64,
}

impl Default for ShadowSeverityConfig {
    fn default() -> Self {
        Self {
            intensity_weight: 0.6,
            dark_weight: 0.25,
            bright_weight: 0.15,
            mild: 0.1,
            moderate: 0.25,
            severe: 0.45,
        }
    }
}

/// Weights of the overall lighting score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingWeights {
    /// CCT suitability weight.
    pub cct: f64,
    /// Uniformity weight.
    pub uniformity: f64,
    /// Shadow-absence weight.
    pub shadow: f64,
}

impl Default for LightingWeights {
    fn default() -> Self {
        Self {
            cct: 0.40,
            uniformity: 0.35,
            shadow: 0.25,
        }
    }
}

/// Configuration for the lighting stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    /// Daylight reference.
    pub target_kelvin: f64,
    /// Distance from the target at which the CCT score reaches 0.
    pub cct_falloff_kelvin: f64,
    /// Below this the light is extreme.
    pub extreme_below: f64,
    /// Below this the light is warm.
    pub warm_below: f64,
    /// Above this the light is cool.
    pub cool_above: f64,
    /// Above this the light is extreme.
    pub extreme_above: f64,
    /// Minimum brightness gap for a shadow direction.
    pub shadow_gap_threshold: f64,
    /// Zones darker than this count as dark.
    pub dark_zone_level: f64,
    /// Zones brighter than this count as bright.
    pub bright_zone_level: f64,
    /// Shadow severity blend.
    pub severity: ShadowSeverityConfig,
    /// Uniformity below this is remarked on.
    pub min_uniformity: f64,
    /// Overall score weights.
    pub weights: LightingWeights,
    /// Overall score needed for suitable lighting.
    pub min_overall_score: f64,
    /// Zones smaller than this halve the confidence.
    pub min_zone_pixels: u64,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            target_kelvin: 6500.0,
            cct_falloff_kelvin: 3500.0,
            extreme_below: 3000.0,
            warm_below: 5000.0,
            cool_above: 7500.0,
            extreme_above: 10000.0,
            shadow_gap_threshold: 20.0,
            dark_zone_level: 80.0,
            bright_zone_level: 180.0,
            severity: ShadowSeverityConfig::default(),
            min_uniformity: 0.8,
            weights: LightingWeights::default(),
            min_overall_score: 60.0,
            min_zone_pixels: 64,
        }
    }
}

impl LightingConfig {
    /// Validates bands, levels and weights.
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_range("lighting.cct_falloff_kelvin", self.cct_falloff_kelvin, 1.0, f64::MAX)?;
        let bands = [
            ("lighting.extreme_below", self.extreme_below),
            ("lighting.warm_below", self.warm_below),
            ("lighting.cool_above", self.cool_above),
            ("lighting.extreme_above", self.extreme_above),
        ];
        for pair in bands.windows(2) {
            ConfigError::check_order(pair[0].0, pair[0].1, pair[1].0, pair[1].1)?;
        }
        ConfigError::check_order(
            "lighting.dark_zone_level",
            self.dark_zone_level,
            "lighting.bright_zone_level",
            self.bright_zone_level,
        )?;
        let s = &self.severity;
        ConfigError::check_weights(
            "lighting.severity",
            &[s.intensity_weight, s.dark_weight, s.bright_weight],
        )?;
        ConfigError::check_order("lighting.severity.mild", s.mild, "lighting.severity.moderate", s.moderate)?;
        ConfigError::check_order("lighting.severity.moderate", s.moderate, "lighting.severity.severe", s.severe)?;
        ConfigError::check_range("lighting.min_uniformity", self.min_uniformity, 0.0, 1.0)?;
        ConfigError::check_range("lighting.min_overall_score", self.min_overall_score, 0.0, 100.0)?;
        let w = &self.weights;
        ConfigError::check_weights("lighting", &[w.cct, w.uniformity, w.shadow])
    }

    /// Band for a CCT.
    #[must_use]
    pub fn lighting_type_for(&self, kelvin: f64) -> LightingType {
        if kelvin < self.extreme_below || kelvin > self.extreme_above {
            LightingType::Extreme
        } else if kelvin < self.warm_below {
            LightingType::Warm
        } else if kelvin > self.cool_above {
            LightingType::Cool
        } else {
            LightingType::Neutral
        }
    }
}

/// Overall lighting verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightingVerdict {
    /// Score of 80 or more.
    Good,
    /// Suitable but not good.
    Acceptable,
    /// Below the suitability threshold.
    Poor,
}

impl LightingVerdict {
    /// Leading feedback line.
    #[must_use]
    pub const fn feedback(self) -> &'static str {
        match self {
            Self::Good => "The lighting on your face is good.",
            Self::Acceptable => "The lighting on your face is acceptable.",
            Self::Poor => "The lighting on your face is not suitable.",
        }
    }
}

const GOOD_SCORE: f64 = 80.0;

const UNEVEN_FEEDBACK: &str = "The light on your face is uneven. Use soft, frontal light.";

/// Output of the lighting stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightingAnalysis {
    /// Lighting color on the face.
    pub cct: FaceCct,
    /// Six-zone brightness.
    pub zones: LightingZoneAnalysis,
    /// Shadow measurement.
    pub shadow: ShadowAnalysis,
    /// Weighted score, 0–100.
    pub overall_score: f64,
    /// Score meets the threshold.
    pub is_suitable: bool,
    /// Banded verdict.
    pub verdict: LightingVerdict,
    /// Confidence, 0–1.
    pub confidence: f64,
    /// Verdict line first, then remarks.
    pub feedback: Vec<String>,
    /// Produced by the fallback path rather than measured.
    #[serde(default)]
    pub is_fallback: bool,
}

/// Input of the lighting stage.
#[derive(Debug, Clone)]
pub struct LightingInput {
    /// Image to analyze (white-balanced when available).
    pub image: Arc<RgbImageData>,
    /// Face box; the whole image is used without one.
    pub face_box: Option<BoundingBox>,
    /// Forehead patch for the CCT sample.
    pub forehead: Option<NormalizedRect>,
}

impl LightingInput {
    /// Input without face geometry.
    #[must_use]
    pub const fn new(image: Arc<RgbImageData>) -> Self {
        Self {
            image,
            face_box: None,
            forehead: None,
        }
    }

    /// Adds face geometry.
    #[must_use]
    pub const fn with_face(mut self, face_box: Option<BoundingBox>, forehead: Option<NormalizedRect>) -> Self {
        self.face_box = face_box;
        self.forehead = forehead;
        self
    }
}

/// Lighting stage.
#[derive(Debug, Clone, Default)]
pub struct LightingAnalyzer {
    config: LightingConfig,
}

impl LightingAnalyzer {
    /// Creates an analyzer with the given configuration.
    #[must_use]
    pub const fn new(config: LightingConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &LightingConfig {
        &self.config
    }

    /// Analyzes the lighting on the face (or on the whole image).
    #[must_use]
    pub fn analyze(
        &self,
        image: &RgbImageData,
        face_box: Option<BoundingBox>,
        forehead: Option<NormalizedRect>,
    ) -> LightingAnalysis {
        let config = &self.config;
        let (w, h) = (image.width(), image.height());
        let face_box = face_box.map(|b| b.clip_to(w, h)).filter(|b| !b.is_empty());
        let area = face_box.unwrap_or_else(|| BoundingBox::full(w, h));

        let cct = cct::measure(image, face_box, forehead, config);
        let zones = zones::analyze_zones(image, area);
        let shadow = shadow::detect_shadow(&zones, config);

        let weights = &config.weights;
        let weight_sum = weights.cct + weights.uniformity + weights.shadow;
        let overall_score = if weight_sum > 0.0 {
            ((weights.cct * cct.score
                + weights.uniformity * zones.uniformity * 100.0
                + weights.shadow * shadow.score())
                / weight_sum)
                .clamp(0.0, 100.0)
        } else {
            0.0
        };
        let is_suitable = overall_score >= config.min_overall_score;
        let verdict = if !is_suitable {
            LightingVerdict::Poor
        } else if overall_score >= GOOD_SCORE {
            LightingVerdict::Good
        } else {
            LightingVerdict::Acceptable
        };

        let mut confidence = if face_box.is_some() { 1.0 } else { 0.7 };
        if zones.min_zone_pixels() < config.min_zone_pixels {
            confidence /= 2.0;
        }

        let mut feedback = vec![verdict.feedback().to_string()];
        if cct.lighting_type != LightingType::Neutral {
            feedback.push(cct.lighting_type.feedback().to_string());
        }
        if zones.uniformity < config.min_uniformity {
            feedback.push(UNEVEN_FEEDBACK.to_string());
        }
        if shadow.has_shadow {
            feedback.push(shadow.direction.feedback().to_string());
        }

        debug!(
            cct = ?cct.kelvin,
            uniformity = zones.uniformity,
            shadow = ?shadow.severity,
            score = overall_score,
            "Lighting metrics"
        );

        LightingAnalysis {
            cct,
            zones,
            shadow,
            overall_score,
            is_suitable,
            verdict,
            confidence,
            feedback,
            is_fallback: false,
        }
    }
}

impl QaStage for LightingAnalyzer {
    type Input = LightingInput;
    type Output = LightingAnalysis;

    fn name(&self) -> &'static str {
        "lighting"
    }

    fn run(&self, input: &LightingInput) -> anyhow::Result<LightingAnalysis> {
        Ok(self.analyze(&input.image, input.face_box, input.forehead))
    }
}
