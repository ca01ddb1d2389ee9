//! Pipeline configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::modules::{AwbConfig, FaceConfig, LightingConfig, QualityConfig};

/// Per-stage time budgets in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageTimeouts {
    /// Quality stage.
    pub quality_ms: u64,
    /// Face stage.
    pub face_ms: u64,
    /// White-balance stage.
    pub awb_ms: u64,
    /// Lighting stage.
    pub lighting_ms: u64,
}

impl Default for StageTimeouts {
    fn default() -> Self {
        Self {
            quality_ms: 2000,
            face_ms: 3000,
            awb_ms: 2000,
            lighting_ms: 1500,
        }
    }
}

impl StageTimeouts {
    /// Quality budget.
    #[must_use]
    pub const fn quality(&self) -> Duration {
        Duration::from_millis(self.quality_ms)
    }

    /// Face budget.
    #[must_use]
    pub const fn face(&self) -> Duration {
        Duration::from_millis(self.face_ms)
    }

    /// White-balance budget.
    #[must_use]
    pub const fn awb(&self) -> Duration {
        Duration::from_millis(self.awb_ms)
    }

    /// Lighting budget.
    #[must_use]
    pub const fn lighting(&self) -> Duration {
        Duration::from_millis(self.lighting_ms)
    }
}

/// Weights of each stage in the overall score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageWeights {
    /// Quality weight.
    pub quality: f64,
    /// Face weight.
    pub face: f64,
    /// White-balance weight.
    pub awb: f64,
    /// Lighting weight.
    pub lighting: f64,
}

impl Default for StageWeights {
    fn default() -> Self {
        Self {
            quality: 0.40,
            face: 0.20,
            awb: 0.15,
            lighting: 0.25,
        }
    }
}

/// Orchestration settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct OrchestratorConfig {
    /// Skip stage 1.
    pub skip_quality: bool,
    /// Skip stage 3.
    pub skip_awb: bool,
    /// Skip stage 4.
    pub skip_lighting: bool,
    /// Keep going when stage 1 rejects the capture.
    pub continue_on_quality_failure: bool,
    /// Keep going when stage 2 finds no face or a face turned away.
    pub continue_on_face_failure: bool,
    /// Reject photos whose face is too far from frontal.
    pub require_frontal: bool,
    /// Stage time budgets.
    pub timeouts: StageTimeouts,
    /// Overall score weights.
    pub weights: StageWeights,
    /// Overall score needed for a suitable photo.
    pub min_overall_score: f64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            skip_quality: false,
            skip_awb: false,
            skip_lighting: false,
            continue_on_quality_failure: false,
            continue_on_face_failure: true,
            require_frontal: true,
            timeouts: StageTimeouts::default(),
            weights: StageWeights::default(),
            min_overall_score: 60.0,
        }
    }
}

impl OrchestratorConfig {
    /// Checks weights, threshold and budgets.
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting.
    #[allow(clippy::cast_precision_loss)]
    pub fn validate(&self) -> Result<(), ConfigError> {
        let w = &self.weights;
        ConfigError::check_weights("orchestrator", &[w.quality, w.face, w.awb, w.lighting])?;
        ConfigError::check_range("orchestrator.min_overall_score", self.min_overall_score, 0.0, 100.0)?;
        let t = &self.timeouts;
        for (field, ms) in [
            ("orchestrator.timeouts.quality_ms", t.quality_ms),
            ("orchestrator.timeouts.face_ms", t.face_ms),
            ("orchestrator.timeouts.awb_ms", t.awb_ms),
            ("orchestrator.timeouts.lighting_ms", t.lighting_ms),
        ] {
            ConfigError::check_range(field, ms as f64, 1.0, 600_000.0)?;
        }
        Ok(())
    }
}

/// Configuration of the whole pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Stage 1.
    pub quality: QualityConfig,
    /// Stage 2.
    pub face: FaceConfig,
    /// Stage 3.
    pub awb: AwbConfig,
    /// Stage 4.
    pub lighting: LightingConfig,
    /// Orchestration.
    pub orchestrator: OrchestratorConfig,
}

impl PipelineConfig {
    /// Validates every section.
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.quality.validate()?;
        self.face.validate()?;
        self.awb.validate()?;
        self.lighting.validate()?;
        self.orchestrator.validate()
    }
}
