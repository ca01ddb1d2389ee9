//! Pipeline output types.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::RgbImageData;
use crate::modules::{AwbResult, FaceAnalysis, LightingAnalysis, QualityReport};

/// Pipeline state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PipelineStage {
    /// Not started.
    #[default]
    #[serde(rename = "idle")]
    Idle,
    /// Quality validation.
    #[serde(rename = "cie1")]
    Quality,
    /// Face geometry.
    #[serde(rename = "cie2")]
    Face,
    /// White balance.
    #[serde(rename = "cie3")]
    Awb,
    /// Lighting.
    #[serde(rename = "cie4")]
    Lighting,
    /// Every reachable stage ran.
    #[serde(rename = "complete")]
    Complete,
    /// Stopped on a functional rejection or a pipeline fault.
    #[serde(rename = "failed")]
    Failed,
}

impl PipelineStage {
    /// Short stage label used in logs and timings.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Quality => "quality",
            Self::Face => "face",
            Self::Awb => "awb",
            Self::Lighting => "lighting",
            Self::Complete => "complete",
            Self::Failed => "failed",
        }
    }
}

/// How a stage ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// Returned a result in time.
    Completed,
    /// Disabled by configuration.
    Skipped,
    /// Ran out of time; the fallback record was used.
    TimedOut,
    /// Returned an error or panicked; the fallback record was used.
    Faulted {
        /// Error text.
        message: String,
    },
}

impl StageStatus {
    /// True when the fallback record was used.
    #[must_use]
    pub const fn used_fallback(&self) -> bool {
        matches!(self, Self::TimedOut | Self::Faulted { .. })
    }
}

/// Timing and status of one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTiming {
    /// Which stage.
    pub stage: PipelineStage,
    /// Wall-clock time spent waiting for it.
    pub duration_ms: u64,
    /// How it ended.
    pub status: StageStatus,
}

/// Why a photo is not suitable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    /// Stage 1 rejected the capture.
    QualityRejected,
    /// Stage 2 found no face.
    NoFaceDetected,
    /// Stage 2 found a face turned too far from the camera.
    FaceNotFrontal,
    /// Stage 4 found the lighting unsuitable.
    LightingUnsuitable,
    /// The weighted score is below the threshold.
    LowOverallScore,
    /// The pipeline itself failed.
    PipelineError,
}

impl RejectionReason {
    /// Feedback sentence.
    #[must_use]
    pub const fn feedback(self) -> &'static str {
        match self {
            Self::QualityRejected => "The photo quality is too low.",
            Self::NoFaceDetected => "No face was found in the photo.",
            Self::FaceNotFrontal => "The face is not turned toward the camera.",
            Self::LightingUnsuitable => "The lighting on the face is not suitable.",
            Self::LowOverallScore => "The photo does not meet the overall quality bar.",
            Self::PipelineError => "The photo could not be analyzed.",
        }
    }
}

/// Output of one pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineResult {
    /// Final state: `complete` or `failed`.
    pub stage: PipelineStage,
    /// Stage 1 output.
    pub quality: Option<QualityReport>,
    /// Stage 2 output.
    pub face: Option<FaceAnalysis>,
    /// Stage 3 output.
    pub awb: Option<AwbResult>,
    /// Stage 4 output.
    pub lighting: Option<LightingAnalysis>,
    /// Whether the photo may be passed on.
    pub is_suitable_for_analysis: bool,
    /// Weighted score of the stages that ran, 0–100.
    pub overall_quality_score: f64,
    /// Mean confidence of the stages that ran, 0–1.
    pub overall_confidence: f64,
    /// First failing condition.
    pub rejection_reason: Option<RejectionReason>,
    /// Human-readable rejection text.
    pub rejection_message: Option<String>,
    /// Stages disabled by configuration.
    pub skipped_stages: Vec<PipelineStage>,
    /// Per-stage timings, in execution order.
    pub timings: Vec<StageTiming>,
    /// White-balanced image from stage 3.
    #[serde(skip)]
    pub corrected_image: Option<Arc<RgbImageData>>,
}

impl PipelineResult {
    /// Result for a pipeline that could not run at all.
    #[must_use]
    pub fn pipeline_error(message: impl Into<String>) -> Self {
        Self {
            stage: PipelineStage::Failed,
            rejection_reason: Some(RejectionReason::PipelineError),
            rejection_message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Status of `stage`, if it was reached.
    #[must_use]
    pub fn status_of(&self, stage: PipelineStage) -> Option<&StageStatus> {
        self.timings.iter().find(|t| t.stage == stage).map(|t| &t.status)
    }

    /// All user-facing feedback in stage order, deduplicated.
    #[must_use]
    pub fn feedback(&self) -> Vec<String> {
        let mut lines: Vec<String> = Vec::new();
        let mut push = |line: &str| {
            if !line.is_empty() && !lines.iter().any(|l| l == line) {
                lines.push(line.to_string());
            }
        };
        if let Some(message) = &self.rejection_message {
            push(message);
        }
        if let Some(q) = &self.quality {
            push(&q.feedback);
        }
        if let Some(f) = &self.face {
            for line in &f.feedback {
                push(line);
            }
        }
        if let Some(a) = &self.awb {
            push(&a.feedback);
        }
        if let Some(l) = &self.lighting {
            for line in &l.feedback {
                push(line);
            }
        }
        lines
    }
}
