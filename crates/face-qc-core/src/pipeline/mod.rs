//! Four-stage orchestration.
//!
//! The pipeline moves through `idle → cie1 → cie2 → cie3 → cie4` and ends in
//! `complete` or `failed`. Every stage runs under its own time budget; a
//! stage that times out, errors or panics is replaced by its fallback record
//! so that [`Pipeline::run`] always returns a result.

mod config;
mod result;
mod timeout;

pub use config::{OrchestratorConfig, PipelineConfig, StageTimeouts, StageWeights};
pub use result::{PipelineResult, PipelineStage, RejectionReason, StageStatus, StageTiming};
pub use timeout::{run_with_timeout, SharedStage, StageOutcome};

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::domain::{QaStage, RgbImageData};
use crate::modules::{
    awb, face, lighting, quality, AwbCorrector, AwbInput, AwbResult, FaceAnalysis, FaceProcessor,
    LightingAnalysis, LightingAnalyzer, LightingInput, QualityReport, QualityValidator,
};
use crate::ports::LandmarkProvider;

/// The photo pipeline.
pub struct Pipeline {
    config: PipelineConfig,
    quality: SharedStage<RgbImageData, QualityReport>,
    face: SharedStage<RgbImageData, FaceAnalysis>,
    awb: SharedStage<AwbInput, AwbResult>,
    lighting: SharedStage<LightingInput, LightingAnalysis>,
}

impl Pipeline {
    /// Builds the standard stages from `config`, with faces from `provider`.
    #[must_use]
    pub fn new(config: PipelineConfig, provider: Arc<dyn LandmarkProvider>) -> Self {
        Self {
            quality: Arc::new(QualityValidator::new(config.quality.clone())),
            face: Arc::new(FaceProcessor::new(config.face.clone(), provider)),
            awb: Arc::new(AwbCorrector::new(config.awb.clone())),
            lighting: Arc::new(LightingAnalyzer::new(config.lighting.clone())),
            config,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Replaces stage 1.
    #[must_use]
    pub fn with_quality_stage(
        mut self,
        stage: impl QaStage<Input = RgbImageData, Output = QualityReport> + 'static,
    ) -> Self {
        self.quality = Arc::new(stage);
        self
    }

    /// Replaces stage 2.
    #[must_use]
    pub fn with_face_stage(
        mut self,
        stage: impl QaStage<Input = RgbImageData, Output = FaceAnalysis> + 'static,
    ) -> Self {
        self.face = Arc::new(stage);
        self
    }

    /// Replaces stage 3.
    #[must_use]
    pub fn with_awb_stage(mut self, stage: impl QaStage<Input = AwbInput, Output = AwbResult> + 'static) -> Self {
        self.awb = Arc::new(stage);
        self
    }

    /// Replaces stage 4.
    #[must_use]
    pub fn with_lighting_stage(
        mut self,
        stage: impl QaStage<Input = LightingInput, Output = LightingAnalysis> + 'static,
    ) -> Self {
        self.lighting = Arc::new(stage);
        self
    }

    /// Runs every stage on `image`.
    #[must_use]
    pub fn run(&self, image: Arc<RgbImageData>) -> PipelineResult {
        if let Err(e) = self.config.validate() {
            warn!(error = %e, "Invalid pipeline configuration");
            return PipelineResult::pipeline_error(RejectionReason::PipelineError.feedback());
        }

        let orchestrator = &self.config.orchestrator;
        let timeouts = &orchestrator.timeouts;
        let (width, height) = (image.width(), image.height());
        let mut result = PipelineResult::default();

        // cie1
        if orchestrator.skip_quality {
            skip(&mut result, PipelineStage::Quality);
        } else {
            let report = run_stage(
                &mut result,
                PipelineStage::Quality,
                &self.quality,
                Arc::clone(&image),
                timeouts.quality(),
                || quality::fallback::report(&self.config.quality, width, height),
            );
            let rejected = !report.is_fallback && !report.is_acceptable;
            result.quality = Some(report);
            if rejected && !orchestrator.continue_on_quality_failure {
                return self.finish(result, Some(RejectionReason::QualityRejected));
            }
        }

        // cie2
        let analysis = run_stage(
            &mut result,
            PipelineStage::Face,
            &self.face,
            Arc::clone(&image),
            timeouts.face(),
            face::fallback::analysis,
        );
        let face_rejection = if !analysis.is_fallback && !analysis.face_detected {
            Some(RejectionReason::NoFaceDetected)
        } else if orchestrator.require_frontal && analysis.is_turned_away() {
            Some(RejectionReason::FaceNotFrontal)
        } else {
            None
        };
        let face_box = analysis.bounding_box;
        let forehead = analysis.forehead;
        result.face = Some(analysis);
        if face_rejection.is_some() && !orchestrator.continue_on_face_failure {
            return self.finish(result, face_rejection);
        }

        // cie3
        let mut working = Arc::clone(&image);
        if orchestrator.skip_awb {
            skip(&mut result, PipelineStage::Awb);
        } else {
            let input = AwbInput::new(Arc::clone(&image)).with_face_box(face_box);
            let awb = run_stage(
                &mut result,
                PipelineStage::Awb,
                &self.awb,
                Arc::new(input),
                timeouts.awb(),
                awb::fallback::result,
            );
            if let Some(corrected) = &awb.corrected_image {
                working = Arc::clone(corrected);
                result.corrected_image = Some(Arc::clone(corrected));
            }
            result.awb = Some(awb);
        }

        // cie4
        if orchestrator.skip_lighting {
            skip(&mut result, PipelineStage::Lighting);
        } else {
            let input = LightingInput::new(working).with_face(face_box, forehead);
            let analysis = run_stage(
                &mut result,
                PipelineStage::Lighting,
                &self.lighting,
                Arc::new(input),
                timeouts.lighting(),
                lighting::fallback::analysis,
            );
            result.lighting = Some(analysis);
        }

        self.finish(result, None)
    }

    fn finish(&self, mut result: PipelineResult, early: Option<RejectionReason>) -> PipelineResult {
        let orchestrator = &self.config.orchestrator;
        let (score, confidence) = blend(&result, &orchestrator.weights);
        result.overall_quality_score = score;
        result.overall_confidence = confidence;

        let reason = early.or_else(|| {
            if result.quality.as_ref().is_some_and(|q| !q.is_fallback && !q.is_acceptable) {
                Some(RejectionReason::QualityRejected)
            } else if result.face.as_ref().is_some_and(|f| !f.is_fallback && !f.face_detected) {
                Some(RejectionReason::NoFaceDetected)
            } else if orchestrator.require_frontal
                && result.face.as_ref().is_some_and(FaceAnalysis::is_turned_away)
            {
                Some(RejectionReason::FaceNotFrontal)
            } else if result.lighting.as_ref().is_some_and(|l| !l.is_fallback && !l.is_suitable) {
                Some(RejectionReason::LightingUnsuitable)
            } else if score < orchestrator.min_overall_score {
                Some(RejectionReason::LowOverallScore)
            } else {
                None
            }
        });

        result.stage = if early.is_some() {
            PipelineStage::Failed
        } else {
            PipelineStage::Complete
        };
        result.is_suitable_for_analysis = result.stage == PipelineStage::Complete && reason.is_none();
        result.rejection_reason = reason;
        result.rejection_message = reason.map(|r| r.feedback().to_string());

        info!(
            stage = result.stage.label(),
            suitable = result.is_suitable_for_analysis,
            score = result.overall_quality_score,
            confidence = result.overall_confidence,
            reason = ?result.rejection_reason,
            "Pipeline finished"
        );
        result
    }
}

fn run_stage<I, O>(
    result: &mut PipelineResult,
    stage: PipelineStage,
    runner: &SharedStage<I, O>,
    input: Arc<I>,
    budget: Duration,
    fallback: impl FnOnce() -> O,
) -> O
where
    I: Send + Sync + 'static,
    O: Send + 'static,
{
    debug!(stage = stage.label(), implementation = runner.name(), "Running stage");
    let (outcome, elapsed) = run_with_timeout(runner, input, budget);
    let (output, status) = match outcome {
        StageOutcome::Completed(output) => (output, StageStatus::Completed),
        StageOutcome::TimedOut => {
            warn!(stage = stage.label(), ?budget, "Stage timed out, using fallback");
            (fallback(), StageStatus::TimedOut)
        }
        StageOutcome::Faulted(message) => {
            warn!(stage = stage.label(), error = %message, "Stage failed, using fallback");
            (fallback(), StageStatus::Faulted { message })
        }
    };
    result.timings.push(StageTiming {
        stage,
        duration_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        status,
    });
    output
}

fn skip(result: &mut PipelineResult, stage: PipelineStage) {
    debug!(stage = stage.label(), "Stage skipped");
    result.skipped_stages.push(stage);
    result.timings.push(StageTiming {
        stage,
        duration_ms: 0,
        status: StageStatus::Skipped,
    });
}

/// Weighted score over the stages that produced output, with weights
/// renormalized, and the mean of their confidences.
#[allow(clippy::cast_precision_loss)]
fn blend(result: &PipelineResult, weights: &StageWeights) -> (f64, f64) {
    let mut parts: Vec<(f64, f64, f64)> = Vec::with_capacity(4);
    if let Some(q) = &result.quality {
        parts.push((weights.quality, q.overall_score, q.confidence));
    }
    if let Some(f) = &result.face {
        parts.push((weights.face, f.score(), f.confidence));
    }
    if let Some(a) = &result.awb {
        parts.push((weights.awb, a.score(), a.confidence));
    }
    if let Some(l) = &result.lighting {
        parts.push((weights.lighting, l.overall_score, l.confidence));
    }
    if parts.is_empty() {
        return (0.0, 0.0);
    }

    let weight_sum: f64 = parts.iter().map(|(w, _, _)| w).sum();
    let score = if weight_sum > 0.0 {
        parts.iter().map(|(w, s, _)| w * s).sum::<f64>() / weight_sum
    } else {
        0.0
    };
    let confidence = parts.iter().map(|(_, _, c)| c).sum::<f64>() / parts.len() as f64;
    (score.clamp(0.0, 100.0), confidence.clamp(0.0, 1.0))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ports::{StaticLandmarkProvider, SyntheticLandmarkProvider};

    fn portrait(size: u32) -> Arc<RgbImageData> {
        Arc::new(
            RgbImageData::from_fn(size, size, |x, y| if (x + y) % 2 == 0 { [156; 3] } else { [100; 3] })
                .unwrap(),
        )
    }

    fn pipeline() -> Pipeline {
        Pipeline::new(PipelineConfig::default(), Arc::new(SyntheticLandmarkProvider::new()))
    }

    #[test]
    fn test_good_photo_is_suitable() {
        let mut config = PipelineConfig::default();
        config.orchestrator.timeouts = StageTimeouts {
            quality_ms: 60_000,
            face_ms: 60_000,
            awb_ms: 60_000,
            lighting_ms: 60_000,
        };
        let pipeline = Pipeline::new(config, Arc::new(SyntheticLandmarkProvider::new()));
        let result = pipeline.run(portrait(1024));
        assert_eq!(result.stage, PipelineStage::Complete);
        assert!(result.is_suitable_for_analysis, "{:?}", result.rejection_reason);
        assert!(result.overall_quality_score >= 80.0, "score = {}", result.overall_quality_score);
        assert!((0.0..=1.0).contains(&result.overall_confidence));
        assert_eq!(result.timings.len(), 4);
        assert!(result.timings.iter().all(|t| t.status == StageStatus::Completed));
        assert!(result.skipped_stages.is_empty());
        assert_eq!(result.awb.as_ref().unwrap().status, crate::modules::AwbStatus::NotNeeded);
        assert!(result.corrected_image.is_none());
    }

    #[test]
    fn test_quality_rejection_stops_pipeline() {
        let black = Arc::new(RgbImageData::filled(600, 600, [0, 0, 0]).unwrap());
        let result = pipeline().run(black);
        assert_eq!(result.stage, PipelineStage::Failed);
        assert!(!result.is_suitable_for_analysis);
        assert_eq!(result.rejection_reason, Some(RejectionReason::QualityRejected));
        assert!(result.face.is_none());
        assert_eq!(result.timings.len(), 1);
    }

    #[test]
    fn test_continue_on_quality_failure() {
        let mut config = PipelineConfig::default();
        config.orchestrator.continue_on_quality_failure = true;
        let pipeline = Pipeline::new(config, Arc::new(SyntheticLandmarkProvider::new()));
        let black = Arc::new(RgbImageData::filled(600, 600, [0, 0, 0]).unwrap());
        let result = pipeline.run(black);
        assert_eq!(result.stage, PipelineStage::Complete);
        assert!(!result.is_suitable_for_analysis);
        assert_eq!(result.rejection_reason, Some(RejectionReason::QualityRejected));
        assert!(result.lighting.is_some());
    }

    #[test]
    fn test_missing_face_continues_by_default() {
        let pipeline = Pipeline::new(PipelineConfig::default(), Arc::new(StaticLandmarkProvider::empty()));
        let result = pipeline.run(portrait(600));
        assert_eq!(result.stage, PipelineStage::Complete);
        assert_eq!(result.rejection_reason, Some(RejectionReason::NoFaceDetected));
        assert!(result.awb.is_some());
        assert!(result.lighting.is_some());
    }

    #[test]
    fn test_missing_face_fails_when_required() {
        let mut config = PipelineConfig::default();
        config.orchestrator.continue_on_face_failure = false;
        let pipeline = Pipeline::new(config, Arc::new(StaticLandmarkProvider::empty()));
        let result = pipeline.run(portrait(600));
        assert_eq!(result.stage, PipelineStage::Failed);
        assert_eq!(result.rejection_reason, Some(RejectionReason::NoFaceDetected));
        assert!(result.awb.is_none());
    }

    fn turned_face_pipeline(pitch: f64, yaw: f64, roll: f64, config: PipelineConfig) -> Pipeline {
        let provider = SyntheticLandmarkProvider::new().with_pose(pitch, yaw, roll);
        Pipeline::new(config, Arc::new(provider))
    }

    fn relaxed_timeouts() -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.orchestrator.timeouts = StageTimeouts {
            quality_ms: 60_000,
            face_ms: 60_000,
            awb_ms: 60_000,
            lighting_ms: 60_000,
        };
        config
    }

    #[test]
    fn test_face_turned_away_is_rejected() {
        for (pitch, yaw, roll) in [(40.0, 50.0, 30.0), (0.0, 170.0, 0.0)] {
            let result = turned_face_pipeline(pitch, yaw, roll, relaxed_timeouts()).run(portrait(1024));
            let face = result.face.as_ref().unwrap();
            assert!(face.face_detected);
            assert_eq!(face.frontality.verdict, crate::modules::face::FrontalityVerdict::NotFrontal);
            assert_eq!(result.stage, PipelineStage::Complete);
            assert!(!result.is_suitable_for_analysis, "pose ({pitch}, {yaw}, {roll})");
            assert_eq!(result.rejection_reason, Some(RejectionReason::FaceNotFrontal));
        }
    }

    #[test]
    fn test_face_turned_away_stops_when_face_required() {
        let mut config = relaxed_timeouts();
        config.orchestrator.continue_on_face_failure = false;
        let result = turned_face_pipeline(0.0, 60.0, 0.0, config).run(portrait(1024));
        assert_eq!(result.stage, PipelineStage::Failed);
        assert_eq!(result.rejection_reason, Some(RejectionReason::FaceNotFrontal));
        assert!(result.awb.is_none());
        assert!(result.lighting.is_none());
    }

    #[test]
    fn test_frontal_check_can_be_disabled() {
        let mut config = relaxed_timeouts();
        config.orchestrator.require_frontal = false;
        let result = turned_face_pipeline(0.0, 60.0, 0.0, config).run(portrait(1024));
        assert_ne!(result.rejection_reason, Some(RejectionReason::FaceNotFrontal));
    }

    #[test]
    fn test_slightly_turned_face_is_not_rejected_for_pose() {
        let result = turned_face_pipeline(0.0, 25.0, 0.0, relaxed_timeouts()).run(portrait(1024));
        assert!(!result.face.as_ref().unwrap().frontality.is_frontal);
        assert_ne!(result.rejection_reason, Some(RejectionReason::FaceNotFrontal));
    }

    #[test]
    fn test_skipped_stages_are_listed() {
        let mut config = PipelineConfig::default();
        config.orchestrator.skip_awb = true;
        config.orchestrator.skip_lighting = true;
        let pipeline = Pipeline::new(config, Arc::new(SyntheticLandmarkProvider::new()));
        let result = pipeline.run(portrait(600));
        assert_eq!(result.skipped_stages, vec![PipelineStage::Awb, PipelineStage::Lighting]);
        assert_eq!(result.status_of(PipelineStage::Awb), Some(&StageStatus::Skipped));
        assert!(result.awb.is_none());
        assert!(result.lighting.is_none());
    }

    #[test]
    fn test_invalid_config_is_a_pipeline_fault() {
        let mut config = PipelineConfig::default();
        config.lighting.cct_falloff_kelvin = 0.0;
        let pipeline = Pipeline::new(config, Arc::new(SyntheticLandmarkProvider::new()));
        let result = pipeline.run(portrait(600));
        assert_eq!(result.stage, PipelineStage::Failed);
        assert!(!result.is_suitable_for_analysis);
        assert_eq!(result.rejection_reason, Some(RejectionReason::PipelineError));
        assert!(result.timings.is_empty());
    }

    #[test]
    fn test_blend_renormalizes_over_executed_stages() {
        let mut result = PipelineResult::default();
        let mut lighting = lighting::fallback::analysis();
        lighting.overall_score = 80.0;
        lighting.confidence = 0.6;
        result.lighting = Some(lighting);
        let (score, confidence) = blend(&result, &StageWeights::default());
        assert!((score - 80.0).abs() < 1e-9);
        assert!((confidence - 0.6).abs() < 1e-9);
        assert_eq!(blend(&PipelineResult::default(), &StageWeights::default()), (0.0, 0.0));
    }
}
