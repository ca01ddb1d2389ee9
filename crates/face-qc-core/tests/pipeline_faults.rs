//! Pipeline behavior when stages misbehave.
//!
//! Stages are swapped for slow, failing or panicking doubles; the pipeline
//! must still return a complete, deterministic result built from fallbacks.

#![allow(clippy::unwrap_used, clippy::float_cmp)]

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use face_qc_core::domain::RgbImageData;
use face_qc_core::modules::{
    AwbConfig, AwbCorrector, AwbInput, AwbResult, FaceConfig, FaceProcessor, LightingAnalysis,
    LightingInput,
};
use face_qc_core::pipeline::{
    Pipeline, PipelineConfig, PipelineResult, PipelineStage, StageStatus, StageTimeouts,
};
use face_qc_core::ports::SyntheticLandmarkProvider;
use face_qc_test_support::{
    CountingStage, FailingLandmarkProvider, FailingStage, PanickingStage, SlowStage,
    SyntheticImageBuilder,
};

fn relaxed_config() -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.orchestrator.timeouts = StageTimeouts {
        quality_ms: 60_000,
        face_ms: 60_000,
        awb_ms: 60_000,
        lighting_ms: 60_000,
    };
    config.orchestrator.continue_on_quality_failure = true;
    config
}

fn image() -> Arc<RgbImageData> {
    SyntheticImageBuilder::portrait(512).image
}

fn pipeline(config: PipelineConfig) -> Pipeline {
    Pipeline::new(config, Arc::new(SyntheticLandmarkProvider::new()))
}

fn statuses(result: &PipelineResult) -> Vec<(PipelineStage, StageStatus)> {
    result.timings.iter().map(|t| (t.stage, t.status.clone())).collect()
}

#[test]
fn test_slow_face_stage_falls_back() {
    let mut config = relaxed_config();
    config.orchestrator.timeouts.face_ms = 50;
    let slow = SlowStage::new(
        FaceProcessor::new(FaceConfig::default(), Arc::new(SyntheticLandmarkProvider::new())),
        Duration::from_secs(2),
    );
    let pipeline = pipeline(config).with_face_stage(slow);

    let result = pipeline.run(image());

    assert_eq!(result.stage, PipelineStage::Complete);
    assert_eq!(result.status_of(PipelineStage::Face), Some(&StageStatus::TimedOut));
    let face = result.face.as_ref().unwrap();
    assert!(face.is_fallback);
    assert!((face.confidence - 0.3).abs() < 1e-9);
    assert!(result.awb.is_some());
    assert!(result.lighting.is_some());
    assert_eq!(result.timings.len(), 4);
}

#[test]
fn test_timeout_result_is_deterministic() {
    let mut config = relaxed_config();
    config.orchestrator.timeouts.face_ms = 20;
    let slow = SlowStage::new(
        FaceProcessor::new(FaceConfig::default(), Arc::new(SyntheticLandmarkProvider::new())),
        Duration::from_secs(1),
    );
    let pipeline = pipeline(config).with_face_stage(slow);
    let img = image();

    let first = pipeline.run(Arc::clone(&img));
    let second = pipeline.run(img);

    assert_eq!(first.overall_quality_score, second.overall_quality_score);
    assert_eq!(first.overall_confidence, second.overall_confidence);
    assert_eq!(first.rejection_reason, second.rejection_reason);
    assert_eq!(statuses(&first), statuses(&second));
}

#[test]
fn test_failing_awb_stage_is_faulted() {
    let pipeline = pipeline(relaxed_config())
        .with_awb_stage(FailingStage::<AwbInput, AwbResult>::new("awb broke"));

    let result = pipeline.run(image());

    match result.status_of(PipelineStage::Awb) {
        Some(StageStatus::Faulted { message }) => assert!(message.contains("awb broke")),
        other => panic!("unexpected status {other:?}"),
    }
    let awb = result.awb.as_ref().unwrap();
    assert!(awb.is_fallback);
    assert!(result.corrected_image.is_none());
    assert!(result.lighting.is_some());
    assert_eq!(result.stage, PipelineStage::Complete);
}

#[test]
fn test_panicking_lighting_stage_is_faulted() {
    let pipeline = pipeline(relaxed_config())
        .with_lighting_stage(PanickingStage::<LightingInput, LightingAnalysis>::new());

    let result = pipeline.run(image());

    assert!(matches!(
        result.status_of(PipelineStage::Lighting),
        Some(StageStatus::Faulted { .. })
    ));
    let lighting = result.lighting.as_ref().unwrap();
    assert!(lighting.is_fallback);
    assert!((lighting.overall_score - 50.0).abs() < 1e-9);
    assert_eq!(result.stage, PipelineStage::Complete);
}

#[test]
fn test_detector_error_is_faulted() {
    let pipeline = Pipeline::new(relaxed_config(), Arc::new(FailingLandmarkProvider));

    let result = pipeline.run(image());

    match result.status_of(PipelineStage::Face) {
        Some(StageStatus::Faulted { message }) => {
            assert!(message.contains("detector unavailable"), "{message}");
        }
        other => panic!("unexpected status {other:?}"),
    }
    assert!(result.face.as_ref().unwrap().is_fallback);
    assert_ne!(
        result.rejection_reason,
        Some(face_qc_core::RejectionReason::NoFaceDetected)
    );
}

#[test]
fn test_skipped_stage_never_runs() {
    let mut config = relaxed_config();
    config.orchestrator.skip_awb = true;
    let counting = CountingStage::new(AwbCorrector::new(AwbConfig::default()));
    let calls = counting.counter();
    let pipeline = pipeline(config).with_awb_stage(counting);

    let result = pipeline.run(image());

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(result.awb.is_none());
    assert_eq!(result.skipped_stages, vec![PipelineStage::Awb]);
    assert_eq!(result.status_of(PipelineStage::Awb), Some(&StageStatus::Skipped));
}

#[test]
fn test_parallel_runs_agree() {
    let pipeline = pipeline(relaxed_config());
    let img = image();
    let expected = pipeline.run(Arc::clone(&img));

    let results: Vec<PipelineResult> = thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let img = Arc::clone(&img);
                let pipeline = &pipeline;
                scope.spawn(move || pipeline.run(img))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for result in results {
        assert_eq!(result.overall_quality_score, expected.overall_quality_score);
        assert_eq!(result.is_suitable_for_analysis, expected.is_suitable_for_analysis);
        assert_eq!(result.rejection_reason, expected.rejection_reason);
        assert_eq!(statuses(&result), statuses(&expected));
    }
}
