//! Stand-in report used when the quality stage times out or fails.
//!
//! Resolution is cheap and exact, so it is still computed. Every other check
//! reports a mid-range value at reduced confidence.

use super::{
    analyze_resolution, CctResult, CctVerdict, ExposureResult, QualityConfig, QualityReport,
    SharpnessResult,
};
use crate::color::Rgb;

/// Confidence attached to estimated values.
pub const FALLBACK_CONFIDENCE: f64 = 0.3;

const FALLBACK_FEEDBACK: &str = "The quality check did not finish; values are estimates.";

/// Builds the fallback report for a `width`×`height` capture.
#[must_use]
pub fn report(config: &QualityConfig, width: u32, height: u32) -> QualityReport {
    let sharpness = SharpnessResult::from_variance(config.sharpness.warning_below, &config.sharpness);

    let mid_brightness = (config.exposure.min_brightness + config.exposure.max_brightness) / 2.0;
    let mut exposure = ExposureResult::from_mean(mid_brightness, &config.exposure);
    exposure.confidence = FALLBACK_CONFIDENCE;
    exposure.score = 50.0;

    let cct = &config.color_temperature;
    let color_temperature = CctResult {
        cct_kelvin: cct.target_kelvin,
        chromaticity: None,
        average_rgb: Rgb::new(128.0, 128.0, 128.0),
        sample_ratio: 0.0,
        verdict: CctVerdict::Neutral,
        confidence: FALLBACK_CONFIDENCE,
        score: 50.0,
        feedback: CctVerdict::Neutral.feedback().to_string(),
    };

    let resolution = analyze_resolution(width, height, &config.resolution);

    let mut report = QualityReport::combine(sharpness, exposure, color_temperature, resolution, config);
    if report.primary_issue.is_none() {
        report.feedback = FALLBACK_FEEDBACK.to_string();
    }
    report.is_fallback = true;
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::quality::QualityIssue;

    #[test]
    fn test_fallback_is_mid_range() {
        let report = report(&QualityConfig::default(), 1024, 1024);
        assert!(report.is_fallback);
        assert!(report.is_acceptable);
        assert!((report.confidence - FALLBACK_CONFIDENCE).abs() < 1e-12);
        assert!((40.0..=70.0).contains(&report.overall_score), "score = {}", report.overall_score);
        assert_eq!(report.feedback, FALLBACK_FEEDBACK);
    }

    #[test]
    fn test_fallback_keeps_resolution_rejection() {
        let report = report(&QualityConfig::default(), 100, 100);
        assert!(!report.is_acceptable);
        assert_eq!(report.primary_issue, Some(QualityIssue::Resolution));
    }
}
