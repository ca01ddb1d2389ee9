//! Stand-in analysis used when the lighting stage times out or fails.

use super::{
    CctSource, FaceCct, LightingAnalysis, LightingType, LightingVerdict, LightingZoneAnalysis,
    ShadowAnalysis, ShadowDirection, ShadowSeverity,
};

/// Confidence attached to the stand-in analysis.
pub const FALLBACK_CONFIDENCE: f64 = 0.3;

const FALLBACK_FEEDBACK: &str = "The lighting check did not finish; values are estimates.";

/// Builds the fallback analysis: neutral light, moderately even, no shadow
/// information, scored at 50.
#[must_use]
pub fn analysis() -> LightingAnalysis {
    LightingAnalysis {
        cct: FaceCct {
            kelvin: None,
            source: CctSource::Image,
            lighting_type: LightingType::Undetermined,
            score: 50.0,
        },
        zones: LightingZoneAnalysis {
            zones: Vec::new(),
            mean_luma: 0.0,
            std_dev: 0.0,
            uniformity: 0.5,
            left_right_balance: 1.0,
            vertical_gradient: 0.0,
            left_luma: 0.0,
            right_luma: 0.0,
            top_luma: 0.0,
            bottom_luma: 0.0,
        },
        shadow: ShadowAnalysis {
            direction: ShadowDirection::None,
            intensity: 0.0,
            dark_zone_ratio: 0.0,
            bright_zone_ratio: 0.0,
            severity_index: 0.0,
            severity: ShadowSeverity::None,
            has_shadow: false,
        },
        overall_score: 50.0,
        is_suitable: false,
        verdict: LightingVerdict::Poor,
        confidence: FALLBACK_CONFIDENCE,
        feedback: vec![FALLBACK_FEEDBACK.to_string()],
        is_fallback: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_is_mid_range() {
        let a = analysis();
        assert!(a.is_fallback);
        assert!((a.overall_score - 50.0).abs() < f64::EPSILON);
        assert!((a.confidence - FALLBACK_CONFIDENCE).abs() < f64::EPSILON);
    }
}
