//! Stand-in analysis used when the face stage times out or fails.

use super::{FaceAnalysis, FrontalityResult, FrontalityVerdict};

/// Confidence attached to the stand-in record.
pub const FALLBACK_CONFIDENCE: f64 = 0.3;

const FALLBACK_FEEDBACK: &str = "Face analysis did not finish; face position was not checked.";

/// Builds the fallback analysis.
///
/// No face geometry is known, so later stages treat the whole image as the
/// face area.
#[must_use]
pub fn analysis() -> FaceAnalysis {
    let frontality = FrontalityResult {
        score: 50.0,
        verdict: FrontalityVerdict::SlightlyTurned,
        feedback: vec![FALLBACK_FEEDBACK.to_string()],
        ..FrontalityResult::no_face()
    };
    FaceAnalysis {
        frontality,
        confidence: FALLBACK_CONFIDENCE,
        feedback: vec![FALLBACK_FEEDBACK.to_string()],
        is_fallback: true,
        ..FaceAnalysis::no_face()
    }
}
