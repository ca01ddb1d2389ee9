//! Stand-in result used when the white-balance stage times out or fails.
//!
//! No correction is applied, so stage 4 sees the raw capture.

use super::{AwbGains, AwbMethod, AwbResult, AwbStatus};

/// Confidence attached to the stand-in result.
pub const FALLBACK_CONFIDENCE: f64 = 0.3;

const FALLBACK_FEEDBACK: &str = "White balance was not checked.";

/// Builds the fallback result.
#[must_use]
pub fn result() -> AwbResult {
    AwbResult {
        applied: false,
        status: AwbStatus::Undetermined,
        method: AwbMethod::None,
        gains: AwbGains::UNITY,
        original_cct: None,
        corrected_cct: None,
        skin_ratio: 0.0,
        non_skin_ratio: 0.0,
        confidence: FALLBACK_CONFIDENCE,
        rejection: None,
        attempts: Vec::new(),
        feedback: FALLBACK_FEEDBACK.to_string(),
        is_fallback: true,
        corrected_image: None,
    }
}
