//! Resolution check.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Minimum and recommended capture sizes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionConfig {
    /// Narrower photos are rejected.
    pub min_width: u32,
    /// Shorter photos are rejected.
    pub min_height: u32,
    /// Width at which the score saturates.
    pub recommended_width: u32,
    /// Height at which the score saturates.
    pub recommended_height: u32,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            min_width: 480,
            min_height: 480,
            recommended_width: 1024,
            recommended_height: 1024,
        }
    }
}

impl ResolutionConfig {
    /// Checks the recommended size is non-zero and not below the minimum.
    ///
    /// # Errors
    ///
    /// Returns an error for a zero or misordered size.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_range(
            "quality.resolution.recommended_width",
            f64::from(self.recommended_width),
            1.0,
            f64::MAX,
        )?;
        ConfigError::check_range(
            "quality.resolution.recommended_height",
            f64::from(self.recommended_height),
            1.0,
            f64::MAX,
        )?;
        ConfigError::check_order(
            "quality.resolution.min_width",
            f64::from(self.min_width),
            "quality.resolution.recommended_width",
            f64::from(self.recommended_width),
        )?;
        ConfigError::check_order(
            "quality.resolution.min_height",
            f64::from(self.min_height),
            "quality.resolution.recommended_height",
            f64::from(self.recommended_height),
        )
    }
}

/// Resolution band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionVerdict {
    /// Below the minimum.
    TooSmall,
    /// Valid, but below the recommended size.
    BelowRecommended,
    /// At or above the recommended size.
    Recommended,
}

impl ResolutionVerdict {
    /// User-facing message for this band.
    #[must_use]
    pub const fn feedback(self) -> &'static str {
        match self {
            Self::TooSmall => "The photo resolution is too low. Use the rear camera or move closer.",
            Self::BelowRecommended => "The resolution is usable but below the recommended size.",
            Self::Recommended => "The resolution is good.",
        }
    }
}

/// Resolution measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionResult {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Meets the minimum size.
    pub is_valid: bool,
    /// Score, 0–100.
    pub score: f64,
    /// Band.
    pub verdict: ResolutionVerdict,
    /// User-facing message.
    pub feedback: String,
}

/// Checks a capture size.
#[must_use]
pub fn analyze_resolution(width: u32, height: u32, config: &ResolutionConfig) -> ResolutionResult {
    let is_valid = width >= config.min_width && height >= config.min_height;
    let ratio = (f64::from(width) / f64::from(config.recommended_width.max(1)))
        .min(f64::from(height) / f64::from(config.recommended_height.max(1)))
        .min(1.0);
    let verdict = if !is_valid {
        ResolutionVerdict::TooSmall
    } else if ratio < 1.0 {
        ResolutionVerdict::BelowRecommended
    } else {
        ResolutionVerdict::Recommended
    };
    ResolutionResult {
        width,
        height,
        is_valid,
        score: 100.0 * ratio,
        verdict,
        feedback: verdict.feedback().to_string(),
    }
}
