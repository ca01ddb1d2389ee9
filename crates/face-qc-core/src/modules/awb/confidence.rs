//! Confidence of a white-balance decision.

use serde::{Deserialize, Serialize};

use super::gains::{AwbGains, GainLimits};
use crate::error::ConfigError;

/// Weights and band values for the confidence blend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AwbConfidenceConfig {
    /// Weight of the gain band.
    pub gain_weight: f64,
    /// Weight of the CCT-deviation band.
    pub cct_weight: f64,
    /// Weight of the non-skin area band.
    pub non_skin_weight: f64,
    /// Value of an optimal band.
    pub optimal: f64,
    /// Value of an acceptable band.
    pub acceptable: f64,
    /// Value of a poor band.
    pub poor: f64,
    /// Non-skin ratio at or above which the area is optimal.
    pub non_skin_optimal_ratio: f64,
    /// Non-skin ratio at or above which the area is acceptable.
    pub non_skin_acceptable_ratio: f64,
}

impl Default for AwbConfidenceConfig {
    fn default() -> Self {
        Self {
            gain_weight: 0.4,
            cct_weight: 0.3,
            non_skin_weight: 0.3,
            optimal: 1.0,
            acceptable: 0.7,
            poor: 0.4,
            non_skin_optimal_ratio: 0.5,
            non_skin_acceptable_ratio: 0.2,
        }
    }
}

impl AwbConfidenceConfig {
    /// Checks weights and band values.
    ///
    /// # Errors
    ///
    /// Returns the first invalid value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_weights(
            "awb.confidence",
            &[self.gain_weight, self.cct_weight, self.non_skin_weight],
        )?;
        ConfigError::check_range("awb.confidence.optimal", self.optimal, 0.0, 1.0)?;
        ConfigError::check_range("awb.confidence.acceptable", self.acceptable, 0.0, 1.0)?;
        ConfigError::check_range("awb.confidence.poor", self.poor, 0.0, 1.0)?;
        ConfigError::check_order(
            "awb.confidence.non_skin_acceptable_ratio",
            self.non_skin_acceptable_ratio,
            "awb.confidence.non_skin_optimal_ratio",
            self.non_skin_optimal_ratio,
        )
    }
}

/// Inputs of the confidence blend.
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceInputs {
    /// Gains that were applied or last attempted.
    pub gains: AwbGains,
    /// `|cct − target|` of the original image.
    pub cct_deviation: f64,
    /// Non-skin pixels as a fraction of the image.
    pub non_skin_ratio: f64,
}

/// Blends the three band values into `[0, 1]`.
#[must_use]
pub fn confidence(
    inputs: &ConfidenceInputs,
    limits: &GainLimits,
    tolerance_kelvin: f64,
    large_deviation_kelvin: f64,
    config: &AwbConfidenceConfig,
) -> f64 {
    let gain = if limits.is_optimal(&inputs.gains) {
        config.optimal
    } else if limits.assess(&inputs.gains) == super::gains::GainAssessment::Safe {
        config.acceptable
    } else {
        config.poor
    };

    let cct = if inputs.cct_deviation <= tolerance_kelvin {
        config.optimal
    } else if inputs.cct_deviation <= large_deviation_kelvin {
        config.acceptable
    } else {
        config.poor
    };

    let non_skin = if inputs.non_skin_ratio >= config.non_skin_optimal_ratio {
        config.optimal
    } else if inputs.non_skin_ratio >= config.non_skin_acceptable_ratio {
        config.acceptable
    } else {
        config.poor
    };

    let weight_sum = config.gain_weight + config.cct_weight + config.non_skin_weight;
    if weight_sum <= 0.0 {
        return 0.0;
    }
    ((config.gain_weight * gain + config.cct_weight * cct + config.non_skin_weight * non_skin)
        / weight_sum)
        .clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(gains: AwbGains, deviation: f64, non_skin: f64) -> f64 {
        confidence(
            &ConfidenceInputs {
                gains,
                cct_deviation: deviation,
                non_skin_ratio: non_skin,
            },
            &GainLimits::default(),
            500.0,
            1500.0,
            &AwbConfidenceConfig::default(),
        )
    }

    #[test]
    fn test_all_optimal_is_one() {
        assert!((score(AwbGains::UNITY, 100.0, 0.9) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_bands_step_down() {
        let gains = AwbGains { r: 1.3, g: 1.0, b: 0.9 };
        // 0.4·0.7 + 0.3·0.7 + 0.3·0.4
        assert!((score(gains, 1000.0, 0.1) - 0.61).abs() < 1e-9);
        let poor = AwbGains { r: 1.8, g: 1.0, b: 1.0 };
        assert!((score(poor, 3000.0, 0.0) - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(AwbConfidenceConfig::default().validate().is_ok());
    }
}
