//! Color temperature of the capture lighting.

use serde::{Deserialize, Serialize};

use crate::color::{self, Chromaticity, Rgb};
use crate::domain::RgbImageData;
use crate::error::ConfigError;

/// Configuration for CCT estimation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorTemperatureConfig {
    /// Reference white (D65).
    pub target_kelvin: f64,
    /// Lowest acceptable CCT.
    pub acceptable_min_kelvin: f64,
    /// Highest acceptable CCT.
    pub acceptable_max_kelvin: f64,
    /// Pixels with luma at or below this are ignored.
    pub brightness_floor: f64,
    /// Minimum fraction of pixels above the floor before falling back to the
    /// whole-image average.
    pub min_sample_ratio: f64,
    /// Below this the light is too warm.
    pub too_warm_below: f64,
    /// Below this the light is warm.
    pub warm_below: f64,
    /// Above this the light is cool.
    pub cool_above: f64,
    /// Above this the light is too cool.
    pub too_cool_above: f64,
    /// Distance from the target at which confidence reaches 0.
    pub confidence_falloff_kelvin: f64,
    /// Confidence ceiling outside the acceptable range.
    pub out_of_range_confidence_cap: f64,
}

impl Default for ColorTemperatureConfig {
    fn default() -> Self {
        Self {
            target_kelvin: 6500.0,
            acceptable_min_kelvin: 4000.0,
            acceptable_max_kelvin: 7500.0,
            brightness_floor: 50.0,
            min_sample_ratio: 0.05,
            too_warm_below: 4000.0,
            warm_below: 5500.0,
            cool_above: 7000.0,
            too_cool_above: 8500.0,
            confidence_falloff_kelvin: 3000.0,
            out_of_range_confidence_cap: 0.3,
        }
    }
}

impl ColorTemperatureConfig {
    /// Checks band edges are ordered and ratios are fractions.
    ///
    /// # Errors
    ///
    /// Returns an error for misordered bands or out-of-range ratios.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_range("quality.color_temperature.min_sample_ratio", self.min_sample_ratio, 0.0, 1.0)?;
        ConfigError::check_range(
            "quality.color_temperature.out_of_range_confidence_cap",
            self.out_of_range_confidence_cap,
            0.0,
            1.0,
        )?;
        ConfigError::check_range(
            "quality.color_temperature.confidence_falloff_kelvin",
            self.confidence_falloff_kelvin,
            1.0,
            f64::MAX,
        )?;
        ConfigError::check_order(
            "quality.color_temperature.acceptable_min_kelvin",
            self.acceptable_min_kelvin,
            "quality.color_temperature.acceptable_max_kelvin",
            self.acceptable_max_kelvin,
        )?;
        let edges = [
            ("quality.color_temperature.too_warm_below", self.too_warm_below),
            ("quality.color_temperature.warm_below", self.warm_below),
            ("quality.color_temperature.cool_above", self.cool_above),
            ("quality.color_temperature.too_cool_above", self.too_cool_above),
        ];
        for pair in edges.windows(2) {
            ConfigError::check_order(pair[0].0, pair[0].1, pair[1].0, pair[1].1)?;
        }
        Ok(())
    }

    /// Band for a CCT.
    #[must_use]
    pub fn verdict_for(&self, kelvin: f64) -> CctVerdict {
        if kelvin < self.too_warm_below {
            CctVerdict::TooWarm
        } else if kelvin < self.warm_below {
            CctVerdict::Warm
        } else if kelvin <= self.cool_above {
            CctVerdict::Neutral
        } else if kelvin <= self.too_cool_above {
            CctVerdict::Cool
        } else {
            CctVerdict::TooCool
        }
    }

    /// Linear falloff from the target, capped outside the acceptable range.
    #[must_use]
    pub fn confidence_for(&self, kelvin: f64) -> f64 {
        let confidence =
            (1.0 - (kelvin - self.target_kelvin).abs() / self.confidence_falloff_kelvin).clamp(0.0, 1.0);
        if self.is_acceptable(kelvin) {
            confidence
        } else {
            confidence.min(self.out_of_range_confidence_cap)
        }
    }

    /// True inside the acceptable range.
    #[must_use]
    pub fn is_acceptable(&self, kelvin: f64) -> bool {
        (self.acceptable_min_kelvin..=self.acceptable_max_kelvin).contains(&kelvin)
    }
}

/// Lighting color band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CctVerdict {
    /// Strongly orange light.
    TooWarm,
    /// Slightly orange light.
    Warm,
    /// Close to daylight.
    Neutral,
    /// Slightly blue light.
    Cool,
    /// Strongly blue light.
    TooCool,
    /// No usable color signal (e.g. a black frame).
    Undetermined,
}

impl CctVerdict {
    /// User-facing message for this band.
    #[must_use]
    pub const fn feedback(self) -> &'static str {
        match self {
            Self::TooWarm => "The light is very warm. Move to daylight or switch off warm lamps.",
            Self::Warm => "The light is slightly warm.",
            Self::Neutral => "The lighting color is neutral.",
            Self::Cool => "The light is slightly cool.",
            Self::TooCool => "The light is very cool. Avoid shade and blue screens.",
            Self::Undetermined => "The lighting color could not be measured.",
        }
    }
}

/// Color temperature measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CctResult {
    /// Estimated CCT in Kelvin (the target when undetermined).
    pub cct_kelvin: f64,
    /// Chromaticity of the sampled average.
    pub chromaticity: Option<Chromaticity>,
    /// Average RGB the estimate was made from.
    pub average_rgb: Rgb,
    /// Fraction of pixels that passed the brightness floor.
    pub sample_ratio: f64,
    /// Band.
    pub verdict: CctVerdict,
    /// Confidence, 0–1.
    pub confidence: f64,
    /// Score, 0–100.
    pub score: f64,
    /// User-facing message.
    pub feedback: String,
}

impl CctResult {
    /// True when the CCT was measured and is inside the acceptable range.
    #[must_use]
    pub fn is_acceptable(&self, config: &ColorTemperatureConfig) -> bool {
        self.verdict != CctVerdict::Undetermined && config.is_acceptable(self.cct_kelvin)
    }

    /// The record for an image without a usable color signal.
    #[must_use]
    pub fn undetermined(average_rgb: Rgb, sample_ratio: f64, config: &ColorTemperatureConfig) -> Self {
        Self {
            cct_kelvin: config.target_kelvin,
            chromaticity: None,
            average_rgb,
            sample_ratio,
            verdict: CctVerdict::Undetermined,
            confidence: 0.0,
            score: 0.0,
            feedback: CctVerdict::Undetermined.feedback().to_string(),
        }
    }
}

/// Estimates the CCT of the capture lighting.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn analyze_color_temperature(image: &RgbImageData, config: &ColorTemperatureConfig) -> CctResult {
    let total = image.pixel_count().max(1) as f64;
    let (bright, count) = color::average_rgb(image, |[r, g, b]| {
        color::luma(r, g, b) > config.brightness_floor
    });
    let sample_ratio = count as f64 / total;
    let average = if sample_ratio >= config.min_sample_ratio {
        bright
    } else {
        color::average_rgb(image, |_| true).0
    }
    .unwrap_or_default();

    let chromaticity = Chromaticity::from_xyz(color::rgb_to_xyz(average));
    let Some(cct) = chromaticity.map(color::mccamy_cct).filter(|k| k.is_finite()) else {
        return CctResult::undetermined(average, sample_ratio, config);
    };

    let verdict = config.verdict_for(cct);
    let confidence = config.confidence_for(cct);
    CctResult {
        cct_kelvin: cct,
        chromaticity,
        average_rgb: average,
        sample_ratio,
        verdict,
        confidence,
        score: confidence * 100.0,
        feedback: verdict.feedback().to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_gray_is_neutral_near_d65() {
        let image = RgbImageData::filled(32, 32, [128, 128, 128]).unwrap();
        let result = analyze_color_temperature(&image, &ColorTemperatureConfig::default());
        assert!((result.cct_kelvin - 6500.0).abs() < 50.0, "cct = {}", result.cct_kelvin);
        assert_eq!(result.verdict, CctVerdict::Neutral);
        assert!(result.confidence > 0.95);
        assert!((result.sample_ratio - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_black_is_undetermined() {
        let config = ColorTemperatureConfig::default();
        let image = RgbImageData::filled(16, 16, [0, 0, 0]).unwrap();
        let result = analyze_color_temperature(&image, &config);
        assert_eq!(result.verdict, CctVerdict::Undetermined);
        assert!(result.confidence.abs() < f64::EPSILON);
        assert!((result.cct_kelvin - 6500.0).abs() < f64::EPSILON);
        assert!(!result.is_acceptable(&config));
    }

    #[test]
    fn test_warm_cast_is_too_warm() {
        let config = ColorTemperatureConfig::default();
        let image = RgbImageData::filled(16, 16, [200, 150, 100]).unwrap();
        let result = analyze_color_temperature(&image, &config);
        assert_eq!(result.verdict, CctVerdict::TooWarm);
        assert!(result.confidence <= config.out_of_range_confidence_cap + 1e-12);
    }

    #[test]
    fn test_dark_pixels_are_ignored() {
        let image = RgbImageData::from_fn(10, 10, |x, _| if x < 5 { [10, 0, 40] } else { [128; 3] }).unwrap();
        let result = analyze_color_temperature(&image, &ColorTemperatureConfig::default());
        assert!((result.sample_ratio - 0.5).abs() < 1e-9);
        assert_eq!(result.average_rgb, Rgb::new(128.0, 128.0, 128.0));
    }

    #[test]
    fn test_falls_back_to_whole_image_when_too_dark() {
        let image = RgbImageData::from_fn(10, 10, |x, y| {
            if x == 0 && y == 0 {
                [200, 200, 200]
            } else {
                [30, 30, 30]
            }
        })
        .unwrap();
        let result = analyze_color_temperature(&image, &ColorTemperatureConfig::default());
        assert!((result.sample_ratio - 0.01).abs() < 1e-9);
        assert!((result.average_rgb.r - 31.7).abs() < 1e-9);
    }

    #[test]
    fn test_verdict_bands() {
        let config = ColorTemperatureConfig::default();
        assert_eq!(config.verdict_for(3000.0), CctVerdict::TooWarm);
        assert_eq!(config.verdict_for(5000.0), CctVerdict::Warm);
        assert_eq!(config.verdict_for(6500.0), CctVerdict::Neutral);
        assert_eq!(config.verdict_for(7800.0), CctVerdict::Cool);
        assert_eq!(config.verdict_for(9000.0), CctVerdict::TooCool);
    }

    #[test]
    fn test_confidence_is_bounded() {
        let config = ColorTemperatureConfig::default();
        for kelvin in [1000.0, 4000.0, 6500.0, 7500.0, 7600.0, 20000.0] {
            let c = config.confidence_for(kelvin);
            assert!((0.0..=1.0).contains(&c));
        }
        assert!((config.confidence_for(6500.0) - 1.0).abs() < f64::EPSILON);
        assert!(config.confidence_for(7600.0) <= 0.3);
    }
}
