//! Lighting color measured on the face.

use serde::{Deserialize, Serialize};

use super::LightingConfig;
use crate::color::{self, RgbAccumulator};
use crate::domain::{BoundingBox, NormalizedRect, RgbImageData};

/// Where the CCT sample came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CctSource {
    /// Forehead patch.
    Forehead,
    /// Whole face box.
    Face,
    /// Whole image.
    Image,
}

/// Lighting color band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightingType {
    /// Orange light (tungsten, sunset).
    Warm,
    /// Close to daylight.
    Neutral,
    /// Blue light (shade, screens).
    Cool,
    /// Far outside the usable range.
    Extreme,
    /// No color signal.
    Undetermined,
}

impl LightingType {
    /// Remark for this band; empty for neutral light.
    #[must_use]
    pub const fn feedback(self) -> &'static str {
        match self {
            Self::Warm => "The light on your face is warm. Use daylight or a neutral lamp.",
            Self::Neutral => "",
            Self::Cool => "The light on your face is cool. Avoid shade and screen light.",
            Self::Extreme => "The light on your face is strongly colored. Use neutral white light.",
            Self::Undetermined => "The light color on your face could not be measured.",
        }
    }
}

/// CCT measurement for the lighting stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceCct {
    /// Estimated CCT.
    pub kelvin: Option<f64>,
    /// Sample origin.
    pub source: CctSource,
    /// Band.
    pub lighting_type: LightingType,
    /// Suitability, 0–100.
    pub score: f64,
}

/// Picks the sample region, forehead first.
#[must_use]
pub fn sample_region(
    image: &RgbImageData,
    face_box: Option<BoundingBox>,
    forehead: Option<NormalizedRect>,
) -> (BoundingBox, CctSource) {
    let (w, h) = (image.width(), image.height());
    if let Some(rect) = forehead.map(|r| r.to_pixels(w, h)).filter(|r| !r.is_empty()) {
        return (rect, CctSource::Forehead);
    }
    if let Some(rect) = face_box.map(|b| b.clip_to(w, h)).filter(|b| !b.is_empty()) {
        return (rect, CctSource::Face);
    }
    (BoundingBox::full(w, h), CctSource::Image)
}

/// Measures the CCT of the chosen region and scores it.
#[must_use]
pub fn measure(
    image: &RgbImageData,
    face_box: Option<BoundingBox>,
    forehead: Option<NormalizedRect>,
    config: &LightingConfig,
) -> FaceCct {
    let (region, source) = sample_region(image, face_box, forehead);
    let kelvin = image
        .region_pixels(region)
        .collect::<RgbAccumulator>()
        .mean()
        .and_then(color::estimate_cct);
    let Some(k) = kelvin else {
        return FaceCct {
            kelvin: None,
            source,
            lighting_type: LightingType::Undetermined,
            score: 0.0,
        };
    };
    FaceCct {
        kelvin,
        source,
        lighting_type: config.lighting_type_for(k),
        score: 100.0 * (1.0 - (k - config.target_kelvin).abs() / config.cct_falloff_kelvin).max(0.0),
    }
}
