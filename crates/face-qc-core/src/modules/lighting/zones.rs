//! Six-zone brightness grid over the face.

use serde::{Deserialize, Serialize};

use crate::color::luma;
use crate::domain::{BoundingBox, RgbImageData};

/// One cell of the 2×3 grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaceZone {
    /// Top left.
    ForeheadLeft,
    /// Top right.
    ForeheadRight,
    /// Middle left.
    CheekLeft,
    /// Middle right.
    CheekRight,
    /// Bottom left.
    ChinLeft,
    /// Bottom right.
    ChinRight,
}

impl FaceZone {
    /// All zones, row by row, left before right.
    pub const ALL: [Self; 6] = [
        Self::ForeheadLeft,
        Self::ForeheadRight,
        Self::CheekLeft,
        Self::CheekRight,
        Self::ChinLeft,
        Self::ChinRight,
    ];

    const fn cell(self) -> (u32, u32) {
        match self {
            Self::ForeheadLeft => (0, 0),
            Self::ForeheadRight => (1, 0),
            Self::CheekLeft => (0, 1),
            Self::CheekRight => (1, 1),
            Self::ChinLeft => (0, 2),
            Self::ChinRight => (1, 2),
        }
    }

    /// Pixel rectangle of this zone inside `area`.
    #[must_use]
    pub const fn rect(self, area: BoundingBox) -> BoundingBox {
        let (col, row) = self.cell();
        let x0 = area.x + area.width * col / 2;
        let x1 = area.x + area.width * (col + 1) / 2;
        let y0 = area.y + area.height * row / 3;
        let y1 = area.y + area.height * (row + 1) / 3;
        BoundingBox::new(x0, y0, x1 - x0, y1 - y0)
    }
}

/// Brightness of one zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneBrightness {
    /// Which zone.
    pub zone: FaceZone,
    /// Pixel rectangle.
    pub rect: BoundingBox,
    /// Mean BT.601 luma (0 for an empty zone).
    pub mean_luma: f64,
    /// Pixels measured.
    pub pixel_count: u64,
}

/// Brightness distribution over the six zones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightingZoneAnalysis {
    /// Per-zone brightness, in [`FaceZone::ALL`] order.
    pub zones: Vec<ZoneBrightness>,
    /// Mean of the zone means.
    pub mean_luma: f64,
    /// Population standard deviation of the zone means.
    pub std_dev: f64,
    /// `1 − std/mean`, clamped to `[0, 1]`.
    pub uniformity: f64,
    /// `1 − |L − R| / max(L, R)`.
    pub left_right_balance: f64,
    /// `(bottom − top) / max(top, bottom)`; positive when the chin is brighter.
    pub vertical_gradient: f64,
    /// Mean of the left column.
    pub left_luma: f64,
    /// Mean of the right column.
    pub right_luma: f64,
    /// Mean of the forehead row.
    pub top_luma: f64,
    /// Mean of the chin row.
    pub bottom_luma: f64,
}

impl LightingZoneAnalysis {
    /// Smallest zone, in pixels.
    #[must_use]
    pub fn min_zone_pixels(&self) -> u64 {
        self.zones.iter().map(|z| z.pixel_count).min().unwrap_or(0)
    }

    /// Brightest zone mean.
    #[must_use]
    pub fn max_luma(&self) -> f64 {
        self.zones.iter().map(|z| z.mean_luma).fold(0.0, f64::max)
    }

    /// Darkest zone mean.
    #[must_use]
    pub fn min_luma(&self) -> f64 {
        self.zones
            .iter()
            .map(|z| z.mean_luma)
            .reduce(f64::min)
            .unwrap_or(0.0)
    }

    fn luma_of(&self, zones: &[FaceZone]) -> f64 {
        let values: Vec<f64> = self
            .zones
            .iter()
            .filter(|z| zones.contains(&z.zone))
            .map(|z| z.mean_luma)
            .collect();
        mean(&values)
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Measures the six zones of `area` (clipped to the image).
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn analyze_zones(image: &RgbImageData, area: BoundingBox) -> LightingZoneAnalysis {
    let area = area.clip_to(image.width(), image.height());
    let zones: Vec<ZoneBrightness> = FaceZone::ALL
        .iter()
        .map(|&zone| {
            let rect = zone.rect(area);
            let (sum, count) = image
                .region_pixels(rect)
                .fold((0.0, 0u64), |(sum, count), [r, g, b]| (sum + luma(r, g, b), count + 1));
            ZoneBrightness {
                zone,
                rect,
                mean_luma: if count == 0 { 0.0 } else { sum / count as f64 },
                pixel_count: count,
            }
        })
        .collect();

    let means: Vec<f64> = zones.iter().map(|z| z.mean_luma).collect();
    let mean_luma = mean(&means);
    let variance = means.iter().map(|m| (m - mean_luma).powi(2)).sum::<f64>() / means.len() as f64;
    let std_dev = variance.sqrt();
    let uniformity = if std_dev == 0.0 {
        1.0
    } else if mean_luma <= 0.0 {
        0.0
    } else {
        (1.0 - std_dev / mean_luma).clamp(0.0, 1.0)
    };

    let mut analysis = LightingZoneAnalysis {
        zones,
        mean_luma,
        std_dev,
        uniformity,
        left_right_balance: 1.0,
        vertical_gradient: 0.0,
        left_luma: 0.0,
        right_luma: 0.0,
        top_luma: 0.0,
        bottom_luma: 0.0,
    };
    analysis.left_luma = analysis.luma_of(&[FaceZone::ForeheadLeft, FaceZone::CheekLeft, FaceZone::ChinLeft]);
    analysis.right_luma =
        analysis.luma_of(&[FaceZone::ForeheadRight, FaceZone::CheekRight, FaceZone::ChinRight]);
    analysis.top_luma = analysis.luma_of(&[FaceZone::ForeheadLeft, FaceZone::ForeheadRight]);
    analysis.bottom_luma = analysis.luma_of(&[FaceZone::ChinLeft, FaceZone::ChinRight]);

    let lr_max = analysis.left_luma.max(analysis.right_luma);
    if lr_max > 0.0 {
        analysis.left_right_balance = 1.0 - (analysis.left_luma - analysis.right_luma).abs() / lr_max;
    }
    let tb_max = analysis.top_luma.max(analysis.bottom_luma);
    if tb_max > 0.0 {
        analysis.vertical_gradient = (analysis.bottom_luma - analysis.top_luma) / tb_max;
    }
    analysis
}
