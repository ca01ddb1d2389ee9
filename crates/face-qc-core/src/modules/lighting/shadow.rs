//! Directional shadow detection from the zone grid.

use serde::{Deserialize, Serialize};

use super::zones::LightingZoneAnalysis;
use super::LightingConfig;

/// Side of the face in shadow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadowDirection {
    /// No dominant side.
    None,
    /// Left half darker.
    Left,
    /// Right half darker.
    Right,
    /// Forehead darker than chin.
    Top,
    /// Chin darker than forehead.
    Bottom,
}

impl ShadowDirection {
    /// Remark for this direction.
    #[must_use]
    pub const fn feedback(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Left => "The left side of your face is in shadow. Face the light source.",
            Self::Right => "The right side of your face is in shadow. Face the light source.",
            Self::Top => "Your forehead is in shadow. Lower the light or remove your hat.",
            Self::Bottom => "The lower part of your face is in shadow. Avoid light from above.",
        }
    }
}

/// Strength of a shadow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadowSeverity {
    /// Below the mild edge.
    None,
    /// Light shadow.
    Mild,
    /// Noticeable shadow.
    Moderate,
    /// Hard shadow.
    Severe,
}

impl ShadowSeverity {
    /// Shadow-absence score, 0–100.
    #[must_use]
    pub const fn absence_score(self) -> f64 {
        match self {
            Self::None => 100.0,
            Self::Mild => 75.0,
            Self::Moderate => 45.0,
            Self::Severe => 15.0,
        }
    }
}

/// Shadow measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadowAnalysis {
    /// Darker side, if the gap is large enough.
    pub direction: ShadowDirection,
    /// `(max − min) / max` over the zone means.
    pub intensity: f64,
    /// Fraction of zones darker than the dark level.
    pub dark_zone_ratio: f64,
    /// Fraction of zones brighter than the bright level.
    pub bright_zone_ratio: f64,
    /// Weighted blend the severity is banded from.
    pub severity_index: f64,
    /// Banded severity.
    pub severity: ShadowSeverity,
    /// Direction and severity are both set.
    pub has_shadow: bool,
}

impl ShadowAnalysis {
    /// Shadow-absence score, 0–100.
    #[must_use]
    pub const fn score(&self) -> f64 {
        if self.has_shadow {
            self.severity.absence_score()
        } else {
            100.0
        }
    }
}

/// Finds the dominant shadow in the zone grid.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn detect_shadow(zones: &LightingZoneAnalysis, config: &LightingConfig) -> ShadowAnalysis {
    let lr_gap = (zones.left_luma - zones.right_luma).abs();
    let tb_gap = (zones.top_luma - zones.bottom_luma).abs();
    let direction = if lr_gap >= tb_gap && lr_gap > config.shadow_gap_threshold {
        if zones.left_luma < zones.right_luma {
            ShadowDirection::Left
        } else {
            ShadowDirection::Right
        }
    } else if tb_gap > lr_gap && tb_gap > config.shadow_gap_threshold {
        if zones.top_luma < zones.bottom_luma {
            ShadowDirection::Top
        } else {
            ShadowDirection::Bottom
        }
    } else {
        ShadowDirection::None
    };

    let max = zones.max_luma();
    let intensity = if max > 0.0 { (max - zones.min_luma()) / max } else { 0.0 };
    let total = zones.zones.len().max(1) as f64;
    let dark_zone_ratio =
        zones.zones.iter().filter(|z| z.mean_luma < config.dark_zone_level).count() as f64 / total;
    let bright_zone_ratio =
        zones.zones.iter().filter(|z| z.mean_luma > config.bright_zone_level).count() as f64 / total;

    let w = &config.severity;
    let severity_index = w.intensity_weight * intensity
        + w.dark_weight * dark_zone_ratio
        + w.bright_weight * bright_zone_ratio;
    let severity = if severity_index >= w.severe {
        ShadowSeverity::Severe
    } else if severity_index >= w.moderate {
        ShadowSeverity::Moderate
    } else if severity_index >= w.mild {
        ShadowSeverity::Mild
    } else {
        ShadowSeverity::None
    };

    ShadowAnalysis {
        direction,
        intensity,
        dark_zone_ratio,
        bright_zone_ratio,
        severity_index,
        severity,
        has_shadow: direction != ShadowDirection::None && severity != ShadowSeverity::None,
    }
}
