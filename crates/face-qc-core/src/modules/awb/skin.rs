//! Skin-pixel detection in YCbCr.

use serde::{Deserialize, Serialize};

use crate::color::{self, Rgb, RgbAccumulator};
use crate::domain::{BoundingBox, RgbImageData};
use crate::error::ConfigError;

/// Chroma box that counts as skin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkinConfig {
    /// Lowest Cb.
    pub cb_min: f64,
    /// Highest Cb.
    pub cb_max: f64,
    /// Lowest Cr.
    pub cr_min: f64,
    /// Highest Cr.
    pub cr_max: f64,
}

impl Default for SkinConfig {
    fn default() -> Self {
        Self {
            cb_min: 77.0,
            cb_max: 127.0,
            cr_min: 133.0,
            cr_max: 173.0,
        }
    }
}

impl SkinConfig {
    /// Checks both ranges are ordered.
    ///
    /// # Errors
    ///
    /// Returns an error for a misordered range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_order("awb.skin.cb_min", self.cb_min, "awb.skin.cb_max", self.cb_max)?;
        ConfigError::check_order("awb.skin.cr_min", self.cr_min, "awb.skin.cr_max", self.cr_max)
    }

    /// True when the pixel's chroma lies inside the skin box.
    #[must_use]
    pub fn is_skin(&self, px: [u8; 3]) -> bool {
        let ycc = color::rgb_to_ycbcr(Rgb::from_u8(px));
        (self.cb_min..=self.cb_max).contains(&ycc.cb) && (self.cr_min..=self.cr_max).contains(&ycc.cr)
    }
}

/// Per-pixel skin classification.
#[derive(Debug, Clone)]
pub struct SkinMask {
    mask: Vec<u8>,
    width: u32,
    region: BoundingBox,
    skin_count: u64,
    non_skin: RgbAccumulator,
}

impl SkinMask {
    /// Classifies pixels inside `region` (the whole image when `None`).
    /// Pixels outside the region are never skin.
    #[must_use]
    pub fn detect(image: &RgbImageData, region: Option<BoundingBox>, config: &SkinConfig) -> Self {
        let (w, h) = (image.width(), image.height());
        let region = region
            .map(|r| r.clip_to(w, h))
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| BoundingBox::full(w, h));

        let mut mask = vec![0u8; image.pixel_count()];
        let mut skin_count = 0u64;
        let mut non_skin = RgbAccumulator::default();
        for ((x, y, px), slot) in image.enumerate_pixels().zip(mask.iter_mut()) {
            let inside = x >= region.x
                && x < region.x + region.width
                && y >= region.y
                && y < region.y + region.height;
            if inside && config.is_skin(px) {
                *slot = 255;
                skin_count += 1;
            } else {
                non_skin.push(px);
            }
        }
        Self {
            mask,
            width: w,
            region,
            skin_count,
            non_skin,
        }
    }

    /// Mask bytes, 255 for skin.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.mask
    }

    /// Whether `(x, y)` is skin.
    #[must_use]
    pub fn is_skin(&self, x: u32, y: u32) -> bool {
        if x >= self.width {
            return false;
        }
        self.mask
            .get(y as usize * self.width as usize + x as usize)
            .is_some_and(|&v| v != 0)
    }

    /// Skin pixel count.
    #[must_use]
    pub const fn skin_count(&self) -> u64 {
        self.skin_count
    }

    /// Skin pixels as a fraction of the searched region.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn skin_ratio(&self) -> f64 {
        self.skin_count as f64 / self.region.area().max(1) as f64
    }

    /// Non-skin pixels as a fraction of the whole image.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn non_skin_ratio(&self) -> f64 {
        let total = self.mask.len().max(1) as f64;
        self.non_skin.count() as f64 / total
    }

    /// Mean color of the non-skin pixels.
    #[must_use]
    pub fn non_skin_average(&self) -> Option<Rgb> {
        self.non_skin.mean()
    }
}
