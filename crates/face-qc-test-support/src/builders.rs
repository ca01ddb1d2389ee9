//! Synthetic image builders for testing.

use face_qc_core::domain::{ImageInfo, RgbImageData};
use image::DynamicImage;

/// Skin tone used by the portrait builders.
pub const SKIN: [u8; 3] = [200, 150, 120];

/// Slightly warm off-white wall.
pub const WALL: [u8; 3] = [130, 128, 118];

/// Builder for creating synthetic test images.
///
/// Every builder returns an [`ImageInfo`] with a `synthetic://` path; use
/// [`SyntheticImageBuilder::to_dynamic`] to save one to disk.
pub struct SyntheticImageBuilder;

impl SyntheticImageBuilder {
    fn build(name: &str, width: u32, height: u32, f: impl FnMut(u32, u32) -> [u8; 3]) -> ImageInfo {
        match RgbImageData::from_fn(width.max(1), height.max(1), f) {
            Ok(image) => ImageInfo::new(format!("synthetic://{name}"), image),
            Err(e) => panic!("synthetic image {name}: {e}"),
        }
    }

    // === Sharp images ===

    /// Neutral gray photo with per-pixel texture.
    ///
    /// Pixels alternate between 156 and 100. At 1024×1024 it passes every
    /// stage with the default configuration and the synthetic face.
    #[must_use]
    pub fn portrait(size: u32) -> ImageInfo {
        Self::build("portrait", size, size, |x, y| {
            if (x + y) % 2 == 0 {
                [156; 3]
            } else {
                [100; 3]
            }
        })
    }

    /// Black and white checkerboard with `cell`-pixel squares.
    #[must_use]
    pub fn checkerboard(width: u32, height: u32, cell: u32) -> ImageInfo {
        let cell = cell.max(1);
        Self::build("checkerboard", width, height, |x, y| {
            if (x / cell + y / cell) % 2 == 0 {
                [255; 3]
            } else {
                [0; 3]
            }
        })
    }

    // === Flat images ===

    /// One color everywhere (no edges, so maximally blurry).
    #[must_use]
    pub fn uniform(width: u32, height: u32, rgb: [u8; 3]) -> ImageInfo {
        Self::build("uniform", width, height, |_, _| rgb)
    }

    /// Completely black image.
    #[must_use]
    pub fn underexposed(width: u32, height: u32) -> ImageInfo {
        Self::uniform(width, height, [0; 3])
    }

    /// Completely white image.
    #[must_use]
    pub fn overexposed(width: u32, height: u32) -> ImageInfo {
        Self::uniform(width, height, [255; 3])
    }

    // === Faces ===

    /// Flat skin-colored square on a flat wall.
    ///
    /// The face covers the middle 40% of each axis.
    #[must_use]
    pub fn face_on_wall(size: u32, skin: [u8; 3], wall: [u8; 3]) -> ImageInfo {
        let lo = size * 3 / 10;
        let hi = size * 7 / 10;
        Self::build("face_on_wall", size, size, |x, y| {
            if (lo..hi).contains(&x) && (lo..hi).contains(&y) {
                skin
            } else {
                wall
            }
        })
    }

    /// Textured portrait whose left half is darkened by `shadow` levels.
    #[must_use]
    pub fn side_lit_portrait(size: u32, shadow: u8) -> ImageInfo {
        Self::build("side_lit_portrait", size, size, |x, y| {
            let base = if (x + y) % 2 == 0 { 156u8 } else { 100u8 };
            let v = if x < size / 2 { base.saturating_sub(shadow) } else { base };
            [v; 3]
        })
    }

    /// Converts an image to an `image` crate buffer, ready for `save`.
    #[must_use]
    pub fn to_dynamic(info: &ImageInfo) -> DynamicImage {
        DynamicImage::ImageRgb8(info.image.to_rgb_image())
    }
}
