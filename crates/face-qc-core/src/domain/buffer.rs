//! Owned pixel buffers.
//!
//! Every stage reads pixels through [`RgbImageData`], which owns a contiguous
//! row-major interleaved buffer and centralizes the `(x, y, channel) → offset`
//! arithmetic. Buffers are never mutated after construction; operations that
//! change pixels allocate a new buffer.

use std::sync::Arc;

use crate::color::luma;
use crate::domain::BoundingBox;
use crate::error::ImageError;

/// An 8-bit RGB or RGBA image.
#[derive(Clone, PartialEq, Eq)]
pub struct RgbImageData {
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<u8>,
}

impl std::fmt::Debug for RgbImageData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RgbImageData")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("channels", &self.channels)
            .finish_non_exhaustive()
    }
}

impl RgbImageData {
    /// Wraps an interleaved buffer.
    ///
    /// # Errors
    ///
    /// Fails if a dimension is zero, `channels` is not 3 or 4, or the buffer
    /// length does not match.
    pub fn new(width: u32, height: u32, channels: u8, data: Vec<u8>) -> Result<Self, ImageError> {
        if width == 0 || height == 0 {
            return Err(ImageError::EmptyDimensions { width, height });
        }
        if channels != 3 && channels != 4 {
            return Err(ImageError::UnsupportedChannels(channels));
        }
        let expected = width as usize * height as usize * usize::from(channels);
        if data.len() != expected {
            return Err(ImageError::BufferSizeMismatch {
                width,
                height,
                channels,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Builds a 3-channel image by evaluating `f` for every pixel.
    ///
    /// # Errors
    ///
    /// Fails if a dimension is zero.
    pub fn from_fn(
        width: u32,
        height: u32,
        mut f: impl FnMut(u32, u32) -> [u8; 3],
    ) -> Result<Self, ImageError> {
        if width == 0 || height == 0 {
            return Err(ImageError::EmptyDimensions { width, height });
        }
        let mut data = Vec::with_capacity(width as usize * height as usize * 3);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&f(x, y));
            }
        }
        Self::new(width, height, 3, data)
    }

    /// Builds a 3-channel image filled with one color.
    ///
    /// # Errors
    ///
    /// Fails if a dimension is zero.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Result<Self, ImageError> {
        Self::from_fn(width, height, |_, _| rgb)
    }

    /// Image width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Channels per pixel (3 or 4).
    #[must_use]
    pub const fn channels(&self) -> u8 {
        self.channels
    }

    /// Total pixel count.
    #[must_use]
    pub const fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Raw interleaved bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Byte offset of `channel` at `(x, y)`, or `None` when out of bounds.
    #[must_use]
    pub fn offset(&self, x: u32, y: u32, channel: u8) -> Option<usize> {
        if x >= self.width || y >= self.height || channel >= self.channels {
            return None;
        }
        Some(
            (y as usize * self.width as usize + x as usize) * usize::from(self.channels)
                + usize::from(channel),
        )
    }

    /// RGB triple at `(x, y)`, ignoring alpha.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        let base = self.offset(x, y, 0)?;
        Some([self.data[base], self.data[base + 1], self.data[base + 2]])
    }

    /// Iterates RGB triples in row-major order, ignoring alpha.
    pub fn pixels(&self) -> impl Iterator<Item = [u8; 3]> + '_ {
        self.data
            .chunks_exact(usize::from(self.channels))
            .map(|px| [px[0], px[1], px[2]])
    }

    /// Iterates `(x, y, rgb)` in row-major order.
    pub fn enumerate_pixels(&self) -> impl Iterator<Item = (u32, u32, [u8; 3])> + '_ {
        let width = self.width as usize;
        self.pixels().enumerate().map(move |(i, px)| {
            #[allow(clippy::cast_possible_truncation)]
            let (x, y) = ((i % width) as u32, (i / width) as u32);
            (x, y, px)
        })
    }

    /// Iterates RGB triples inside `region`, which is clipped to the image.
    pub fn region_pixels(&self, region: BoundingBox) -> impl Iterator<Item = [u8; 3]> + '_ {
        let region = region.clip_to(self.width, self.height);
        (region.y..region.y + region.height).flat_map(move |y| {
            (region.x..region.x + region.width).filter_map(move |x| self.get(x, y))
        })
    }

    /// Returns a new image with `f` applied to every RGB triple.
    ///
    /// The alpha channel, if any, is copied unchanged.
    #[must_use]
    pub fn map_pixels(&self, mut f: impl FnMut([u8; 3]) -> [u8; 3]) -> Self {
        let channels = usize::from(self.channels);
        let mut data = self.data.clone();
        for px in data.chunks_exact_mut(channels) {
            let [r, g, b] = f([px[0], px[1], px[2]]);
            px[0] = r;
            px[1] = g;
            px[2] = b;
        }
        Self {
            width: self.width,
            height: self.height,
            channels: self.channels,
            data,
        }
    }

    /// Copies `region` (clipped to the image) into a new buffer.
    ///
    /// # Errors
    ///
    /// Fails if the clipped region is empty.
    pub fn crop(&self, region: BoundingBox) -> Result<Self, ImageError> {
        let clipped = region.clip_to(self.width, self.height);
        if clipped.is_empty() {
            return Err(ImageError::EmptyRegion {
                x: region.x,
                y: region.y,
                width: region.width,
                height: region.height,
            });
        }
        let channels = usize::from(self.channels);
        let row_len = clipped.width as usize * channels;
        let mut data = Vec::with_capacity(row_len * clipped.height as usize);
        for y in clipped.y..clipped.y + clipped.height {
            // Both offsets exist because `clipped` lies inside the image.
            let start = self.offset(clipped.x, y, 0).unwrap_or_default();
            data.extend_from_slice(&self.data[start..start + row_len]);
        }
        Self::new(clipped.width, clipped.height, self.channels, data)
    }

    /// BT.601 luma conversion.
    #[must_use]
    pub fn to_grayscale(&self) -> GrayscaleImageData {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let data = self
            .pixels()
            .map(|[r, g, b]| luma(r, g, b).round().clamp(0.0, 255.0) as u8)
            .collect();
        GrayscaleImageData {
            width: self.width,
            height: self.height,
            data,
        }
    }

    /// Converts to an `image` crate RGB buffer (alpha dropped).
    #[must_use]
    pub fn to_rgb_image(&self) -> image::RgbImage {
        let data: Vec<u8> = self.pixels().flatten().collect();
        image::RgbImage::from_raw(self.width, self.height, data)
            .unwrap_or_else(|| image::RgbImage::new(self.width, self.height))
    }
}

impl TryFrom<image::RgbImage> for RgbImageData {
    type Error = ImageError;

    fn try_from(img: image::RgbImage) -> Result<Self, Self::Error> {
        let (width, height) = img.dimensions();
        Self::new(width, height, 3, img.into_raw())
    }
}

impl TryFrom<image::RgbaImage> for RgbImageData {
    type Error = ImageError;

    fn try_from(img: image::RgbaImage) -> Result<Self, Self::Error> {
        let (width, height) = img.dimensions();
        Self::new(width, height, 4, img.into_raw())
    }
}

impl TryFrom<&image::DynamicImage> for RgbImageData {
    type Error = ImageError;

    fn try_from(img: &image::DynamicImage) -> Result<Self, Self::Error> {
        if img.color().has_alpha() {
            Self::try_from(img.to_rgba8())
        } else {
            Self::try_from(img.to_rgb8())
        }
    }
}

/// A single-channel luma buffer derived from an [`RgbImageData`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayscaleImageData {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl GrayscaleImageData {
    /// Image width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Raw luma bytes in row-major order.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Luma at `(x, y)`.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.data[y as usize * self.width as usize + x as usize])
    }

    /// Mean luma (0 for an empty buffer).
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn mean(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        let sum: u64 = self.data.iter().map(|&v| u64::from(v)).sum();
        sum as f64 / self.data.len() as f64
    }
}

/// A decoded image together with where it came from.
#[derive(Debug, Clone)]
pub struct ImageInfo {
    /// Path or URI of the image.
    pub path: String,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Decoded pixels, shared between pipeline stages.
    pub image: Arc<RgbImageData>,
}

impl ImageInfo {
    /// Creates image info from decoded pixels.
    #[must_use]
    pub fn new(path: impl Into<String>, image: RgbImageData) -> Self {
        Self {
            path: path.into(),
            width: image.width(),
            height: image.height(),
            image: Arc::new(image),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::cast_possible_truncation)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> RgbImageData {
        RgbImageData::from_fn(width, height, |x, y| [x as u8, y as u8, 7]).unwrap()
    }

    #[test]
    fn test_rejects_empty_dimensions() {
        let err = RgbImageData::new(0, 4, 3, vec![]).unwrap_err();
        assert!(matches!(err, ImageError::EmptyDimensions { .. }));
    }

    #[test]
    fn test_rejects_bad_channels() {
        let err = RgbImageData::new(1, 1, 2, vec![0, 0]).unwrap_err();
        assert_eq!(err, ImageError::UnsupportedChannels(2));
    }

    #[test]
    fn test_rejects_size_mismatch() {
        let err = RgbImageData::new(2, 2, 3, vec![0; 11]).unwrap_err();
        assert!(matches!(
            err,
            ImageError::BufferSizeMismatch {
                expected: 12,
                actual: 11,
                ..
            }
        ));
    }

    #[test]
    fn test_offset_is_bounds_checked() {
        let img = RgbImageData::new(2, 2, 4, vec![0; 16]).unwrap();
        assert_eq!(img.offset(0, 0, 0), Some(0));
        assert_eq!(img.offset(1, 0, 3), Some(7));
        assert_eq!(img.offset(1, 1, 2), Some(14));
        assert_eq!(img.offset(2, 0, 0), None);
        assert_eq!(img.offset(0, 2, 0), None);
        assert_eq!(img.offset(0, 0, 4), None);
    }

    #[test]
    fn test_get_and_enumerate() {
        let img = gradient(4, 3);
        assert_eq!(img.get(3, 2), Some([3, 2, 7]));
        assert_eq!(img.get(4, 0), None);

        let last = img.enumerate_pixels().last().unwrap();
        assert_eq!(last, (3, 2, [3, 2, 7]));
    }

    #[test]
    fn test_map_pixels_preserves_alpha_and_source() {
        let img = RgbImageData::new(1, 1, 4, vec![10, 20, 30, 99]).unwrap();
        let mapped = img.map_pixels(|[r, g, b]| [r * 2, g * 2, b * 2]);
        assert_eq!(mapped.as_bytes(), &[20, 40, 60, 99]);
        assert_eq!(img.as_bytes(), &[10, 20, 30, 99]);
    }

    #[test]
    fn test_crop_clips_to_image() {
        let img = gradient(10, 10);
        let cropped = img
            .crop(BoundingBox {
                x: 8,
                y: 7,
                width: 5,
                height: 5,
            })
            .unwrap();
        assert_eq!((cropped.width(), cropped.height()), (2, 3));
        assert_eq!(cropped.get(0, 0), Some([8, 7, 7]));
        assert_eq!(cropped.get(1, 2), Some([9, 9, 7]));
    }

    #[test]
    fn test_crop_outside_is_error() {
        let img = gradient(4, 4);
        let result = img.crop(BoundingBox {
            x: 10,
            y: 10,
            width: 2,
            height: 2,
        });
        assert!(matches!(result, Err(ImageError::EmptyRegion { .. })));
    }

    #[test]
    fn test_region_pixels_count() {
        let img = gradient(10, 10);
        let region = BoundingBox {
            x: 2,
            y: 2,
            width: 3,
            height: 4,
        };
        assert_eq!(img.region_pixels(region).count(), 12);
    }

    #[test]
    fn test_grayscale_of_gray_is_identity() {
        let img = RgbImageData::filled(5, 5, [128, 128, 128]).unwrap();
        let gray = img.to_grayscale();
        assert!(gray.as_bytes().iter().all(|&v| v == 128));
        assert!((gray.mean() - 128.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_round_trip_through_image_crate() {
        let img = gradient(6, 4);
        let rgb = img.to_rgb_image();
        let back = RgbImageData::try_from(rgb).unwrap();
        assert_eq!(back, img);
    }

    #[test]
    fn test_dynamic_rgba_keeps_alpha() {
        let rgba = image::RgbaImage::from_pixel(3, 3, image::Rgba([1, 2, 3, 4]));
        let img = RgbImageData::try_from(&image::DynamicImage::ImageRgba8(rgba)).unwrap();
        assert_eq!(img.channels(), 4);
        assert_eq!(img.get(2, 2), Some([1, 2, 3]));
    }
}
