//! Pixel-space and normalized rectangles, and 3D landmark points.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl BoundingBox {
    /// Creates a box.
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A box covering a whole `width`×`height` image.
    #[must_use]
    pub const fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Builds the box spanning `[min_x, max_x] × [min_y, max_y]`, clipped to the image.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    #[must_use]
    pub fn from_extent(
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
        image_width: u32,
        image_height: u32,
    ) -> Self {
        let w = f64::from(image_width);
        let h = f64::from(image_height);
        let x0 = min_x.floor().clamp(0.0, w);
        let y0 = min_y.floor().clamp(0.0, h);
        let x1 = max_x.ceil().clamp(0.0, w);
        let y1 = max_y.ceil().clamp(0.0, h);
        Self {
            x: x0 as u32,
            y: y0 as u32,
            width: (x1 - x0).max(0.0) as u32,
            height: (y1 - y0).max(0.0) as u32,
        }
    }

    /// Returns the part of this box inside a `width`×`height` image.
    #[must_use]
    pub fn clip_to(self, width: u32, height: u32) -> Self {
        let x = self.x.min(width);
        let y = self.y.min(height);
        let right = self.x.saturating_add(self.width).min(width);
        let bottom = self.y.saturating_add(self.height).min(height);
        Self {
            x,
            y,
            width: right - x,
            height: bottom - y,
        }
    }

    /// Grows each side by `fraction` of the box size, clipped to the image.
    #[must_use]
    pub fn padded(self, fraction: f64, image_width: u32, image_height: u32) -> Self {
        let pad_x = f64::from(self.width) * fraction;
        let pad_y = f64::from(self.height) * fraction;
        Self::from_extent(
            f64::from(self.x) - pad_x,
            f64::from(self.y) - pad_y,
            f64::from(self.x + self.width) + pad_x,
            f64::from(self.y + self.height) + pad_y,
            image_width,
            image_height,
        )
    }

    /// True when the box covers no pixels.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Area in pixels.
    #[must_use]
    pub const fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Center point in pixel coordinates.
    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        (
            f64::from(self.x) + f64::from(self.width) / 2.0,
            f64::from(self.y) + f64::from(self.height) / 2.0,
        )
    }

    /// Expresses the box as fractions of the image size.
    #[must_use]
    pub fn to_normalized(self, image_width: u32, image_height: u32) -> NormalizedRect {
        let w = f64::from(image_width.max(1));
        let h = f64::from(image_height.max(1));
        NormalizedRect {
            x: f64::from(self.x) / w,
            y: f64::from(self.y) / h,
            width: f64::from(self.width) / w,
            height: f64::from(self.height) / h,
        }
        .clamped()
    }
}

/// Rectangle in fractional `[0, 1]` image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedRect {
    /// Left edge as a fraction of image width.
    pub x: f64,
    /// Top edge as a fraction of image height.
    pub y: f64,
    /// Width as a fraction of image width.
    pub width: f64,
    /// Height as a fraction of image height.
    pub height: f64,
}

impl NormalizedRect {
    /// Creates a rect without clamping.
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Clamps the rect into the unit square so that `x + width <= 1` and
    /// `y + height <= 1`.
    #[must_use]
    pub fn clamped(self) -> Self {
        let x = finite_or_zero(self.x).clamp(0.0, 1.0);
        let y = finite_or_zero(self.y).clamp(0.0, 1.0);
        let width = finite_or_zero(self.width).clamp(0.0, 1.0 - x);
        let height = finite_or_zero(self.height).clamp(0.0, 1.0 - y);
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Converts to pixel space, clamping first.
    #[must_use]
    pub fn to_pixels(self, image_width: u32, image_height: u32) -> BoundingBox {
        let r = self.clamped();
        let w = f64::from(image_width);
        let h = f64::from(image_height);
        BoundingBox::from_extent(
            r.x * w,
            r.y * h,
            (r.x + r.width) * w,
            (r.y + r.height) * h,
            image_width,
            image_height,
        )
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// A 3D point. For landmarks, `x`/`y` are pixels and `z` is relative depth
/// in the same units as `x`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate (grows downward).
    pub y: f64,
    /// Depth (negative is toward the camera).
    pub z: f64,
}

impl Point3 {
    /// Creates a point.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Midpoint between two points.
    #[must_use]
    pub fn midpoint(self, other: Self) -> Self {
        Self::new(
            (self.x + other.x) / 2.0,
            (self.y + other.y) / 2.0,
            (self.z + other.z) / 2.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_to_image() {
        let b = BoundingBox::new(90, 95, 20, 20).clip_to(100, 100);
        assert_eq!(b, BoundingBox::new(90, 95, 10, 5));

        let outside = BoundingBox::new(150, 10, 20, 20).clip_to(100, 100);
        assert!(outside.is_empty());
    }

    #[test]
    fn test_padded_grows_each_side() {
        let b = BoundingBox::new(40, 40, 20, 20).padded(0.2, 100, 100);
        assert_eq!(b, BoundingBox::new(36, 36, 28, 28));
    }

    #[test]
    fn test_padded_clips_at_border() {
        let b = BoundingBox::new(0, 0, 50, 50).padded(0.5, 60, 60);
        assert_eq!(b, BoundingBox::new(0, 0, 60, 60));
    }

    #[test]
    fn test_normalized_clamps_invariant() {
        let r = NormalizedRect::new(0.8, -0.2, 0.5, 1.5).clamped();
        assert!((r.x - 0.8).abs() < 1e-12);
        assert!(r.y.abs() < 1e-12);
        assert!(r.x + r.width <= 1.0 + 1e-12);
        assert!(r.y + r.height <= 1.0 + 1e-12);
    }

    #[test]
    fn test_normalized_nan_becomes_zero() {
        let r = NormalizedRect::new(f64::NAN, 0.1, 0.2, f64::INFINITY).clamped();
        assert!(r.x.abs() < f64::EPSILON);
        assert!(r.height.abs() < f64::EPSILON);
    }

    #[test]
    fn test_to_pixels_round_trip() {
        let b = NormalizedRect::new(0.25, 0.5, 0.5, 0.25).to_pixels(200, 100);
        assert_eq!(b, BoundingBox::new(50, 50, 100, 25));
        let back = b.to_normalized(200, 100);
        assert!((back.x - 0.25).abs() < 1e-12);
        assert!((back.height - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_center_and_area() {
        let b = BoundingBox::new(10, 20, 30, 40);
        assert_eq!(b.area(), 1200);
        assert_eq!(b.center(), (25.0, 40.0));
    }
}
