//! Color value types.
//!
//! These are plain values with no identity: one pixel or one aggregate
//! sample, compared and combined by value.

use serde::{Deserialize, Serialize};

/// An RGB sample on the 0–255 scale. Fractional values represent averages.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rgb {
    /// Red.
    pub r: f64,
    /// Green.
    pub g: f64,
    /// Blue.
    pub b: f64,
}

impl Rgb {
    /// Creates a sample.
    #[must_use]
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Creates a sample from 8-bit channels.
    #[must_use]
    pub fn from_u8([r, g, b]: [u8; 3]) -> Self {
        Self::new(f64::from(r), f64::from(g), f64::from(b))
    }

    /// Channels as an array.
    #[must_use]
    pub const fn to_array(self) -> [f64; 3] {
        [self.r, self.g, self.b]
    }

    /// BT.601 luma of this sample.
    #[must_use]
    pub fn luma(self) -> f64 {
        0.299f64.mul_add(self.r, 0.587f64.mul_add(self.g, 0.114 * self.b))
    }

    /// Rounds and clamps to 8-bit channels.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    #[must_use]
    pub fn to_u8(self) -> [u8; 3] {
        let q = |v: f64| v.round().clamp(0.0, 255.0) as u8;
        [q(self.r), q(self.g), q(self.b)]
    }
}

/// CIE 1931 XYZ tristimulus values, Y normalized to 1 for reference white.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Xyz {
    /// X.
    pub x: f64,
    /// Y (luminance).
    pub y: f64,
    /// Z.
    pub z: f64,
}

impl Xyz {
    /// Creates a value.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Components as an array.
    #[must_use]
    pub const fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Builds a value from an array.
    #[must_use]
    pub const fn from_array([x, y, z]: [f64; 3]) -> Self {
        Self::new(x, y, z)
    }
}

/// Cone response (long/medium/short) values.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Lms {
    /// Long-wavelength response.
    pub l: f64,
    /// Medium-wavelength response.
    pub m: f64,
    /// Short-wavelength response.
    pub s: f64,
}

impl Lms {
    /// Creates a value.
    #[must_use]
    pub const fn new(l: f64, m: f64, s: f64) -> Self {
        Self { l, m, s }
    }

    /// Components as an array.
    #[must_use]
    pub const fn to_array(self) -> [f64; 3] {
        [self.l, self.m, self.s]
    }

    /// Builds a value from an array.
    #[must_use]
    pub const fn from_array([l, m, s]: [f64; 3]) -> Self {
        Self::new(l, m, s)
    }
}

/// Full-range BT.601 luma/chroma with chroma offset 128.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct YCbCr {
    /// Luma.
    pub y: f64,
    /// Blue-difference chroma.
    pub cb: f64,
    /// Red-difference chroma.
    pub cr: f64,
}

/// CIE xy chromaticity coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Chromaticity {
    /// x coordinate.
    pub x: f64,
    /// y coordinate.
    pub y: f64,
}

impl Chromaticity {
    /// Projects XYZ onto the chromaticity plane.
    ///
    /// Returns `None` when `X + Y + Z` is (near) zero, which happens for black.
    #[must_use]
    pub fn from_xyz(xyz: Xyz) -> Option<Self> {
        let sum = xyz.x + xyz.y + xyz.z;
        if !sum.is_finite() || sum.abs() < 1e-9 {
            return None;
        }
        Some(Self {
            x: xyz.x / sum,
            y: xyz.y / sum,
        })
    }
}

/// Running sum of RGB samples.
#[derive(Debug, Clone, Copy, Default)]
pub struct RgbAccumulator {
    r: u64,
    g: u64,
    b: u64,
    count: u64,
}

impl RgbAccumulator {
    /// Adds one pixel.
    pub fn push(&mut self, [r, g, b]: [u8; 3]) {
        self.r += u64::from(r);
        self.g += u64::from(g);
        self.b += u64::from(b);
        self.count += 1;
    }

    /// Number of pixels added.
    #[must_use]
    pub const fn count(&self) -> u64 {
        self.count
    }

    /// Mean sample, or `None` when nothing was added.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn mean(&self) -> Option<Rgb> {
        if self.count == 0 {
            return None;
        }
        let n = self.count as f64;
        Some(Rgb::new(
            self.r as f64 / n,
            self.g as f64 / n,
            self.b as f64 / n,
        ))
    }
}

impl FromIterator<[u8; 3]> for RgbAccumulator {
    fn from_iter<I: IntoIterator<Item = [u8; 3]>>(iter: I) -> Self {
        let mut acc = Self::default();
        for px in iter {
            acc.push(px);
        }
        acc
    }
}
