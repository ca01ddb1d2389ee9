//! Gain estimation and application.

use serde::{Deserialize, Serialize};

use crate::color::{
    self, Lms, Matrix3, Rgb, RgbAccumulator, Xyz, BRADFORD, BRADFORD_INV, D65_WHITE, SRGB_TO_XYZ,
    XYZ_TO_SRGB,
};
use crate::domain::RgbImageData;
use crate::error::ConfigError;

/// Per-channel multiplicative gains.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AwbGains {
    /// Red gain.
    pub r: f64,
    /// Green gain.
    pub g: f64,
    /// Blue gain.
    pub b: f64,
}

impl Default for AwbGains {
    fn default() -> Self {
        Self::UNITY
    }
}

impl AwbGains {
    /// No change.
    pub const UNITY: Self = Self {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    /// Smallest gain.
    #[must_use]
    pub fn min(&self) -> f64 {
        self.r.min(self.g).min(self.b)
    }

    /// Largest gain.
    #[must_use]
    pub fn max(&self) -> f64 {
        self.r.max(self.g).max(self.b)
    }

    /// Gray-World gains pulling `average` to `target` on every channel.
    ///
    /// Returns `None` if a channel average is zero.
    #[must_use]
    pub fn gray_world(average: Rgb, target: f64) -> Option<Self> {
        let [r, g, b] = average.to_array();
        (r > 0.0 && g > 0.0 && b > 0.0).then(|| Self {
            r: target / r,
            g: target / g,
            b: target / b,
        })
    }

    /// Ratio of two averages; channels with a zero denominator get 1.
    #[must_use]
    pub fn effective(corrected: Rgb, original: Rgb) -> Self {
        let ratio = |c: f64, o: f64| if o > 0.0 { c / o } else { 1.0 };
        Self {
            r: ratio(corrected.r, original.r),
            g: ratio(corrected.g, original.g),
            b: ratio(corrected.b, original.b),
        }
    }

    /// Multiplies every pixel, rounding and clamping to 0–255.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    #[must_use]
    pub fn apply(&self, image: &RgbImageData) -> RgbImageData {
        let q = |v: u8, gain: f64| (f64::from(v) * gain).round().clamp(0.0, 255.0) as u8;
        image.map_pixels(|[r, g, b]| [q(r, self.r), q(g, self.g), q(b, self.b)])
    }
}

/// Gain limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GainLimits {
    /// Lowest gain accepted.
    pub safe_min: f64,
    /// Highest gain accepted.
    pub safe_max: f64,
    /// Below this a gain is extreme.
    pub hard_min: f64,
    /// Above this a gain is extreme.
    pub hard_max: f64,
    /// Lower edge of the optimal confidence band.
    pub optimal_min: f64,
    /// Upper edge of the optimal confidence band.
    pub optimal_max: f64,
}

impl Default for GainLimits {
    fn default() -> Self {
        Self {
            safe_min: 0.7,
            safe_max: 1.5,
            hard_min: 0.5,
            hard_max: 2.0,
            optimal_min: 0.85,
            optimal_max: 1.2,
        }
    }
}

impl GainLimits {
    /// Checks `hard_min ≤ safe_min ≤ optimal_min ≤ optimal_max ≤ safe_max ≤ hard_max`.
    ///
    /// # Errors
    ///
    /// Returns the first misordered pair.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_range("awb.gains.hard_min", self.hard_min, 0.0, 1.0)?;
        let chain = [
            ("awb.gains.hard_min", self.hard_min),
            ("awb.gains.safe_min", self.safe_min),
            ("awb.gains.optimal_min", self.optimal_min),
            ("awb.gains.optimal_max", self.optimal_max),
            ("awb.gains.safe_max", self.safe_max),
            ("awb.gains.hard_max", self.hard_max),
        ];
        for pair in chain.windows(2) {
            ConfigError::check_order(pair[0].0, pair[0].1, pair[1].0, pair[1].1)?;
        }
        Ok(())
    }

    /// Classifies a gain triple.
    #[must_use]
    pub fn assess(&self, gains: &AwbGains) -> GainAssessment {
        let (lo, hi) = (gains.min(), gains.max());
        if !lo.is_finite() || !hi.is_finite() {
            GainAssessment::Extreme
        } else if lo >= self.safe_min && hi <= self.safe_max {
            GainAssessment::Safe
        } else if lo >= self.hard_min && hi <= self.hard_max {
            GainAssessment::Marginal
        } else {
            GainAssessment::Extreme
        }
    }

    /// True when every gain lies in the optimal band.
    #[must_use]
    pub fn is_optimal(&self, gains: &AwbGains) -> bool {
        gains.min() >= self.optimal_min && gains.max() <= self.optimal_max
    }
}

/// How trustworthy a gain triple is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GainAssessment {
    /// Inside the safe band; accepted.
    Safe,
    /// Outside the safe band but inside the hard band; rejected.
    Marginal,
    /// Outside the hard band; rejected.
    Extreme,
}

/// Linear-RGB matrix adapting `source_white` to D65 at the same luminance.
///
/// Returns `None` for a black or otherwise degenerate source.
#[must_use]
pub fn von_kries_matrix(source_white: Rgb) -> Option<Matrix3> {
    let src_xyz = color::rgb_to_xyz(source_white);
    if src_xyz.y <= 1e-6 {
        return None;
    }
    let dst_xyz = Xyz::new(D65_WHITE.x * src_xyz.y, D65_WHITE.y * src_xyz.y, D65_WHITE.z * src_xyz.y);
    let src: Lms = color::xyz_to_lms(src_xyz);
    let dst: Lms = color::xyz_to_lms(dst_xyz);
    if [src.l, src.m, src.s].iter().any(|v| v.abs() < 1e-9) {
        return None;
    }
    let scale = Matrix3::diagonal([dst.l / src.l, dst.m / src.m, dst.s / src.s]);
    let adapt = BRADFORD_INV.mul(&scale).mul(&BRADFORD);
    Some(XYZ_TO_SRGB.mul(&adapt).mul(&SRGB_TO_XYZ))
}

/// Applies a linear-RGB matrix to every pixel.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
#[must_use]
pub fn apply_linear_matrix(image: &RgbImageData, matrix: &Matrix3) -> RgbImageData {
    let decode = color::srgb_decode_table();
    let encode = |v: f64| (color::linear_to_srgb(v.clamp(0.0, 1.0)) * 255.0).round() as u8;
    image.map_pixels(|[r, g, b]| {
        let [lr, lg, lb] = matrix.mul_vec([
            decode[usize::from(r)],
            decode[usize::from(g)],
            decode[usize::from(b)],
        ]);
        [encode(lr), encode(lg), encode(lb)]
    })
}

/// Mean color of an image.
#[must_use]
pub fn image_average(image: &RgbImageData) -> Option<Rgb> {
    image.pixels().collect::<RgbAccumulator>().mean()
}
