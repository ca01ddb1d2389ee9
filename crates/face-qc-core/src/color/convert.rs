//! Conversions between color spaces and CCT estimation.

use std::sync::OnceLock;

use super::matrix::{BRADFORD, BRADFORD_INV, SRGB_TO_XYZ, XYZ_TO_SRGB};
use super::types::{Chromaticity, Lms, Rgb, RgbAccumulator, Xyz, YCbCr};
use crate::domain::RgbImageData;

/// D65 reference white in XYZ with Y = 1.
pub const D65_WHITE: Xyz = Xyz::new(0.950_47, 1.0, 1.088_83);

/// BT.601 luma of an 8-bit pixel, unrounded.
#[must_use]
pub fn luma(r: u8, g: u8, b: u8) -> f64 {
    Rgb::from_u8([r, g, b]).luma()
}

/// sRGB electro-optical transfer: encoded `[0, 1]` → linear `[0, 1]`.
#[must_use]
pub fn srgb_to_linear(v: f64) -> f64 {
    if v <= 0.040_45 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

/// Inverse of [`srgb_to_linear`].
#[must_use]
pub fn linear_to_srgb(v: f64) -> f64 {
    if v <= 0.003_130_8 {
        v * 12.92
    } else {
        1.055f64.mul_add(v.powf(1.0 / 2.4), -0.055)
    }
}

/// Linear values for every 8-bit code, computed once.
pub fn srgb_decode_table() -> &'static [f64; 256] {
    static TABLE: OnceLock<[f64; 256]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = [0.0; 256];
        for (code, slot) in (0u8..=255).zip(table.iter_mut()) {
            *slot = srgb_to_linear(f64::from(code) / 255.0);
        }
        table
    })
}

/// sRGB (0–255, gamma encoded) → XYZ (D65).
#[must_use]
pub fn rgb_to_xyz(rgb: Rgb) -> Xyz {
    let linear = rgb.to_array().map(|c| srgb_to_linear((c / 255.0).clamp(0.0, 1.0)));
    Xyz::from_array(SRGB_TO_XYZ.mul_vec(linear))
}

/// XYZ (D65) → sRGB (0–255, gamma encoded, clamped).
#[must_use]
pub fn xyz_to_rgb(xyz: Xyz) -> Rgb {
    let [r, g, b] = XYZ_TO_SRGB
        .mul_vec(xyz.to_array())
        .map(|c| linear_to_srgb(c.clamp(0.0, 1.0)) * 255.0);
    Rgb::new(r, g, b)
}

/// XYZ → LMS via the Bradford matrix.
#[must_use]
pub fn xyz_to_lms(xyz: Xyz) -> Lms {
    Lms::from_array(BRADFORD.mul_vec(xyz.to_array()))
}

/// LMS → XYZ via the inverse Bradford matrix.
#[must_use]
pub fn lms_to_xyz(lms: Lms) -> Xyz {
    Xyz::from_array(BRADFORD_INV.mul_vec(lms.to_array()))
}

/// Full-range BT.601 RGB → YCbCr.
#[must_use]
pub fn rgb_to_ycbcr(rgb: Rgb) -> YCbCr {
    let Rgb { r, g, b } = rgb;
    YCbCr {
        y: rgb.luma(),
        cb: 0.5f64.mul_add(b, (-0.168_736f64).mul_add(r, -0.331_264 * g)) + 128.0,
        cr: 0.5f64.mul_add(r, (-0.418_688f64).mul_add(g, -0.081_312 * b)) + 128.0,
    }
}

/// Full-range BT.601 YCbCr → RGB (unclamped).
#[must_use]
pub fn ycbcr_to_rgb(ycc: YCbCr) -> Rgb {
    let cb = ycc.cb - 128.0;
    let cr = ycc.cr - 128.0;
    Rgb::new(
        1.402f64.mul_add(cr, ycc.y),
        (-0.714_136f64).mul_add(cr, (-0.344_136f64).mul_add(cb, ycc.y)),
        1.772f64.mul_add(cb, ycc.y),
    )
}

/// McCamy's cubic approximation of correlated color temperature in Kelvin.
#[must_use]
pub fn mccamy_cct(c: Chromaticity) -> f64 {
    let n = (c.x - 0.3320) / (0.1858 - c.y);
    449.0f64.mul_add(n.powi(3), 3525.0f64.mul_add(n.powi(2), 6823.3f64.mul_add(n, 5520.33)))
}

/// CCT of an average sRGB sample, or `None` if its chromaticity is degenerate.
#[must_use]
pub fn estimate_cct(rgb: Rgb) -> Option<f64> {
    let cct = mccamy_cct(Chromaticity::from_xyz(rgb_to_xyz(rgb))?);
    cct.is_finite().then_some(cct)
}

/// Average RGB of the pixels accepted by `keep`, with the number of samples.
pub fn average_rgb(
    image: &RgbImageData,
    mut keep: impl FnMut([u8; 3]) -> bool,
) -> (Option<Rgb>, u64) {
    let acc: RgbAccumulator = image.pixels().filter(|px| keep(*px)).collect();
    (acc.mean(), acc.count())
}
