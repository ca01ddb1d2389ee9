//! Color-space math shared by the stages.
//!
//! Everything here is a pure function over small value types. RGB values use
//! the 0–255 gamma-encoded sRGB scale; XYZ and LMS are linear with Y = 1 for
//! reference white.

mod convert;
mod matrix;
mod types;

pub use convert::{
    average_rgb, estimate_cct, lms_to_xyz, linear_to_srgb, luma, mccamy_cct, rgb_to_xyz,
    rgb_to_ycbcr, srgb_decode_table, srgb_to_linear, xyz_to_lms, xyz_to_rgb, ycbcr_to_rgb,
    D65_WHITE,
};
pub use matrix::{Matrix3, BRADFORD, BRADFORD_INV, SRGB_TO_XYZ, XYZ_TO_SRGB};
pub use types::{Chromaticity, Lms, Rgb, RgbAccumulator, Xyz, YCbCr};
