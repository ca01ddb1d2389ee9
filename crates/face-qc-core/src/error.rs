//! Typed errors raised by the core crate.
//!
//! Stage code never returns these for functional rejections (a blurry or
//! faceless photo is a normal result). They cover programming-level problems:
//! buffers that do not match their declared shape and configurations that
//! cannot produce meaningful results.

/// Errors raised when constructing or converting pixel buffers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ImageError {
    /// Width or height is zero.
    #[error("image dimensions must be non-zero, got {width}x{height}")]
    EmptyDimensions {
        /// Declared width.
        width: u32,
        /// Declared height.
        height: u32,
    },

    /// Only 3 (RGB) and 4 (RGBA) channel buffers are supported.
    #[error("unsupported channel count {0}, expected 3 or 4")]
    UnsupportedChannels(u8),

    /// The buffer length does not match `width * height * channels`.
    #[error("buffer length {actual} does not match {width}x{height}x{channels} = {expected}")]
    BufferSizeMismatch {
        /// Declared width.
        width: u32,
        /// Declared height.
        height: u32,
        /// Declared channel count.
        channels: u8,
        /// Expected length in bytes.
        expected: usize,
        /// Actual length in bytes.
        actual: usize,
    },

    /// A crop rectangle does not intersect the image.
    #[error("crop region {width}x{height} at ({x}, {y}) is empty after clipping")]
    EmptyRegion {
        /// Left edge.
        x: u32,
        /// Top edge.
        y: u32,
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },
}

/// Errors raised by configuration validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// A value lies outside its permitted range.
    #[error("{field} must be within {min}..={max}, got {value}")]
    OutOfRange {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Offending value.
        value: f64,
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },

    /// Two values that must be ordered are not.
    #[error("{lower} ({lower_value}) must not exceed {upper} ({upper_value})")]
    Misordered {
        /// Field expected to be smaller.
        lower: &'static str,
        /// Its value.
        lower_value: f64,
        /// Field expected to be larger.
        upper: &'static str,
        /// Its value.
        upper_value: f64,
    },

    /// A weight set sums to zero, so nothing can be scored.
    #[error("{0} weights must sum to a positive value")]
    ZeroWeights(&'static str),
}

impl ConfigError {
    /// Checks `value` lies within `min..=max`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] when it does not.
    pub fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), Self> {
        if (min..=max).contains(&value) {
            Ok(())
        } else {
            Err(Self::OutOfRange {
                field,
                value,
                min,
                max,
            })
        }
    }

    /// Checks `lower_value <= upper_value`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Misordered`] when it does not.
    pub fn check_order(
        lower: &'static str,
        lower_value: f64,
        upper: &'static str,
        upper_value: f64,
    ) -> Result<(), Self> {
        if lower_value <= upper_value {
            Ok(())
        } else {
            Err(Self::Misordered {
                lower,
                lower_value,
                upper,
                upper_value,
            })
        }
    }

    /// Checks a weight set sums to a positive value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroWeights`] when it does not.
    pub fn check_weights(name: &'static str, weights: &[f64]) -> Result<(), Self> {
        if weights.iter().all(|w| *w >= 0.0) && weights.iter().sum::<f64>() > 0.0 {
            Ok(())
        } else {
            Err(Self::ZeroWeights(name))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_check_range() {
        assert!(ConfigError::check_range("a", 0.5, 0.0, 1.0).is_ok());
        let err = ConfigError::check_range("quality.weight", 1.5, 0.0, 1.0).unwrap_err();
        assert!(err.to_string().contains("quality.weight"));
    }

    #[test]
    fn test_check_order() {
        assert!(ConfigError::check_order("min", 1.0, "max", 2.0).is_ok());
        assert!(ConfigError::check_order("min", 3.0, "max", 2.0).is_err());
    }

    #[test]
    fn test_check_weights() {
        assert!(ConfigError::check_weights("w", &[0.3, 0.7]).is_ok());
        assert!(ConfigError::check_weights("w", &[0.0, 0.0]).is_err());
        assert!(ConfigError::check_weights("w", &[-1.0, 2.0]).is_err());
    }

    #[test]
    fn test_image_error_display() {
        let err = ImageError::BufferSizeMismatch {
            width: 2,
            height: 2,
            channels: 3,
            expected: 12,
            actual: 10,
        };
        assert_eq!(
            err.to_string(),
            "buffer length 10 does not match 2x2x3 = 12"
        );
    }
}
