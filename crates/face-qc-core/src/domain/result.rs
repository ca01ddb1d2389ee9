//! Analysis result types.

use serde::{Deserialize, Serialize};

use crate::pipeline::PipelineResult;

/// Complete analysis result for a single image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Path to the analyzed image.
    pub path: String,
    /// Timestamp of analysis (RFC 3339).
    pub timestamp: String,
    /// Image dimensions.
    pub dimensions: ImageDimensions,
    /// Pipeline output.
    pub pipeline: PipelineResult,
}

impl AnalysisResult {
    /// Whether the photo may be passed on for analysis.
    #[must_use]
    pub const fn is_suitable(&self) -> bool {
        self.pipeline.is_suitable_for_analysis
    }
}

/// Image dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl ImageDimensions {
    /// Creates dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}
