//! Core domain types for face photo analysis.

mod buffer;
mod face;
mod geometry;
mod qa_stage;
mod result;

pub use buffer::{GrayscaleImageData, ImageInfo, RgbImageData};
pub use face::{
    landmark_index, DetectedFace, EulerAngles, FaceLandmarks, FaceRegion, RawFaceDetection,
    LANDMARK_COUNT,
};
pub use geometry::{BoundingBox, NormalizedRect, Point3};
pub use qa_stage::QaStage;
pub use result::{AnalysisResult, ImageDimensions};
