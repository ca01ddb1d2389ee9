//! Face QC Core - Domain logic and pipeline stages
//!
//! This crate contains the image buffer and color-space types, the stage
//! trait, and the four stages of the facial photo pipeline: capture quality,
//! face geometry, skin-aware white balance and lighting. [`Pipeline`] runs
//! them in order under per-stage time budgets.

pub mod color;
pub mod domain;
pub mod error;
pub mod modules;
pub mod pipeline;
pub mod ports;

pub use domain::{AnalysisResult, BoundingBox, ImageDimensions, ImageInfo, QaStage, RgbImageData};
pub use error::{ConfigError, ImageError};
pub use pipeline::{Pipeline, PipelineConfig, PipelineResult, PipelineStage, RejectionReason};
pub use ports::{
    ImageSource, LandmarkProvider, ProgressEvent, ProgressSink, ResultOutput,
    StaticLandmarkProvider, SyntheticLandmarkProvider,
};
