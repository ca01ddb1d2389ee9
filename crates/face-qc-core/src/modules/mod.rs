//! Stage implementations.
//!
//! Each stage implements [`QaStage`](crate::domain::QaStage) and has a
//! `fallback` module that builds the record used when it times out or fails.

pub mod awb;
pub mod face;
pub mod lighting;
pub mod quality;

pub use awb::{AwbConfig, AwbCorrector, AwbInput, AwbMethod, AwbResult, AwbStatus};
pub use face::{FaceAnalysis, FaceConfig, FaceProcessor};
pub use lighting::{LightingAnalysis, LightingAnalyzer, LightingConfig, LightingInput};
pub use quality::{QualityConfig, QualityReport, QualityValidator};
