//! Face QC Adapters - Filesystem adapters for face-qc.
//!
//! This crate provides adapters for:
//! - Filesystem image source
//! - Landmark sidecar files written by an external face detector
//! - Exporting corrected images

pub mod export;
pub mod fs;
pub mod landmarks;

pub use export::{corrected_path, save_image};
pub use fs::{load_image, FsImageSource};
pub use landmarks::{load_detections, sidecar_path, LandmarkSidecar};
