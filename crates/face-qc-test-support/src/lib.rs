//! Test support utilities for face-qc.
//!
//! Provides mocks, synthetic image builders, and misbehaving stages for
//! testing the face-qc pipeline.
//!
//! # Example
//!
//! ```
//! use face_qc_test_support::{MockImageSource, SyntheticImageBuilder};
//!
//! let good = SyntheticImageBuilder::portrait(128);
//! let dark = SyntheticImageBuilder::underexposed(128, 128);
//!
//! let source = MockImageSource::new(vec![good, dark]);
//! ```

mod builders;
mod mocks;

pub use builders::{SyntheticImageBuilder, SKIN, WALL};
pub use mocks::{
    CountingStage, FailingLandmarkProvider, FailingStage, MockImageSource, MockProgressSink,
    MockResultOutput, PanickingStage, SlowStage,
};
