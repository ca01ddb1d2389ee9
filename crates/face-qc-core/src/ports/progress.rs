//! Progress reporting port.

use crate::domain::AnalysisResult;

/// Events emitted while a batch of photos is checked.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Checking started for a photo.
    Started {
        /// Path to the photo.
        path: String,
        /// Index in the batch (0-based).
        index: usize,
        /// Batch size, if known.
        total: Option<usize>,
    },
    /// A photo went through the pipeline.
    Completed {
        /// The analysis result.
        result: Box<AnalysisResult>,
    },
    /// A photo could not be loaded.
    Skipped {
        /// Path to the photo.
        path: String,
        /// Why it was skipped.
        reason: String,
    },
    /// The batch is done.
    Finished {
        /// Photos that went through the pipeline.
        processed: usize,
        /// Of those, photos suitable for analysis.
        suitable: usize,
        /// Photos that could not be loaded.
        skipped: usize,
    },
}

/// Port for receiving progress events.
pub trait ProgressSink: Send + Sync {
    /// Called when a progress event occurs.
    fn on_event(&self, event: ProgressEvent);
}
