//! Result output port.

use crate::domain::AnalysisResult;

/// Port for emitting per-photo results.
pub trait ResultOutput: Send + Sync {
    /// Writes one result.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write(&self, result: &AnalysisResult) -> anyhow::Result<()>;

    /// Flushes buffered output. Array formats close their brackets here.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing fails.
    fn flush(&self) -> anyhow::Result<()>;
}
