//! Stage trait for the analysis pipeline.

/// One step of the analysis pipeline.
///
/// Stages are pure with respect to their input: they never mutate it and
/// allocate new buffers for anything they change. The pipeline runs each
/// stage on a worker thread, hence the `Send + Sync` bound.
pub trait QaStage: Send + Sync {
    /// What the stage reads.
    type Input: Send + Sync + 'static;
    /// What the stage produces.
    type Output: Send + 'static;

    /// Returns the name of this stage.
    fn name(&self) -> &'static str;

    /// Runs the stage.
    ///
    /// Functional rejections (a blurry photo, no face) are reported inside
    /// `Output`, not as errors.
    ///
    /// # Errors
    ///
    /// Returns an error if the stage cannot produce a result at all.
    fn run(&self, input: &Self::Input) -> anyhow::Result<Self::Output>;
}
