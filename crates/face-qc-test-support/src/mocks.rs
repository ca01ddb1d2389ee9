//! Mock implementations of core port traits and misbehaving stages.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use face_qc_core::domain::{AnalysisResult, ImageInfo, QaStage, RawFaceDetection, RgbImageData};
use face_qc_core::ports::{ImageSource, LandmarkProvider, ProgressEvent, ProgressSink, ResultOutput};

/// Mock implementation of `ImageSource` for testing.
///
/// Yields pre-built images and tracks iteration for assertions.
pub struct MockImageSource {
    images: Vec<ImageInfo>,
    iteration_count: Arc<Mutex<usize>>,
}

impl MockImageSource {
    /// Creates a new mock source with the given images.
    #[must_use]
    pub fn new(images: Vec<ImageInfo>) -> Self {
        Self {
            images,
            iteration_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Creates an empty mock source.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(vec![])
    }

    /// Returns the number of times the source has been iterated.
    #[must_use]
    pub fn iteration_count(&self) -> usize {
        *self
            .iteration_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl ImageSource for MockImageSource {
    fn images(&self) -> Box<dyn Iterator<Item = anyhow::Result<ImageInfo>> + Send + '_> {
        *self
            .iteration_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner) += 1;
        Box::new(self.images.iter().cloned().map(Ok))
    }

    fn count_hint(&self) -> Option<usize> {
        Some(self.images.len())
    }
}

/// Mock implementation of `ResultOutput` for testing.
///
/// Captures results for later assertions.
#[derive(Default)]
pub struct MockResultOutput {
    results: Mutex<Vec<AnalysisResult>>,
    flush_count: AtomicUsize,
}

impl MockResultOutput {
    /// Creates a new mock output.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all captured results.
    #[must_use]
    pub fn results(&self) -> Vec<AnalysisResult> {
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of times `flush()` was called.
    #[must_use]
    pub fn flush_count(&self) -> usize {
        self.flush_count.load(Ordering::SeqCst)
    }
}

impl ResultOutput for MockResultOutput {
    fn write(&self, result: &AnalysisResult) -> anyhow::Result<()> {
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(result.clone());
        Ok(())
    }

    fn flush(&self) -> anyhow::Result<()> {
        self.flush_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Mock implementation of `ProgressSink` for testing.
///
/// Captures events for later assertions.
#[derive(Default)]
pub struct MockProgressSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl MockProgressSink {
    /// Creates a new mock progress sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all captured events.
    #[must_use]
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of `Started` events.
    #[must_use]
    pub fn started_count(&self) -> usize {
        self.count(|e| matches!(e, ProgressEvent::Started { .. }))
    }

    /// Returns the number of `Completed` events.
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.count(|e| matches!(e, ProgressEvent::Completed { .. }))
    }

    /// Returns the number of `Skipped` events.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.count(|e| matches!(e, ProgressEvent::Skipped { .. }))
    }

    /// Returns the `(processed, suitable, skipped)` counts of the `Finished` event.
    #[must_use]
    pub fn finished_counts(&self) -> Option<(usize, usize, usize)> {
        self.events().iter().find_map(|e| match e {
            ProgressEvent::Finished {
                processed,
                suitable,
                skipped,
            } => Some((*processed, *suitable, *skipped)),
            _ => None,
        })
    }

    fn count(&self, pred: impl Fn(&ProgressEvent) -> bool) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| pred(e))
            .count()
    }
}

impl ProgressSink for MockProgressSink {
    fn on_event(&self, event: ProgressEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

/// Landmark provider whose detector always errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingLandmarkProvider;

impl LandmarkProvider for FailingLandmarkProvider {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn detect_faces(&self, _image: &RgbImageData) -> anyhow::Result<Vec<RawFaceDetection>> {
        anyhow::bail!("detector unavailable")
    }
}

// === Stages ===

/// Wraps a stage and sleeps before running it.
pub struct SlowStage<S> {
    inner: S,
    delay: Duration,
}

impl<S> SlowStage<S> {
    /// Delays `inner` by `delay`.
    pub const fn new(inner: S, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

impl<S: QaStage> QaStage for SlowStage<S> {
    type Input = S::Input;
    type Output = S::Output;

    fn name(&self) -> &'static str {
        "slow"
    }

    fn run(&self, input: &Self::Input) -> anyhow::Result<Self::Output> {
        thread::sleep(self.delay);
        self.inner.run(input)
    }
}

/// Wraps a stage and counts how often it runs.
pub struct CountingStage<S> {
    inner: S,
    calls: Arc<AtomicUsize>,
}

impl<S> CountingStage<S> {
    /// Counts runs of `inner`.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared call counter; stays valid after the stage moves into a pipeline.
    #[must_use]
    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl<S: QaStage> QaStage for CountingStage<S> {
    type Input = S::Input;
    type Output = S::Output;

    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn run(&self, input: &Self::Input) -> anyhow::Result<Self::Output> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.run(input)
    }
}

/// Stage that always returns an error.
pub struct FailingStage<I, O> {
    message: &'static str,
    _marker: PhantomData<fn(&I) -> O>,
}

impl<I, O> FailingStage<I, O> {
    /// Fails with `message`.
    #[must_use]
    pub const fn new(message: &'static str) -> Self {
        Self {
            message,
            _marker: PhantomData,
        }
    }
}

impl<I, O> QaStage for FailingStage<I, O>
where
    I: Send + Sync + 'static,
    O: Send + 'static,
{
    type Input = I;
    type Output = O;

    fn name(&self) -> &'static str {
        "failing"
    }

    fn run(&self, _input: &I) -> anyhow::Result<O> {
        anyhow::bail!("{}", self.message)
    }
}

/// Stage that panics.
pub struct PanickingStage<I, O> {
    _marker: PhantomData<fn(&I) -> O>,
}

impl<I, O> PanickingStage<I, O> {
    /// Creates the stage.
    #[must_use]
    pub const fn new() -> Self {
        Self { _marker: PhantomData }
    }
}

impl<I, O> Default for PanickingStage<I, O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I, O> QaStage for PanickingStage<I, O>
where
    I: Send + Sync + 'static,
    O: Send + 'static,
{
    type Input = I;
    type Output = O;

    fn name(&self) -> &'static str {
        "panicking"
    }

    fn run(&self, _input: &I) -> anyhow::Result<O> {
        panic!("stage blew up")
    }
}
