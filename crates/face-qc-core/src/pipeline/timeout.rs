//! Time-bounded stage execution.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::domain::QaStage;

/// A stage behind a shared pointer, as the worker thread needs it.
pub type SharedStage<I, O> = Arc<dyn QaStage<Input = I, Output = O>>;

/// How a bounded stage run ended.
#[derive(Debug)]
pub enum StageOutcome<T> {
    /// The stage returned in time.
    Completed(T),
    /// The budget ran out first.
    TimedOut,
    /// The stage returned an error or panicked.
    Faulted(String),
}

/// Runs `stage` on a worker thread and waits at most `budget` for it.
///
/// The worker is never aborted: on timeout it keeps running in the
/// background and whatever it sends later is dropped with the channel.
/// Returns the outcome and the time spent waiting.
pub fn run_with_timeout<I, O>(
    stage: &SharedStage<I, O>,
    input: Arc<I>,
    budget: Duration,
) -> (StageOutcome<O>, Duration)
where
    I: Send + Sync + 'static,
    O: Send + 'static,
{
    let started = Instant::now();
    let (tx, rx) = mpsc::sync_channel(1);
    let worker = Arc::clone(stage);
    let spawned = thread::Builder::new()
        .name(format!("face-qc-{}", stage.name()))
        .spawn(move || {
            let result = worker.run(&input);
            // The receiver is gone after a timeout.
            let _ = tx.send(result);
        });
    if let Err(e) = spawned {
        return (
            StageOutcome::Faulted(format!("could not start worker: {e}")),
            started.elapsed(),
        );
    }

    let outcome = match rx.recv_timeout(budget) {
        Ok(Ok(output)) => StageOutcome::Completed(output),
        Ok(Err(e)) => StageOutcome::Faulted(format!("{e:#}")),
        Err(RecvTimeoutError::Timeout) => StageOutcome::TimedOut,
        Err(RecvTimeoutError::Disconnected) => StageOutcome::Faulted("stage panicked".to_string()),
    };
    (outcome, started.elapsed())
}
