//! The drain loop: turns pending tasks into executor calls.

use std::sync::Arc;

use tracing::{debug, error, instrument, trace, warn};

use super::{QueuedTask, Shared};
use crate::domain::task::Completion;
use crate::domain::TaskError;
use crate::ports::BatchExecutor;

/// Owns one Draining period of a queue.
///
/// Created by `submit` before the drain loop is spawned and moved into it. If
/// the loop is dropped before it reaches Idle (the runtime shut down, or
/// refused the spawn), the guard puts the queue back to Idle and drops every
/// pending task, so their handles resolve to `TaskError::Abandoned`.
pub(super) struct DrainGuard<T, X>
where
    T: Send + 'static,
    X: BatchExecutor<T>,
{
    shared: Arc<Shared<T, X>>,
    finished: bool,
}

impl<T, X> DrainGuard<T, X>
where
    T: Send + 'static,
    X: BatchExecutor<T>,
{
    pub(super) fn new(shared: Arc<Shared<T, X>>) -> Self {
        Self {
            shared,
            finished: false,
        }
    }
}

impl<T, X> Drop for DrainGuard<T, X>
where
    T: Send + 'static,
    X: BatchExecutor<T>,
{
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let abandoned = {
            let mut state = self.shared.state.lock();
            self.shared.go_idle(&mut state);
            std::mem::take(&mut state.pending)
        };
        if !abandoned.is_empty() {
            warn!(
                count = abandoned.len(),
                "drain loop dropped before finishing, abandoning pending tasks"
            );
            self.shared.stats.record_abandoned(abandoned.len());
        }
        // completions are dropped outside the lock
        drop(abandoned);
    }
}

/// Runs until the queue is empty, then flips the queue back to Idle and exits.
///
/// Exactly one of these is alive per queue while it is Draining.
#[instrument(skip_all, name = "drain_loop")]
pub(super) async fn drain_loop<T, X>(mut guard: DrainGuard<T, X>)
where
    T: Send + 'static,
    X: BatchExecutor<T>,
{
    let shared = Arc::clone(&guard.shared);
    loop {
        let batch: Vec<QueuedTask<T, X>> = {
            let mut state = shared.state.lock();
            let take = state.pending.len().min(shared.window.batch_size());
            if take == 0 {
                shared.go_idle(&mut state);
                guard.finished = true;
                debug!("queue empty, drain loop idle");
                return;
            }
            state.pending.drain(..take).collect()
        };

        run_batch(&shared, batch).await;

        {
            let mut state = shared.state.lock();
            if state.pending.is_empty() {
                shared.go_idle(&mut state);
                guard.finished = true;
                debug!("queue empty, drain loop idle");
                return;
            }
        }

        // backpressure between batches
        let delay = shared.window.inter_batch_delay();
        if delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Execute one batch and settle each of its tasks exactly once.
async fn run_batch<T, X>(shared: &Shared<T, X>, batch: Vec<QueuedTask<T, X>>)
where
    T: Send + 'static,
    X: BatchExecutor<T>,
{
    let batch_id = shared.ids.generate_batch_id();
    let expected = batch.len();

    let mut payloads = Vec::with_capacity(expected);
    let mut completions = Vec::with_capacity(expected);
    for task in batch {
        let (task_id, payload, completion) = task.into_parts();
        trace!(%batch_id, %task_id, "task joined batch");
        payloads.push(payload);
        completions.push(completion);
    }

    debug!(%batch_id, size = expected, "executing batch");

    // A panicking executor only takes down its own spawned task; the
    // JoinError is turned into a rejection for this batch.
    let executor = Arc::clone(&shared.executor);
    let outcome = shared
        .runtime
        .spawn(async move { executor.execute(payloads).await })
        .await;

    match outcome {
        Ok(Ok(results)) if results.len() == expected => {
            // counters first: a settled handle must see its batch in `stats()`
            shared.stats.record_batch_success(expected);
            for (completion, result) in completions.into_iter().zip(results) {
                // receiver may be gone; the caller stopped caring
                let _ = completion.send(Ok(result));
            }
        }
        Ok(Ok(results)) => {
            let actual = results.len();
            warn!(%batch_id, expected, actual, "executor returned wrong number of results");
            shared.stats.record_batch_failure(expected);
            reject_all(completions, || TaskError::ResultCountMismatch {
                batch_id,
                expected,
                actual,
            });
        }
        Ok(Err(err)) => {
            warn!(%batch_id, size = expected, error = %err, "batch failed");
            let source = Arc::new(err);
            shared.stats.record_batch_failure(expected);
            reject_all(completions, || TaskError::Batch {
                batch_id,
                source: Arc::clone(&source),
            });
        }
        Err(join_err) => {
            error!(%batch_id, error = %join_err, "batch executor did not complete");
            let panicked = join_err.is_panic();
            shared.stats.record_batch_failure(expected);
            reject_all(completions, || {
                if panicked {
                    TaskError::ExecutorPanicked { batch_id }
                } else {
                    TaskError::Abandoned
                }
            });
        }
    }
}

fn reject_all<R, E>(completions: Vec<Completion<R, E>>, mut make_error: impl FnMut() -> TaskError<E>)
where
    E: std::error::Error + 'static,
{
    for completion in completions {
        let _ = completion.send(Err(make_error()));
    }
}
