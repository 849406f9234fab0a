//! Task: one submitted payload plus its single-assignment completion slot.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use thiserror::Error;
use tokio::sync::oneshot;

use super::ids::{BatchId, TaskId};

/// Why a task did not produce a value.
///
/// Every member of a failing batch receives the same variant; `Batch` shares
/// the executor's error through an `Arc` so each caller sees the identical failure.
#[derive(Debug, Error)]
pub enum TaskError<E>
where
    E: std::error::Error + 'static,
{
    #[error("{batch_id} failed: {source}")]
    Batch {
        batch_id: BatchId,
        #[source]
        source: Arc<E>,
    },

    #[error("{batch_id} returned {actual} results for {expected} payloads")]
    ResultCountMismatch {
        batch_id: BatchId,
        expected: usize,
        actual: usize,
    },

    #[error("{batch_id} executor panicked")]
    ExecutorPanicked { batch_id: BatchId },

    /// The completion slot was dropped unfulfilled (runtime shut down mid-drain).
    #[error("task was abandoned before completion")]
    Abandoned,
}

impl<E> TaskError<E>
where
    E: std::error::Error + 'static,
{
    /// The executor error shared by the whole batch, if that is why the task failed.
    pub fn batch_error(&self) -> Option<&E> {
        match self {
            TaskError::Batch { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }

    pub fn batch_id(&self) -> Option<BatchId> {
        match self {
            TaskError::Batch { batch_id, .. }
            | TaskError::ResultCountMismatch { batch_id, .. }
            | TaskError::ExecutorPanicked { batch_id } => Some(*batch_id),
            TaskError::Abandoned => None,
        }
    }
}

pub(crate) type Completion<R, E> = oneshot::Sender<Result<R, TaskError<E>>>;

/// A queued task, owned by the queue until the drain loop settles it.
///
/// `complete` consumes the task, so a task can be settled at most once.
pub(crate) struct Task<T, R, E>
where
    E: std::error::Error + 'static,
{
    pub(crate) id: TaskId,
    pub(crate) payload: T,
    completion: Completion<R, E>,
}

impl<T, R, E> Task<T, R, E>
where
    E: std::error::Error + 'static,
{
    pub(crate) fn new(id: TaskId, payload: T) -> (Self, TaskHandle<R, E>) {
        let (tx, rx) = oneshot::channel();
        let task = Self {
            id,
            payload,
            completion: tx,
        };
        (task, TaskHandle { id, rx })
    }

    /// Split into the payload (for the executor) and the completion slot.
    pub(crate) fn into_parts(self) -> (TaskId, T, Completion<R, E>) {
        (self.id, self.payload, self.completion)
    }
}

/// Caller side of a submitted task.
///
/// Resolves once the task's batch has been executed.
#[must_use = "a TaskHandle does nothing unless awaited"]
#[derive(Debug)]
pub struct TaskHandle<R, E>
where
    E: std::error::Error + 'static,
{
    id: TaskId,
    rx: oneshot::Receiver<Result<R, TaskError<E>>>,
}

impl<R, E> TaskHandle<R, E>
where
    E: std::error::Error + 'static,
{
    pub fn id(&self) -> TaskId {
        self.id
    }
}

impl<R, E> Future for TaskHandle<R, E>
where
    E: std::error::Error + 'static,
{
    type Output = Result<R, TaskError<E>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(TaskError::Abandoned)),
            Poll::Pending => Poll::Pending,
        }
    }
}
